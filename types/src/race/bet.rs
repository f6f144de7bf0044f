use serde::{Deserialize, Serialize};

use super::BetError;

/// A wager on a single racer. Validated on placement, applied to the
/// bankroll only when the race settles.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bet {
    pub racer_id: String,
    pub amount: i64,
}

/// What the host shows for the active bet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BetSummary {
    pub racer_name: String,
    pub amount: i64,
}

/// Convert a host-supplied number (a JS number, a parsed form field) into a
/// wager amount. Anything that is not a positive whole number is rejected.
pub fn parse_wager(value: f64) -> Result<i64, BetError> {
    if !value.is_finite() || value.fract() != 0.0 || value < 1.0 || value >= i64::MAX as f64 {
        return Err(BetError::InvalidAmount);
    }
    Ok(value as i64)
}
