use std::fmt;
use thiserror::Error;

use super::Phase;

/// Why a bet was refused. A refused bet never touches the bankroll.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BetError {
    #[error("unknown racer: {0}")]
    InvalidRacer(String),
    #[error("bet amount must be a positive whole number")]
    InvalidAmount,
    #[error("bet of {amount} exceeds bankroll of {bankroll}")]
    InsufficientFunds { amount: i64, bankroll: i64 },
}

/// Session operations the host can request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    PlaceBet,
    StartRace,
    Tick,
    NextRace,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::PlaceBet => "place a bet",
            Action::StartRace => "start the race",
            Action::Tick => "advance the reveal",
            Action::NextRace => "move to the next race",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error(transparent)]
    Bet(#[from] BetError),
    #[error("cannot {action} while {phase}: {reason}")]
    InvalidStateTransition {
        action: Action,
        phase: Phase,
        reason: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CatalogError {
    #[error("roster must contain at least one racer")]
    Empty,
    #[error("duplicate racer id: {0}")]
    DuplicateId(String),
    #[error("racer {id} has invalid odds {odds}")]
    InvalidOdds { id: String, odds: f64 },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TimingError {
    #[error("base reveal duration must be > 0")]
    ZeroBase,
    #[error("last of {racers} racers would finish past u64::MAX ms (base {base_ms}, gap {gap_ms})")]
    Overflow {
        base_ms: u64,
        gap_ms: u64,
        racers: usize,
    },
    #[error("track range must be finite ({start}% to {end}%)")]
    NonFiniteTrack { start: f64, end: f64 },
    #[error("track range is empty ({start}% to {end}%)")]
    EmptyTrack { start: f64, end: f64 },
}
