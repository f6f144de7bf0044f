use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{TimingError, REVEAL_BASE_MS, REVEAL_GAP_MS, TRACK_END_PERCENT, TRACK_START_PERCENT};

/// Fixed constants of the reveal animation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevealTiming {
    /// Completion time of the winner.
    pub base_ms: u64,
    /// Extra time per finishing rank.
    pub gap_ms: u64,
    pub start_percent: f64,
    pub end_percent: f64,
}

impl RevealTiming {
    /// Check the timing for a race of `racers` entrants.
    pub fn validate(&self, racers: usize) -> Result<(), TimingError> {
        if self.base_ms == 0 {
            return Err(TimingError::ZeroBase);
        }
        let last_rank = racers.saturating_sub(1) as u64;
        if last_rank
            .checked_mul(self.gap_ms)
            .and_then(|spread| spread.checked_add(self.base_ms))
            .is_none()
        {
            return Err(TimingError::Overflow {
                base_ms: self.base_ms,
                gap_ms: self.gap_ms,
                racers,
            });
        }
        if !self.start_percent.is_finite() || !self.end_percent.is_finite() {
            return Err(TimingError::NonFiniteTrack {
                start: self.start_percent,
                end: self.end_percent,
            });
        }
        if !(self.start_percent < self.end_percent) {
            return Err(TimingError::EmptyTrack {
                start: self.start_percent,
                end: self.end_percent,
            });
        }
        Ok(())
    }

    /// Completion time of the racer finishing at `rank` (0 = winner).
    ///
    /// Saturates for timings that did not pass [RevealTiming::validate].
    pub fn completion(&self, rank: usize) -> Duration {
        let spread = (rank as u64).saturating_mul(self.gap_ms);
        Duration::from_millis(self.base_ms.saturating_add(spread))
    }
}

impl Default for RevealTiming {
    fn default() -> Self {
        Self {
            base_ms: REVEAL_BASE_MS,
            gap_ms: REVEAL_GAP_MS,
            start_percent: TRACK_START_PERCENT,
            end_percent: TRACK_END_PERCENT,
        }
    }
}
