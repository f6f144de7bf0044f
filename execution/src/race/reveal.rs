//! Reveal scheduling.
//!
//! The finish order is known before the animation starts. Each racer gets a
//! completion time from its rank and its position on the track is a pure
//! function of elapsed time, so any host (a browser frame loop, a tokio
//! interval, a test) can drive the reveal by calling [RevealSchedule::tick].

use ghostrace_types::{FinishOrder, RacerCatalog, RevealTiming};
use serde::Serialize;
use std::time::Duration;

/// Cubic ease-out: fast start, gentle arrival.
pub fn ease_out_cubic(raw: f64) -> f64 {
    1.0 - (1.0 - raw).powi(3)
}

/// Fraction of the track covered, clamped to 1.
fn raw_fraction(elapsed: Duration, completion: Duration) -> f64 {
    if completion.is_zero() {
        return 1.0;
    }
    (elapsed.as_secs_f64() / completion.as_secs_f64()).min(1.0)
}

#[derive(Clone, Debug, PartialEq)]
struct Lane {
    racer_id: String,
    lane: usize,
    completion: Duration,
}

/// Position of one racer at a point in the reveal.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RacerPosition {
    pub racer_id: String,
    pub raw: f64,
    /// Eased progress in `[0, 1]`.
    pub progress: f64,
    /// Display position on the track, in percent.
    pub percent: f64,
}

impl RacerPosition {
    pub fn is_finished(&self) -> bool {
        self.raw >= 1.0
    }
}

/// Every racer's position at one tick, in lane order.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RevealFrame {
    pub elapsed_ms: u64,
    pub positions: Vec<RacerPosition>,
    pub finished: bool,
    /// Set once every racer has crossed the line.
    pub winner_id: Option<String>,
}

/// Completion times for one race.
#[derive(Clone, Debug, PartialEq)]
pub struct RevealSchedule {
    lanes: Vec<Lane>,
    winner_id: String,
    timing: RevealTiming,
}

impl RevealSchedule {
    pub fn new(catalog: &RacerCatalog, order: &FinishOrder, timing: RevealTiming) -> Self {
        let mut lanes: Vec<Lane> = order
            .ranked()
            .iter()
            .enumerate()
            .map(|(rank, racer)| Lane {
                racer_id: racer.id.clone(),
                lane: catalog.lane(&racer.id).unwrap_or(rank),
                completion: timing.completion(rank),
            })
            .collect();
        lanes.sort_by_key(|lane| lane.lane);

        Self {
            lanes,
            winner_id: order.winner().id.clone(),
            timing,
        }
    }

    /// Time at which the last racer arrives.
    pub fn total_duration(&self) -> Duration {
        self.lanes
            .iter()
            .map(|lane| lane.completion)
            .max()
            .unwrap_or_default()
    }

    pub fn completion(&self, racer_id: &str) -> Option<Duration> {
        self.lanes
            .iter()
            .find(|lane| lane.racer_id == racer_id)
            .map(|lane| lane.completion)
    }

    pub fn winner_id(&self) -> &str {
        &self.winner_id
    }

    pub fn tick(&self, elapsed: Duration) -> RevealFrame {
        let span = self.timing.end_percent - self.timing.start_percent;
        let positions: Vec<RacerPosition> = self
            .lanes
            .iter()
            .map(|lane| {
                let raw = raw_fraction(elapsed, lane.completion);
                let progress = ease_out_cubic(raw);
                RacerPosition {
                    racer_id: lane.racer_id.clone(),
                    raw,
                    progress,
                    percent: self.timing.start_percent + progress * span,
                }
            })
            .collect();
        let finished = positions.iter().all(RacerPosition::is_finished);

        RevealFrame {
            elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            positions,
            finished,
            winner_id: finished.then(|| self.winner_id.clone()),
        }
    }
}
