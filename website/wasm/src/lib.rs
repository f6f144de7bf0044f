//! Browser bindings.
//!
//! The page owns the DOM and the frame loop; it forwards button presses and
//! `requestAnimationFrame` timestamps here and renders whatever comes back.

use ghostrace_execution::RaceSession;
use ghostrace_types::{parse_wager, RacerCatalog};
use rand::rngs::OsRng;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde::Serialize;
use serde_wasm_bindgen::Serializer;
use std::fmt::Display;
use std::time::Duration;
use wasm_bindgen::prelude::*;

/// Helper to convert a serializable value to a plain JavaScript object
fn to_object<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&Serializer::json_compatible())
        .map_err(|e| JsValue::from_str(&format!("Failed to serialize: {e}")))
}

fn to_error(err: impl Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Milliseconds from the page clock. Negative or NaN input counts as the
/// start of the race; anything too large to represent counts as the end.
fn elapsed_from_ms(elapsed_ms: f64) -> Duration {
    if elapsed_ms.is_nan() || elapsed_ms <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(elapsed_ms / 1_000.0).unwrap_or(Duration::MAX)
}

/// Racer as listed on the odds board and the track.
#[derive(Serialize)]
struct RacerView<'a> {
    id: &'a str,
    name: &'a str,
    icon: &'a str,
    odds: f64,
    odds_label: String,
    lane_label: String,
}

fn racer_views(catalog: &RacerCatalog) -> Vec<RacerView<'_>> {
    catalog
        .iter()
        .zip(catalog.lane_labels())
        .map(|(racer, lane_label)| RacerView {
            id: &racer.id,
            name: &racer.name,
            icon: &racer.icon,
            odds: racer.odds,
            odds_label: racer.odds_label(),
            lane_label,
        })
        .collect()
}

/// A single player's game.
#[wasm_bindgen]
pub struct Game {
    session: RaceSession,
    rng: ChaCha20Rng,
}

#[wasm_bindgen]
impl Game {
    /// Start a game with the default roster, seeded from the browser's
    /// entropy source.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<Game, JsValue> {
        let rng = ChaCha20Rng::from_rng(OsRng)
            .map_err(|e| JsValue::from_str(&format!("Failed to seed RNG: {e}")))?;
        Ok(Game {
            session: RaceSession::default(),
            rng,
        })
    }

    /// Start a reproducible game.
    #[wasm_bindgen]
    pub fn with_seed(seed: u64) -> Game {
        Game {
            session: RaceSession::default(),
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }

    /// The roster in lane order.
    #[wasm_bindgen]
    pub fn racers(&self) -> Result<JsValue, JsValue> {
        to_object(&racer_views(self.session.catalog()))
    }

    /// Place or replace the bet for the upcoming race. Returns the new
    /// snapshot.
    #[wasm_bindgen]
    pub fn place_bet(&mut self, racer_id: &str, amount: f64) -> Result<JsValue, JsValue> {
        let amount = parse_wager(amount).map_err(to_error)?;
        self.session.place_bet(racer_id, amount).map_err(to_error)?;
        self.snapshot()
    }

    /// Draw the finish order. Returns the reveal length in milliseconds.
    #[wasm_bindgen]
    pub fn start_race(&mut self) -> Result<f64, JsValue> {
        let schedule = self.session.start_race(&mut self.rng).map_err(to_error)?;
        Ok(schedule.total_duration().as_secs_f64() * 1_000.0)
    }

    /// Positions at `elapsed_ms` since the race started. The result carries a
    /// `settlement` on the frame that ends the race.
    #[wasm_bindgen]
    pub fn tick(&mut self, elapsed_ms: f64) -> Result<JsValue, JsValue> {
        let tick = self
            .session
            .tick(elapsed_from_ms(elapsed_ms))
            .map_err(to_error)?;
        to_object(&tick)
    }

    /// Clear the bet and move to the next race.
    #[wasm_bindgen]
    pub fn next_race(&mut self) -> Result<JsValue, JsValue> {
        self.session.advance_to_next_race().map_err(to_error)?;
        self.snapshot()
    }

    /// Start over from the starting bankroll.
    #[wasm_bindgen]
    pub fn reset(&mut self) -> Result<JsValue, JsValue> {
        self.session.reset();
        self.snapshot()
    }

    #[wasm_bindgen]
    pub fn snapshot(&self) -> Result<JsValue, JsValue> {
        to_object(&self.session.snapshot())
    }

    /// Settled races, newest first.
    #[wasm_bindgen]
    pub fn history(&self) -> Result<JsValue, JsValue> {
        let history: Vec<_> = self.session.history().collect();
        to_object(&history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elapsed_from_ms() {
        assert_eq!(elapsed_from_ms(1_500.0), Duration::from_millis(1_500));
        assert_eq!(elapsed_from_ms(-3.0), Duration::ZERO);
        assert_eq!(elapsed_from_ms(f64::NAN), Duration::ZERO);
        assert_eq!(elapsed_from_ms(f64::NEG_INFINITY), Duration::ZERO);
        assert_eq!(elapsed_from_ms(f64::INFINITY), Duration::MAX);
        assert_eq!(elapsed_from_ms(1e300), Duration::MAX);
    }

    #[test]
    fn test_racer_views() {
        let catalog = RacerCatalog::default();
        let views = racer_views(&catalog);
        assert_eq!(views.len(), 6);
        assert_eq!(views[0].id, "grim");
        assert_eq!(views[0].odds_label, "2.0x");
        assert_eq!(views[5].lane_label, "6. Spectre Sal");
    }
}
