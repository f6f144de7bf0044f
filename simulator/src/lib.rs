//! Terminal host for ghostrace.
//!
//! Owns a [RaceSession] and drives each race's reveal on a tokio interval,
//! the way the browser drives it from its frame loop.

mod config;

pub use config::{Config, ConfigError, ValidatedConfig};

use ghostrace_execution::{RaceRng, RaceSession, RevealFrame};
use ghostrace_types::{Action, RaceRecord, RacerCatalog, SessionError};
use rand::{seq::SliceRandom, SeedableRng};
use rand_chacha::ChaCha20Rng;
use std::{io::Write, time::Duration};
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Width of the drawn track in characters.
const TRACK_WIDTH: usize = 50;

/// How the simulator picks its bets.
#[derive(Clone, Debug)]
pub struct Strategy {
    /// Racer to back every race, or a random racer when `None`.
    pub racer: Option<String>,
    pub amount: i64,
}

pub struct Simulator {
    session: RaceSession,
    seed: u64,
    tick: Duration,
    time_scale: f64,
    picker: ChaCha20Rng,
}

impl Simulator {
    pub fn new(config: &ValidatedConfig, seed: u64) -> Self {
        let session = RaceSession::new(
            config.catalog.clone(),
            config.starting_bankroll,
            config.reveal,
        );
        Self {
            session,
            seed,
            tick: config.tick,
            time_scale: config.time_scale,
            picker: ChaCha20Rng::seed_from_u64(seed),
        }
    }

    pub fn session(&self) -> &RaceSession {
        &self.session
    }

    fn choose_racer(&mut self, strategy: &Strategy) -> Option<String> {
        if let Some(racer) = &strategy.racer {
            return Some(racer.clone());
        }
        self.session
            .catalog()
            .racers()
            .choose(&mut self.picker)
            .map(|racer| racer.id.clone())
    }

    /// Bet, race, settle and advance once. `on_frame` sees every reveal frame
    /// unless `instant` skips the animation.
    pub async fn run_race<F>(
        &mut self,
        strategy: &Strategy,
        instant: bool,
        mut on_frame: F,
    ) -> Result<RaceRecord, SessionError>
    where
        F: FnMut(&RacerCatalog, &RevealFrame),
    {
        let racer = self.choose_racer(strategy).unwrap_or_default();
        let amount = strategy.amount.min(self.session.bankroll());
        if amount < strategy.amount {
            warn!(
                requested = strategy.amount,
                amount, "bet capped at remaining bankroll"
            );
        }
        self.session.place_bet(&racer, amount)?;

        let mut rng = RaceRng::new(self.seed, self.session.race_number());
        self.session.start_race(&mut rng)?;

        if instant {
            let tick = self.session.finish()?;
            on_frame(self.session.catalog(), &tick.frame);
        } else {
            let mut ticker = interval(self.tick);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let start = Instant::now();
            loop {
                ticker.tick().await;
                let elapsed = start.elapsed().mul_f64(self.time_scale);
                let tick = self.session.tick(elapsed)?;
                on_frame(self.session.catalog(), &tick.frame);
                if tick.settlement.is_some() {
                    break;
                }
            }
        }

        let record = self
            .session
            .history()
            .next()
            .cloned()
            .ok_or(SessionError::InvalidStateTransition {
                action: Action::Tick,
                phase: self.session.phase(),
                reason: "race settled without a record",
            })?;
        self.session.advance_to_next_race()?;
        debug!(race = record.race_number, "race recorded");
        Ok(record)
    }

    /// Run up to `races` races, stopping early when the bankroll runs out.
    pub async fn run<F>(
        &mut self,
        races: usize,
        strategy: &Strategy,
        instant: bool,
        mut on_frame: F,
    ) -> Result<Vec<RaceRecord>, SessionError>
    where
        F: FnMut(&RacerCatalog, &RevealFrame),
    {
        let mut records = Vec::with_capacity(races);
        for _ in 0..races {
            if !self.session.can_place_bet() {
                info!(bankroll = self.session.bankroll(), "{}", self.session.status());
                break;
            }
            records.push(self.run_race(strategy, instant, &mut on_frame).await?);
        }
        Ok(records)
    }
}

/// Draw one reveal frame as text, one lane per line.
pub fn render_frame(catalog: &RacerCatalog, frame: &RevealFrame) -> String {
    let labels = catalog.lane_labels();
    let label_width = labels.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    let mut out = String::new();
    for (position, label) in frame.positions.iter().zip(labels) {
        let icon = catalog
            .get(&position.racer_id)
            .map(|racer| racer.icon.as_str())
            .unwrap_or("?");
        let column = ((position.percent / 100.0) * TRACK_WIDTH as f64).round() as usize;
        let column = column.min(TRACK_WIDTH);
        out.push_str(&format!(
            "{label:<label_width$} |{}{icon}{}|\n",
            "-".repeat(column),
            " ".repeat(TRACK_WIDTH - column),
        ));
    }
    out
}

/// Write a rendered frame over the `drawn` lines left by the previous one.
/// Returns how many lines the next frame has to overwrite.
pub fn draw_frame<W: Write>(
    out: &mut W,
    text: &str,
    drawn: usize,
    finished: bool,
) -> std::io::Result<usize> {
    if drawn > 0 {
        write!(out, "\x1b[{drawn}A")?;
    }
    out.write_all(text.as_bytes())?;
    out.flush()?;
    Ok(if finished { 0 } else { text.lines().count() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ghostrace_types::Phase;

    fn simulator(seed: u64) -> Simulator {
        let config = Config::default().validate().unwrap();
        Simulator::new(&config, seed)
    }

    #[tokio::test]
    async fn test_instant_races() {
        let mut sim = simulator(3);
        let strategy = Strategy {
            racer: Some("grim".to_string()),
            amount: 10,
        };
        let mut frames = 0;
        let records = sim
            .run(3, &strategy, true, |_, _| frames += 1)
            .await
            .unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(frames, 3);
        let net: i64 = records.iter().map(|r| r.settlement.delta).sum();
        assert_eq!(sim.session().bankroll(), 100 + net);
        assert_eq!(sim.session().race_number(), 4);
        assert_eq!(sim.session().phase(), Phase::AcceptingBet);
    }

    #[tokio::test(start_paused = true)]
    async fn test_live_reveal_ticks_until_settled() {
        let mut sim = simulator(4);
        let strategy = Strategy {
            racer: None,
            amount: 5,
        };
        let mut last = None;
        let record = sim
            .run_race(&strategy, false, |_, frame| last = Some(frame.clone()))
            .await
            .unwrap();
        let last = last.unwrap();
        assert!(last.finished);
        assert!(last.elapsed_ms >= 7_500);
        assert_eq!(last.winner_id.as_deref(), Some(record.winner_id.as_str()));
    }

    #[tokio::test]
    async fn test_same_seed_same_races() {
        let strategy = Strategy {
            racer: None,
            amount: 1,
        };
        let mut a = simulator(21);
        let mut b = simulator(21);
        let ra = a.run(4, &strategy, true, |_, _| {}).await.unwrap();
        let rb = b.run(4, &strategy, true, |_, _| {}).await.unwrap();
        assert_eq!(ra, rb);
    }

    #[tokio::test]
    async fn test_stops_when_broke() {
        // The dud wins about once in 10^15 races
        let config = Config {
            starting_bankroll: 1,
            racers: Some(vec![
                ghostrace_types::Racer::new("fav", "Sure Thing", 1.01, "👑"),
                ghostrace_types::Racer::new("dud", "Dead Weight", 1e15, "🪦"),
            ]),
            ..Config::default()
        }
        .validate()
        .unwrap();
        let mut sim = Simulator::new(&config, 8);
        let strategy = Strategy {
            racer: Some("dud".to_string()),
            amount: 50,
        };
        let records = sim.run(100, &strategy, true, |_, _| {}).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].winner_id, "fav");
        assert!(matches!(
            records[0].settlement.outcome,
            ghostrace_types::Outcome::Loss { .. }
        ));
        assert_eq!(records[0].settlement.delta, -1);
        assert_eq!(sim.session().bankroll(), 0);
        assert!(!sim.session().can_place_bet());
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
            Err(std::io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_draw_frame() {
        let mut out = Vec::new();
        let drawn = draw_frame(&mut out, "a\nb\n", 0, false).unwrap();
        assert_eq!(drawn, 2);
        let drawn = draw_frame(&mut out, "c\nd\n", drawn, true).unwrap();
        assert_eq!(drawn, 0);
        assert_eq!(out, b"a\nb\n\x1b[2Ac\nd\n");

        let err = draw_frame(&mut ClosedPipe, "a\n", 0, false).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn test_render_frame() {
        let catalog = RacerCatalog::default();
        let order = ghostrace_types::FinishOrder::from_ids(
            &catalog,
            &["grim", "shade", "bones", "wisp", "crypt", "spectre"],
        )
        .unwrap();
        let schedule = ghostrace_execution::RevealSchedule::new(
            &catalog,
            &order,
            ghostrace_types::RevealTiming::default(),
        );
        let text = render_frame(&catalog, &schedule.tick(Duration::ZERO));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 6);
        assert!(lines[0].starts_with("1. Grim Jim"));
        // 8% of a 50-wide track
        assert!(lines[0].contains("|----💀"));
    }
}
