//! Per-race state machine.
//!
//! `AcceptingBet -> Running -> Settled -> AcceptingBet`, with the race
//! number advancing on the way back to `AcceptingBet`. The session owns the
//! bankroll and the single active bet; settlement happens exactly once, on
//! the tick that completes the reveal, and clears the bet in the same step.

use super::ledger::BettingLedger;
use super::reveal::{RevealFrame, RevealSchedule};
use super::sampler;
use ghostrace_types::{
    Action, Bet, BetSummary, FinishOrder, Phase, RaceRecord, RacerCatalog, RevealTiming,
    SessionError, Settlement, FIRST_RACE, MAX_HISTORY, STARTING_BANKROLL, STATUS_GAME_OVER,
    STATUS_RUNNING,
};
use rand::Rng;
use serde::Serialize;
use std::collections::VecDeque;
use std::time::Duration;
use tracing::{info, warn};

/// Result of advancing the reveal.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RaceTick {
    pub frame: RevealFrame,
    /// Present only on the tick that finished the race.
    pub settlement: Option<Settlement>,
}

/// Everything a host needs to redraw its panels.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub bankroll: i64,
    pub race_number: u64,
    pub phase: Phase,
    pub bet: Option<BetSummary>,
    pub status: String,
    pub can_place_bet: bool,
    pub last_settlement: Option<Settlement>,
}

#[derive(Clone, Debug)]
struct ActiveRace {
    order: FinishOrder,
    schedule: RevealSchedule,
}

/// One player's game: bankroll, race counter, active bet and the race in
/// flight.
#[derive(Clone, Debug)]
pub struct RaceSession {
    catalog: RacerCatalog,
    timing: RevealTiming,
    starting_bankroll: i64,

    ledger: BettingLedger,
    race_number: u64,
    phase: Phase,
    bet: Option<Bet>,
    race: Option<ActiveRace>,
    last_settlement: Option<Settlement>,
    history: VecDeque<RaceRecord>,
}

impl Default for RaceSession {
    fn default() -> Self {
        Self::new(
            RacerCatalog::default(),
            STARTING_BANKROLL,
            RevealTiming::default(),
        )
    }
}

impl RaceSession {
    pub fn new(catalog: RacerCatalog, starting_bankroll: i64, timing: RevealTiming) -> Self {
        Self {
            catalog,
            timing,
            starting_bankroll,
            ledger: BettingLedger::new(starting_bankroll),
            race_number: FIRST_RACE,
            phase: Phase::AcceptingBet,
            bet: None,
            race: None,
            last_settlement: None,
            history: VecDeque::new(),
        }
    }

    pub fn catalog(&self) -> &RacerCatalog {
        &self.catalog
    }

    pub fn timing(&self) -> &RevealTiming {
        &self.timing
    }

    pub fn bankroll(&self) -> i64 {
        self.ledger.bankroll()
    }

    pub fn race_number(&self) -> u64 {
        self.race_number
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn bet(&self) -> Option<&Bet> {
        self.bet.as_ref()
    }

    pub fn bet_summary(&self) -> Option<BetSummary> {
        let bet = self.bet.as_ref()?;
        let racer = self.catalog.get(&bet.racer_id)?;
        Some(BetSummary {
            racer_name: racer.name.clone(),
            amount: bet.amount,
        })
    }

    /// Finish order of the current race, once it has started.
    pub fn finish_order(&self) -> Option<&FinishOrder> {
        self.race.as_ref().map(|race| &race.order)
    }

    pub fn schedule(&self) -> Option<&RevealSchedule> {
        self.race.as_ref().map(|race| &race.schedule)
    }

    pub fn last_settlement(&self) -> Option<&Settlement> {
        self.last_settlement.as_ref()
    }

    /// Settled races, newest first.
    pub fn history(&self) -> impl Iterator<Item = &RaceRecord> {
        self.history.iter()
    }

    /// Bets are accepted between races while the bankroll is positive.
    pub fn can_place_bet(&self) -> bool {
        self.phase == Phase::AcceptingBet && self.bankroll() > 0
    }

    fn reject(&self, action: Action, reason: &'static str) -> SessionError {
        warn!(race = self.race_number, phase = ?self.phase, %action, reason, "rejected");
        SessionError::InvalidStateTransition {
            action,
            phase: self.phase,
            reason,
        }
    }

    /// Place (or replace) the bet for the upcoming race.
    pub fn place_bet(&mut self, racer_id: &str, amount: i64) -> Result<&Bet, SessionError> {
        match self.phase {
            Phase::AcceptingBet => {}
            Phase::Running => return Err(self.reject(Action::PlaceBet, "bets are closed")),
            Phase::Settled => {
                return Err(self.reject(Action::PlaceBet, "advance to the next race first"))
            }
        }
        let bet = self.ledger.place_bet(&self.catalog, racer_id, amount)?;
        info!(race = self.race_number, racer = racer_id, amount, "bet placed");
        Ok(&*self.bet.insert(bet))
    }

    /// Draw the finish order and begin the reveal.
    pub fn start_race<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
    ) -> Result<&RevealSchedule, SessionError> {
        match self.phase {
            Phase::AcceptingBet => {}
            Phase::Running => {
                return Err(self.reject(Action::StartRace, "a race is already in flight"))
            }
            Phase::Settled => {
                return Err(self.reject(Action::StartRace, "advance to the next race first"))
            }
        }
        if self.bet.is_none() {
            return Err(self.reject(Action::StartRace, "no bet placed"));
        }

        let order = sampler::sample(&self.catalog, rng);
        let schedule = RevealSchedule::new(&self.catalog, &order, self.timing);
        info!(
            race = self.race_number,
            duration_ms = schedule.total_duration().as_millis() as u64,
            "race started"
        );
        self.phase = Phase::Running;
        let race = self.race.insert(ActiveRace { order, schedule });
        Ok(&race.schedule)
    }

    /// Advance the reveal to `elapsed` since the start. The tick that
    /// completes the reveal settles the bet.
    pub fn tick(&mut self, elapsed: Duration) -> Result<RaceTick, SessionError> {
        if self.phase != Phase::Running {
            return Err(self.reject(Action::Tick, "no race is running"));
        }
        let Some(race) = self.race.as_ref() else {
            return Err(self.reject(Action::Tick, "no race is running"));
        };

        let frame = race.schedule.tick(elapsed);
        if !frame.finished {
            return Ok(RaceTick {
                frame,
                settlement: None,
            });
        }

        // Take the bet before settling so it can never be applied twice
        let bet = self.bet.take();
        let settlement = self.ledger.settle(bet.as_ref(), &race.order);
        let record = RaceRecord::new(self.race_number, &race.order, settlement.clone());
        info!(
            race = self.race_number,
            winner = %record.winner_id,
            delta = settlement.delta,
            bankroll = self.ledger.bankroll(),
            "race settled"
        );

        self.history.push_front(record);
        self.history.truncate(MAX_HISTORY);
        self.last_settlement = Some(settlement.clone());
        self.phase = Phase::Settled;

        Ok(RaceTick {
            frame,
            settlement: Some(settlement),
        })
    }

    /// Jump the reveal to its end (for hosts that skip the animation).
    pub fn finish(&mut self) -> Result<RaceTick, SessionError> {
        let total = self
            .schedule()
            .map(RevealSchedule::total_duration)
            .unwrap_or_default();
        self.tick(total)
    }

    /// Clear the bet and move to the next race. Allowed from `Settled`, or
    /// from `AcceptingBet` to skip a race.
    pub fn advance_to_next_race(&mut self) -> Result<u64, SessionError> {
        if self.phase == Phase::Running {
            return Err(self.reject(Action::NextRace, "the race has not finished"));
        }
        self.bet = None;
        self.race = None;
        self.race_number += 1;
        self.phase = Phase::AcceptingBet;
        if self.bankroll() <= 0 {
            info!(race = self.race_number, bankroll = self.bankroll(), "bankroll exhausted");
        }
        Ok(self.race_number)
    }

    /// Start over with the starting bankroll at race 1.
    pub fn reset(&mut self) {
        info!(bankroll = self.starting_bankroll, "session reset");
        self.ledger = BettingLedger::new(self.starting_bankroll);
        self.race_number = FIRST_RACE;
        self.phase = Phase::AcceptingBet;
        self.bet = None;
        self.race = None;
        self.last_settlement = None;
        self.history.clear();
    }

    /// One-line status for the race panel.
    pub fn status(&self) -> String {
        match self.phase {
            Phase::Running => STATUS_RUNNING.to_string(),
            Phase::Settled => match self.finish_order() {
                Some(order) => format!("Race finished! Winner: {}", order.winner().name),
                None => String::new(),
            },
            Phase::AcceptingBet if self.bankroll() <= 0 => STATUS_GAME_OVER.to_string(),
            Phase::AcceptingBet => String::new(),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            bankroll: self.bankroll(),
            race_number: self.race_number,
            phase: self.phase,
            bet: self.bet_summary(),
            status: self.status(),
            can_place_bet: self.can_place_bet(),
            last_settlement: self.last_settlement.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::rng_for_winner;
    use ghostrace_types::BetError;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_new_session() {
        let session = RaceSession::default();
        assert_eq!(session.bankroll(), 100);
        assert_eq!(session.race_number(), 1);
        assert_eq!(session.phase(), Phase::AcceptingBet);
        assert!(session.bet().is_none());
        assert!(session.can_place_bet());
        assert_eq!(session.status(), "");
    }

    #[test]
    fn test_place_bet_replaces_previous() {
        let mut session = RaceSession::default();
        session.place_bet("grim", 20).unwrap();
        session.place_bet("wisp", 35).unwrap();
        assert_eq!(
            session.bet_summary(),
            Some(BetSummary {
                racer_name: "Wisp Wanda".to_string(),
                amount: 35
            })
        );
    }

    #[test]
    fn test_rejected_bet_keeps_state() {
        let mut session = RaceSession::default();
        session.place_bet("grim", 20).unwrap();
        assert_eq!(
            session.place_bet("grim", 150),
            Err(SessionError::Bet(BetError::InsufficientFunds {
                amount: 150,
                bankroll: 100
            }))
        );
        assert_eq!(session.bankroll(), 100);
        assert_eq!(session.bet().unwrap().amount, 20);
    }

    #[test]
    fn test_start_without_bet() {
        let mut session = RaceSession::default();
        let err = session
            .start_race(&mut StdRng::seed_from_u64(0))
            .unwrap_err();
        assert!(matches!(
            err,
            SessionError::InvalidStateTransition {
                action: Action::StartRace,
                phase: Phase::AcceptingBet,
                ..
            }
        ));
        assert_eq!(session.phase(), Phase::AcceptingBet);
    }

    #[test]
    fn test_running_blocks_everything_but_tick() {
        let mut session = RaceSession::default();
        let mut rng = StdRng::seed_from_u64(1);
        session.place_bet("grim", 20).unwrap();
        session.start_race(&mut rng).unwrap();
        assert_eq!(session.phase(), Phase::Running);
        assert_eq!(session.status(), STATUS_RUNNING);
        assert!(!session.can_place_bet());

        assert!(session.start_race(&mut rng).is_err());
        assert!(session.place_bet("shade", 10).is_err());
        assert!(session.advance_to_next_race().is_err());
        assert_eq!(session.race_number(), 1);
        assert_eq!(session.bet().unwrap().racer_id, "grim");
    }

    #[test]
    fn test_tick_settles_once() {
        let mut session = RaceSession::default();
        session.place_bet("grim", 20).unwrap();
        session
            .start_race(&mut rng_for_winner(session.catalog(), "grim"))
            .unwrap();

        let tick = session.tick(Duration::from_millis(1_000)).unwrap();
        assert!(!tick.frame.finished);
        assert!(tick.settlement.is_none());
        assert_eq!(session.bankroll(), 100);

        let tick = session.tick(Duration::from_secs(30)).unwrap();
        let settlement = tick.settlement.unwrap();
        assert_eq!(settlement.delta, 40);
        assert_eq!(session.bankroll(), 140);
        assert_eq!(session.phase(), Phase::Settled);
        assert!(session.bet().is_none());
        assert_eq!(session.status(), "Race finished! Winner: Grim Jim");

        // Further ticks are refused and the bankroll stays put
        assert!(session.tick(Duration::from_secs(31)).is_err());
        assert!(session.finish().is_err());
        assert_eq!(session.bankroll(), 140);
        assert_eq!(session.history().count(), 1);
    }

    #[test]
    fn test_settled_requires_advance() {
        let mut session = RaceSession::default();
        session.place_bet("grim", 20).unwrap();
        session
            .start_race(&mut rng_for_winner(session.catalog(), "shade"))
            .unwrap();
        session.finish().unwrap();
        assert_eq!(session.bankroll(), 80);

        assert!(session.place_bet("grim", 10).is_err());
        assert!(session.start_race(&mut StdRng::seed_from_u64(3)).is_err());

        assert_eq!(session.advance_to_next_race(), Ok(2));
        assert_eq!(session.phase(), Phase::AcceptingBet);
        assert!(session.finish_order().is_none());
        assert!(session.place_bet("grim", 10).is_ok());
    }

    #[test]
    fn test_skip_race() {
        let mut session = RaceSession::default();
        session.place_bet("bones", 5).unwrap();
        assert_eq!(session.advance_to_next_race(), Ok(2));
        assert!(session.bet().is_none());
        assert_eq!(session.bankroll(), 100);
    }

    #[test]
    fn test_game_over_status() {
        let mut session = RaceSession::default();
        session.place_bet("spectre", 100).unwrap();
        session
            .start_race(&mut rng_for_winner(session.catalog(), "grim"))
            .unwrap();
        session.finish().unwrap();
        session.advance_to_next_race().unwrap();

        assert_eq!(session.bankroll(), 0);
        assert!(!session.can_place_bet());
        assert_eq!(session.status(), STATUS_GAME_OVER);
        assert!(matches!(
            session.place_bet("grim", 1),
            Err(SessionError::Bet(BetError::InsufficientFunds { .. }))
        ));
    }

    #[test]
    fn test_reset() {
        let mut session = RaceSession::default();
        session.place_bet("spectre", 60).unwrap();
        session
            .start_race(&mut rng_for_winner(session.catalog(), "grim"))
            .unwrap();
        session.finish().unwrap();
        session.advance_to_next_race().unwrap();

        session.reset();
        assert_eq!(session.bankroll(), 100);
        assert_eq!(session.race_number(), 1);
        assert_eq!(session.history().count(), 0);
        assert!(session.last_settlement().is_none());
        assert!(session.can_place_bet());
    }

    #[test]
    fn test_snapshot() {
        let mut session = RaceSession::default();
        session.place_bet("crypt", 12).unwrap();
        let snapshot = session.snapshot();
        assert_eq!(snapshot.bankroll, 100);
        assert_eq!(snapshot.race_number, 1);
        assert_eq!(snapshot.phase, Phase::AcceptingBet);
        assert_eq!(snapshot.bet.unwrap().racer_name, "Crypt Chris");
        assert!(snapshot.can_place_bet);
        assert!(snapshot.last_settlement.is_none());
    }
}
