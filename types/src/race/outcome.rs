use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

use super::{Racer, RacerCatalog};

/// Per-race phase of a session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum Phase {
    #[default]
    AcceptingBet,
    Running,
    Settled,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::AcceptingBet => "accepting bets",
            Phase::Running => "the race is running",
            Phase::Settled => "the race is settled",
        })
    }
}

/// Full ranking of one race. First entry is the winner.
///
/// Always a permutation of the catalog it was drawn from.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FinishOrder {
    ranked: Vec<Racer>,
}

impl FinishOrder {
    /// Wrap a ranking produced by a sampler that drew every racer once.
    pub fn from_ranked(ranked: Vec<Racer>) -> Self {
        debug_assert!(!ranked.is_empty(), "finish order needs a winner");
        Self { ranked }
    }

    /// Build a ranking from racer ids. Returns `None` unless `ids` names every
    /// racer in the catalog exactly once.
    pub fn from_ids(catalog: &RacerCatalog, ids: &[&str]) -> Option<Self> {
        let mut ranked = Vec::with_capacity(ids.len());
        for id in ids {
            ranked.push(catalog.get(id)?.clone());
        }
        let order = Self { ranked };
        order.is_permutation_of(catalog).then_some(order)
    }

    pub fn is_permutation_of(&self, catalog: &RacerCatalog) -> bool {
        if self.ranked.len() != catalog.len() {
            return false;
        }
        let mut seen = HashSet::with_capacity(self.ranked.len());
        self.ranked
            .iter()
            .all(|racer| catalog.get(&racer.id).is_some() && seen.insert(racer.id.as_str()))
    }

    pub fn winner(&self) -> &Racer {
        &self.ranked[0]
    }

    /// 1-indexed finishing position of a racer.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.ranked.iter().position(|racer| racer.id == id).map(|i| i + 1)
    }

    pub fn ranked(&self) -> &[Racer] {
        &self.ranked
    }

    pub fn len(&self) -> usize {
        self.ranked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.ranked.iter().map(|racer| racer.name.clone()).collect()
    }
}

/// How a settlement resolved.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    NoBet,
    Win {
        racer_id: String,
        amount: i64,
        odds: f64,
        payout: i64,
    },
    Loss {
        racer_id: String,
        amount: i64,
        /// 1-indexed finishing position of the backed racer.
        position: Option<usize>,
    },
}

/// Result of applying one bet to the bankroll.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Settlement {
    /// Signed change applied to the bankroll.
    pub delta: i64,
    pub outcome: Outcome,
    pub narrative: String,
}

impl Settlement {
    pub fn no_bet() -> Self {
        Self {
            delta: 0,
            outcome: Outcome::NoBet,
            narrative: "No bet placed.".to_string(),
        }
    }

    pub fn is_win(&self) -> bool {
        matches!(self.outcome, Outcome::Win { .. })
    }
}

/// Log entry for a settled race.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RaceRecord {
    pub race_number: u64,
    pub winner_id: String,
    pub winner_name: String,
    /// Racer names, winner first.
    pub finish_order: Vec<String>,
    pub settlement: Settlement,
}

impl RaceRecord {
    pub fn new(race_number: u64, order: &FinishOrder, settlement: Settlement) -> Self {
        let winner = order.winner();
        Self {
            race_number,
            winner_id: winner.id.clone(),
            winner_name: winner.name.clone(),
            finish_order: order.names(),
            settlement,
        }
    }

    pub fn header(&self) -> String {
        format!("Race {} - Winner: {}", self.race_number, self.winner_name)
    }

    /// `1. Grim Jim  ·  2. Shadow Nell  ·  ...`
    pub fn order_text(&self) -> String {
        self.finish_order
            .iter()
            .enumerate()
            .map(|(i, name)| format!("{}. {}", i + 1, name))
            .collect::<Vec<_>>()
            .join("  ·  ")
    }
}

/// English ordinal for a 1-indexed position (`1st`, `12th`, `22nd`).
pub fn ordinal(position: usize) -> String {
    let suffix = match (position % 10, position % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{position}{suffix}")
}
