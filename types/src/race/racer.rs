use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::CatalogError;

/// A racer players can back.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Racer {
    pub id: String,
    pub name: String,
    /// Payout multiplier applied to a winning bet.
    pub odds: f64,
    pub icon: String,
}

impl Racer {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        odds: f64,
        icon: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            odds,
            icon: icon.into(),
        }
    }

    /// Sampling weight (lower odds place first more often).
    pub fn weight(&self) -> f64 {
        1.0 / self.odds
    }

    /// Odds as shown on the board, e.g. `2.0x`.
    pub fn odds_label(&self) -> String {
        format!("{:.1}x", self.odds)
    }
}

/// The roster every new game starts with, favourite first.
pub fn default_roster() -> Vec<Racer> {
    vec![
        Racer::new("grim", "Grim Jim", 2.0, "💀"),
        Racer::new("shade", "Shadow Nell", 3.0, "🕱"),
        Racer::new("bones", "Boney Tony", 4.0, "☠️"),
        Racer::new("wisp", "Wisp Wanda", 5.0, "💫"),
        Racer::new("crypt", "Crypt Chris", 6.0, "🪦"),
        Racer::new("spectre", "Spectre Sal", 7.0, "👻"),
    ]
}

/// Immutable, ordered set of racers for the lifetime of a game.
///
/// Catalog order is lane order on the track.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RacerCatalog {
    racers: Vec<Racer>,
}

impl RacerCatalog {
    /// Build a catalog, rejecting empty rosters, duplicate ids and odds that
    /// cannot be turned into a weight.
    pub fn new(racers: Vec<Racer>) -> Result<Self, CatalogError> {
        if racers.is_empty() {
            return Err(CatalogError::Empty);
        }
        let mut seen = HashSet::with_capacity(racers.len());
        let mut total_weight = 0.0;
        for racer in &racers {
            if !seen.insert(racer.id.as_str()) {
                return Err(CatalogError::DuplicateId(racer.id.clone()));
            }
            // Subnormal odds are positive but their weight is infinite
            total_weight += racer.weight();
            if !racer.odds.is_finite() || racer.odds <= 0.0 || !total_weight.is_finite() {
                return Err(CatalogError::InvalidOdds {
                    id: racer.id.clone(),
                    odds: racer.odds,
                });
            }
        }
        Ok(Self { racers })
    }

    pub fn get(&self, id: &str) -> Option<&Racer> {
        self.racers.iter().find(|racer| racer.id == id)
    }

    /// Lane index (0-based) of a racer.
    pub fn lane(&self, id: &str) -> Option<usize> {
        self.racers.iter().position(|racer| racer.id == id)
    }

    pub fn racers(&self) -> &[Racer] {
        &self.racers
    }

    pub fn iter(&self) -> impl Iterator<Item = &Racer> {
        self.racers.iter()
    }

    pub fn len(&self) -> usize {
        self.racers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.racers.is_empty()
    }

    /// Lane labels in track order: `1. Grim Jim`, `2. Shadow Nell`, ...
    pub fn lane_labels(&self) -> Vec<String> {
        self.racers
            .iter()
            .enumerate()
            .map(|(i, racer)| format!("{}. {}", i + 1, racer.name))
            .collect()
    }
}

impl Default for RacerCatalog {
    fn default() -> Self {
        Self {
            racers: default_roster(),
        }
    }
}
