//! Weighted finish order sampling.
//!
//! Every racer is weighted by `1 / odds`. Racers are drawn one at a time
//! without replacement, each draw proportional to weight among the racers
//! still unplaced, so the bias toward short odds carries through the whole
//! ranking and not only the winner.

use ghostrace_types::{FinishOrder, Racer, RacerCatalog};
use rand::Rng;
use tracing::debug;

/// Index of the first entry whose cumulative weight reaches `draw`.
///
/// Ties at an exact boundary resolve to the earlier entry. If rounding lets
/// `draw` pass every cumulative sum, the last entry is chosen.
pub fn select(weights: &[f64], draw: f64) -> usize {
    let mut cumulative = 0.0;
    for (i, weight) in weights.iter().enumerate() {
        cumulative += weight;
        if cumulative >= draw {
            return i;
        }
    }
    weights.len().saturating_sub(1)
}

/// Draw a full finish order for the catalog.
pub fn sample<R: Rng + ?Sized>(catalog: &RacerCatalog, rng: &mut R) -> FinishOrder {
    let mut remaining: Vec<&Racer> = catalog.iter().collect();
    let mut weights: Vec<f64> = remaining.iter().map(|racer| racer.weight()).collect();
    let mut ranked = Vec::with_capacity(remaining.len());

    while !remaining.is_empty() {
        // The last racer standing takes the remaining place without a draw
        let chosen = if remaining.len() == 1 {
            0
        } else {
            let total: f64 = weights.iter().sum();
            let draw = rng.gen::<f64>() * total;
            let chosen = select(&weights, draw);
            debug!(
                rank = ranked.len() + 1,
                draw,
                total,
                racer = %remaining[chosen].id,
                "placed racer"
            );
            chosen
        };
        weights.remove(chosen);
        ranked.push(remaining.remove(chosen).clone());
    }

    FinishOrder::from_ranked(ranked)
}

/// Chance of each racer (in catalog order) finishing first.
pub fn win_probabilities(catalog: &RacerCatalog) -> Vec<f64> {
    let total: f64 = catalog.iter().map(Racer::weight).sum();
    catalog.iter().map(|racer| racer.weight() / total).collect()
}
