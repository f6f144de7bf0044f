//! Deterministic random sources for tests.

use ghostrace_types::RacerCatalog;
use rand::RngCore;
use std::collections::VecDeque;

/// Map a unit value onto the `u64` that rand's `Standard` distribution turns
/// back into that `f64` (exact for multiples of 2^-53).
fn unit_to_bits(unit: f64) -> u64 {
    assert!((0.0..1.0).contains(&unit), "scripted draw {unit} outside [0, 1)");
    ((unit * (1u64 << 53) as f64) as u64) << 11
}

/// Replays scripted unit draws, in order, through `rng.gen::<f64>()`.
pub struct ScriptedRng {
    draws: VecDeque<f64>,
}

impl ScriptedRng {
    pub fn new(draws: impl IntoIterator<Item = f64>) -> Self {
        Self {
            draws: draws.into_iter().collect(),
        }
    }

    /// Draws not yet consumed.
    pub fn remaining(&self) -> usize {
        self.draws.len()
    }
}

impl RngCore for ScriptedRng {
    fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        let unit = self.draws.pop_front().expect("scripted draws exhausted");
        unit_to_bits(unit)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(8) {
            let bytes = self.next_u64().to_be_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

/// A scripted generator whose first draw lands in the middle of `winner`'s
/// slice of the total weight. Every later place goes to the first remaining
/// racer in catalog order.
pub fn rng_for_winner(catalog: &RacerCatalog, winner: &str) -> ScriptedRng {
    let total: f64 = catalog.iter().map(|racer| racer.weight()).sum();
    let mut before = 0.0;
    for racer in catalog.iter() {
        if racer.id == winner {
            let unit = (before + racer.weight() / 2.0) / total;
            let rest = catalog.len().saturating_sub(2);
            return ScriptedRng::new(std::iter::once(unit).chain(std::iter::repeat(0.0).take(rest)));
        }
        before += racer.weight();
    }
    panic!("unknown racer {winner}");
}
