//! Race execution.
//!
//! This module contains the engine behind a race:
//! - Finish order sampling (`sampler`)
//! - Reveal scheduling for the track animation (`reveal`)
//! - Bankroll and settlement (`ledger`)
//! - The per-race state machine (`session`)

pub mod ledger;
pub mod reveal;
pub mod sampler;
pub mod session;

use commonware_cryptography::sha256::Sha256;
use commonware_cryptography::Hasher;
use rand::RngCore;

/// Deterministic random number generator for a single race.
///
/// Uses SHA256 hash chains so every race of a game can be replayed from the
/// game seed and the race number.
#[derive(Clone)]
pub struct RaceRng {
    state: [u8; 32],
    index: usize,
}

impl RaceRng {
    /// Create a new RNG from a game seed and race number.
    pub fn new(seed: u64, race_number: u64) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(&seed.to_be_bytes());
        hasher.update(&race_number.to_be_bytes());
        Self {
            state: hasher.finalize().0,
            index: 0,
        }
    }

    /// Get the next random byte.
    fn next_byte(&mut self) -> u8 {
        if self.index >= 32 {
            // Rehash to get more bytes
            let mut hasher = Sha256::new();
            hasher.update(&self.state);
            self.state = hasher.finalize().0;
            self.index = 0;
        }
        let result = self.state[self.index];
        self.index += 1;
        result
    }
}

impl RngCore for RaceRng {
    fn next_u32(&mut self) -> u32 {
        let mut bytes = [0u8; 4];
        self.fill_bytes(&mut bytes);
        u32::from_be_bytes(bytes)
    }

    fn next_u64(&mut self) -> u64 {
        let mut bytes = [0u8; 8];
        self.fill_bytes(&mut bytes);
        u64::from_be_bytes(bytes)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for byte in dest.iter_mut() {
            *byte = self.next_byte();
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}
