pub mod race;

#[cfg(any(test, feature = "mocks"))]
pub mod mocks;

pub use race::ledger::{payout, BettingLedger};
pub use race::reveal::{ease_out_cubic, RacerPosition, RevealFrame, RevealSchedule};
pub use race::sampler::{sample, select, win_probabilities};
pub use race::session::{RaceSession, RaceTick, SessionSnapshot};
pub use race::RaceRng;
