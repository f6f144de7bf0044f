pub mod race;

pub use race::*;
