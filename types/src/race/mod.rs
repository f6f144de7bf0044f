mod bet;
mod constants;
mod error;
mod outcome;
mod racer;
mod timing;

pub use bet::*;
pub use constants::*;
pub use error::*;
pub use outcome::*;
pub use racer::*;
pub use timing::*;
