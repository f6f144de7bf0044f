/// Bankroll granted at the start of a game (and on reset)
pub const STARTING_BANKROLL: i64 = 100;

/// First race number of a game
pub const FIRST_RACE: u64 = 1;

/// Completion time of the winner during the reveal, in milliseconds
pub const REVEAL_BASE_MS: u64 = 5_500;

/// Extra reveal time per finishing rank, in milliseconds
pub const REVEAL_GAP_MS: u64 = 400;

/// Track position (percent) where every racer starts
pub const TRACK_START_PERCENT: f64 = 8.0;

/// Track position (percent) just before the finish line
pub const TRACK_END_PERCENT: f64 = 88.0;

/// Race records kept in the session history
pub const MAX_HISTORY: usize = 50;

/// Status shown while the reveal is running
pub const STATUS_RUNNING: &str = "Race in progress...";

/// Status shown when the bankroll can no longer cover a bet
pub const STATUS_GAME_OVER: &str = "Bankroll is zero. Game over!";
