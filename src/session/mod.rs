pub mod round;

pub use round::{PuzzleRound, RoundError, RoundStatus};
