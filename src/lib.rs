//! Rules engine for Minesweeper.
//!
//! A [`Board`] is built for a [`Difficulty`], lays its mines on the first
//! reveal so the opening move is always safe, and is then driven by
//! [`Board::reveal`] and [`Board::set_flag`] until it is won or lost. The
//! engine is synchronous and does no I/O; callers that share a board across
//! threads must wrap it in their own lock.
//!
//! ```
//! use minesweep_engine::{Board, Difficulty, RevealOutcome};
//!
//! let mut board = Board::new(Difficulty::Beginner);
//! let outcome = board.reveal(0).unwrap();
//! assert_ne!(outcome, RevealOutcome::MineHit);
//! assert_eq!(board.flags_remaining(), 10);
//! ```

mod difficulty;
mod error;
mod record;
mod render;
mod snapshot;
mod sweep;

pub use difficulty::Difficulty;
pub use error::Error;
pub use record::Record;
pub use render::Exposed;
pub use snapshot::{Snapshot, TileView};
pub use sweep::{Board, Coordinate, RevealOutcome, Settings, Status, Tile, Value};
