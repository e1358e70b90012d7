use crate::sweep::Coordinate;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("invalid difficulty `{0}`, expected beginner, intermediate, expert or 1-3")]
    InvalidDifficulty(String),

    #[error("tile index {index} is out of range for a board of {len} tiles")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("tile coordinate {0:?} is out of range")]
    CoordinateOutOfRange(Coordinate),

    #[error("the game is already over")]
    GameAlreadyOver,

    #[error("no flags remaining")]
    NoFlagsRemaining,

    #[error("tile {0} is already revealed and cannot be flagged")]
    CannotFlagRevealedTile(usize),

    #[error("invalid board layout: {0}")]
    InvalidLayout(String),
}
