//! Plain text grids, one line per row with `|` between cells.

use crate::sweep::{Board, Tile, Value};
use std::fmt;

fn symbol(value: Value) -> char {
    match value {
        Value::Mine => '*',
        Value::Proximity(n) => char::from(b'0' + n),
    }
}

fn write_grid(
    f: &mut fmt::Formatter<'_>,
    board: &Board,
    cell: impl Fn(&Tile) -> char,
) -> fmt::Result {
    let mut tiles = board.tiles();
    for _ in 0..board.rows() {
        for tile in tiles.by_ref().take(board.columns()) {
            write!(f, "|{}", cell(tile))?;
        }
        writeln!(f, "|")?;
    }
    Ok(())
}

/// The player's view: hidden tiles are blank, flags show as `F`.
impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_grid(f, self, |tile| {
            if tile.revealed() {
                symbol(tile.value())
            } else if tile.flagged() {
                'F'
            } else {
                ' '
            }
        })
    }
}

/// Every tile's true value. Obtained through [`Board::exposed`].
#[derive(Debug, Clone, Copy)]
pub struct Exposed<'a>(&'a Board);

impl fmt::Display for Exposed<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_grid(f, self.0, |tile| symbol(tile.value()))
    }
}

impl Board {
    /// The fully uncovered board, only once the game has ended.
    pub fn exposed(&self) -> Option<Exposed<'_>> {
        self.is_over().then_some(Exposed(self))
    }
}
