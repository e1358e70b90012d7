//! Complete board state for storing a game and picking it up later.
//!
//! Unlike a [`Snapshot`](crate::Snapshot) a record carries the mine layout,
//! so it belongs in the calling layer's storage and not in front of a player.

use crate::{
    difficulty::Difficulty,
    error::Error,
    sweep::{Board, Settings},
};
use bit_set::BitSet;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub rows: usize,
    pub columns: usize,
    pub mine_count: usize,
    /// Mine indices, `None` until the first reveal has placed them.
    #[serde(default)]
    pub mines: Option<Vec<usize>>,
    #[serde(default)]
    pub revealed: Vec<usize>,
    #[serde(default)]
    pub flagged: Vec<usize>,
}

fn indices(board: &Board, keep: impl Fn(&crate::Tile) -> bool) -> Vec<usize> {
    board
        .tiles()
        .enumerate()
        .filter(|(_, tile)| keep(tile))
        .map(|(index, _)| index)
        .collect()
}

impl Board {
    pub fn record(&self) -> Record {
        Record {
            difficulty: self.difficulty(),
            seed: self.seed(),
            rows: self.rows(),
            columns: self.columns(),
            mine_count: self.mines(),
            mines: self.mines_placed().then(|| indices(self, |tile| tile.is_mine())),
            revealed: indices(self, |tile| tile.revealed()),
            flagged: indices(self, |tile| tile.flagged()),
        }
    }

    /// Rebuilds a board from a [`Record`], recomputing proximity values,
    /// both counters and the game status.
    pub fn restore(record: &Record) -> Result<Self, Error> {
        if let Some(difficulty) = record.difficulty {
            let preset = (difficulty.rows(), difficulty.columns(), difficulty.mines());
            if preset != (record.rows, record.columns, record.mine_count) {
                return Err(Error::InvalidLayout(format!(
                    "{}x{} with {} mines is not the {difficulty} preset",
                    record.rows, record.columns, record.mine_count
                )));
            }
        }

        let mut board = match (&record.mines, record.difficulty) {
            (Some(mines), _) => {
                let mut board =
                    Board::from_layout(record.rows, record.columns, mines.iter().copied())?;
                if board.mines() != record.mine_count {
                    return Err(Error::InvalidLayout(format!(
                        "{} mines listed but {} recorded",
                        board.mines(),
                        record.mine_count
                    )));
                }
                board.set_origin(record.difficulty, record.seed);
                board
            }
            (None, Some(difficulty)) => Board::with_settings(
                Settings::builder()
                    .difficulty(difficulty)
                    .seed(record.seed)
                    .build(),
            ),
            (None, None) => {
                return Err(Error::InvalidLayout(
                    "a custom layout must list its mines".to_owned(),
                ))
            }
        };

        let revealed = record.revealed.iter().copied().collect::<BitSet>();
        let flagged = record.flagged.iter().copied().collect::<BitSet>();
        board.restore_marks(&revealed, &flagged)?;
        Ok(board)
    }
}
