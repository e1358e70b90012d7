//! Read-only view of a board for callers that store or transmit game state.
//!
//! Hidden tiles never carry their value, so a snapshot can be handed to a
//! player without giving away the mine layout.

use crate::{
    difficulty::Difficulty,
    sweep::{Board, Coordinate, Status, Value},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileView {
    pub index: usize,
    pub coordinate: Coordinate,
    pub revealed: bool,
    pub flagged: bool,
    /// Present only once the tile is revealed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    pub rows: usize,
    pub columns: usize,
    pub mines: usize,
    pub flags_remaining: usize,
    pub tiles_remaining: usize,
    pub status: Status,
    pub tiles: Vec<TileView>,
}

impl Snapshot {
    pub(crate) fn of(board: &Board) -> Self {
        let columns = board.columns();
        let tiles = board
            .tiles()
            .enumerate()
            .map(|(index, tile)| TileView {
                index,
                coordinate: (index / columns, index % columns),
                revealed: tile.revealed(),
                flagged: tile.flagged(),
                value: tile.revealed().then(|| tile.value()),
            })
            .collect();

        Self {
            difficulty: board.difficulty(),
            rows: board.rows(),
            columns,
            mines: board.mines(),
            flags_remaining: board.flags_remaining(),
            tiles_remaining: board.tiles_remaining(),
            status: board.status(),
            tiles,
        }
    }

    pub fn is_over(&self) -> bool {
        self.status != Status::InProgress
    }
}
