use crate::{difficulty::Difficulty, error::Error, snapshot::Snapshot};
use bit_set::BitSet;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{debug, info, trace};
use typed_builder::TypedBuilder;

/// A `(row, column)` pair.
pub type Coordinate = (usize, usize);

/// What a tile holds underneath.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    Mine,
    /// Number of mines among the (up to 8) neighbours.
    Proximity(u8),
}

#[derive(Debug, Clone)]
pub struct Tile {
    adjacent_tiles: BitSet,
    value: Value,
    revealed: bool,
    flagged: bool,
}

impl Tile {
    pub fn value(&self) -> Value {
        self.value
    }

    pub fn is_mine(&self) -> bool {
        self.value == Value::Mine
    }

    pub fn revealed(&self) -> bool {
        self.revealed
    }

    pub fn flagged(&self) -> bool {
        self.flagged
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    InProgress,
    Won,
    Lost,
}

/// Result of a [`Board::reveal`] call that did not fail outright.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RevealOutcome {
    /// The tile was a mine, the game is lost.
    MineHit,
    /// The tile was blank; `revealed` counts every tile exposed, the start included.
    Cascade { revealed: usize },
    /// The tile borders this many mines.
    Numbered(u8),
    /// The tile was flagged, so the flag was removed instead.
    Unflagged,
    AlreadyRevealed,
    AlreadyOver,
}

/// Mines are laid lazily so that the first reveal is always safe.
#[derive(Debug, Clone)]
enum Phase {
    NotYetPlaced { rng: ChaCha8Rng },
    Placed,
}

#[derive(Debug, Clone, TypedBuilder)]
pub struct Settings {
    difficulty: Difficulty,
    /// Fixes the mine layout for a given first reveal.
    #[builder(default, setter(into))]
    seed: Option<u64>,
}

#[derive(Debug, Copy, Clone, PartialEq)]
enum Increment {
    One,
    NegOne,
    Zero,
}

impl Increment {
    fn offset(self, value: usize) -> Option<usize> {
        match self {
            Self::One => value.checked_add(1),
            Self::NegOne => value.checked_sub(1),
            Self::Zero => Some(value),
        }
    }
}

fn adjacent((row, column): Coordinate, rows: usize, columns: usize) -> impl Iterator<Item = usize> {
    const INCREMENTS: [Increment; 3] = [Increment::NegOne, Increment::Zero, Increment::One];

    INCREMENTS
        .iter()
        .copied()
        .flat_map(|row_incr| std::iter::repeat(row_incr).zip(INCREMENTS))
        .filter(|&increments| increments != (Increment::Zero, Increment::Zero))
        .filter_map(move |(row_incr, column_incr)| {
            let row_offset = row_incr.offset(row).filter(|&r| r < rows)?;
            let column_offset = column_incr.offset(column).filter(|&c| c < columns)?;
            Some(index_from_coord((row_offset, column_offset), columns))
        })
}

fn index_from_coord((r, c): Coordinate, columns: usize) -> usize {
    r * columns + c
}

fn coord_from_index(index: usize, columns: usize) -> Coordinate {
    (index / columns, index % columns)
}

fn blank_tiles(rows: usize, columns: usize) -> Vec<Tile> {
    (0..rows)
        .flat_map(|row| std::iter::repeat(row).zip(0..columns))
        .map(|point| Tile {
            adjacent_tiles: adjacent(point, rows, columns).collect(),
            value: Value::Proximity(0),
            revealed: false,
            flagged: false,
        })
        .collect()
}

/// Takes the next tile off the cascade's work list. The revealed set does not
/// depend on which end is drained.
pub(crate) type Drain = fn(&mut VecDeque<usize>) -> Option<usize>;

#[derive(Debug, Clone)]
pub struct Board {
    tiles: Vec<Tile>,
    // number of rows on the board
    rows: usize,
    // number of columns on the board
    columns: usize,
    // the total number of mines
    mines: usize,
    // `None` for boards built from an explicit layout
    difficulty: Option<Difficulty>,
    seed: Option<u64>,
    flags_remaining: usize,
    // unrevealed non-mine tiles; reaching zero wins
    tiles_remaining: usize,
    phase: Phase,
    status: Status,
}

impl Board {
    /// An empty board for `difficulty` with a random seed.
    pub fn new(difficulty: Difficulty) -> Self {
        Self::with_settings(Settings::builder().difficulty(difficulty).build())
    }

    pub fn with_settings(settings: Settings) -> Self {
        let Settings { difficulty, seed } = settings;
        let seed = seed.unwrap_or_else(|| rand::thread_rng().gen());
        let (rows, columns, mines) = (difficulty.rows(), difficulty.columns(), difficulty.mines());
        assert!(mines < rows * columns);

        debug!(%difficulty, seed, "new board");

        Self {
            tiles: blank_tiles(rows, columns),
            rows,
            columns,
            mines,
            difficulty: Some(difficulty),
            seed: Some(seed),
            flags_remaining: mines,
            tiles_remaining: rows * columns - mines,
            phase: Phase::NotYetPlaced {
                rng: ChaCha8Rng::seed_from_u64(seed),
            },
            status: Status::InProgress,
        }
    }

    /// A board whose mines already sit at `mine_indices`, ready to play.
    pub fn from_layout(
        rows: usize,
        columns: usize,
        mine_indices: impl IntoIterator<Item = usize>,
    ) -> Result<Self, Error> {
        if rows == 0 || columns == 0 {
            return Err(Error::InvalidLayout(format!(
                "board dimensions must be positive, got {rows}x{columns}"
            )));
        }
        let ntiles = rows.checked_mul(columns).ok_or_else(|| {
            Error::InvalidLayout(format!("a {rows}x{columns} board has too many tiles"))
        })?;

        let mut mines = BitSet::new();
        for index in mine_indices {
            if index >= ntiles {
                return Err(Error::InvalidLayout(format!(
                    "mine index {index} is outside a board of {ntiles} tiles"
                )));
            }
            if !mines.insert(index) {
                return Err(Error::InvalidLayout(format!("mine index {index} is repeated")));
            }
        }
        let nmines = mines.len();
        if nmines >= ntiles {
            return Err(Error::InvalidLayout(format!(
                "{nmines} mines leave no safe tile on a board of {ntiles} tiles"
            )));
        }

        let mut board = Self {
            tiles: blank_tiles(rows, columns),
            rows,
            columns,
            mines: nmines,
            difficulty: None,
            seed: None,
            flags_remaining: nmines,
            tiles_remaining: ntiles - nmines,
            phase: Phase::Placed,
            status: Status::InProgress,
        };
        board.lay_mines(&mines);
        Ok(board)
    }

    pub(crate) fn set_origin(&mut self, difficulty: Option<Difficulty>, seed: Option<u64>) {
        self.difficulty = difficulty;
        self.seed = seed;
    }

    /// Reapplies stored revealed and flagged tiles to a fresh board and
    /// derives the counters and status from them.
    pub(crate) fn restore_marks(&mut self, revealed: &BitSet, flagged: &BitSet) -> Result<(), Error> {
        let len = self.tiles.len();
        if let Some(index) = revealed.iter().chain(flagged.iter()).find(|&i| i >= len) {
            return Err(Error::IndexOutOfRange { index, len });
        }
        if let Some(index) = revealed.intersection(flagged).next() {
            return Err(Error::InvalidLayout(format!(
                "tile {index} is both revealed and flagged"
            )));
        }
        if !self.mines_placed() && !revealed.is_empty() {
            return Err(Error::InvalidLayout(
                "tiles are revealed but no mines were placed".to_owned(),
            ));
        }
        if flagged.len() > self.mines {
            return Err(Error::InvalidLayout(format!(
                "{} flags exceed the {} mines",
                flagged.len(),
                self.mines
            )));
        }
        let mines_hit = revealed.iter().filter(|&i| self.tiles[i].is_mine()).count();
        if mines_hit > 1 {
            return Err(Error::InvalidLayout(format!("{mines_hit} mines are revealed")));
        }

        for index in revealed.iter() {
            self.tiles[index].revealed = true;
        }
        for index in flagged.iter() {
            self.tiles[index].flagged = true;
        }
        self.flags_remaining = self.mines - flagged.len();
        self.tiles_remaining = len - self.mines - (revealed.len() - mines_hit);
        self.status = if mines_hit == 1 {
            Status::Lost
        } else if self.tiles_remaining == 0 {
            Status::Won
        } else {
            Status::InProgress
        };
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn mines(&self) -> usize {
        self.mines
    }

    pub fn difficulty(&self) -> Option<Difficulty> {
        self.difficulty
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn flags_remaining(&self) -> usize {
        self.flags_remaining
    }

    pub fn tiles_remaining(&self) -> usize {
        self.tiles_remaining
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn is_over(&self) -> bool {
        self.status != Status::InProgress
    }

    pub fn won(&self) -> bool {
        self.status == Status::Won
    }

    pub fn mines_placed(&self) -> bool {
        matches!(self.phase, Phase::Placed)
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn tiles(&self) -> impl ExactSizeIterator<Item = &Tile> + '_ {
        self.tiles.iter()
    }

    pub fn index_of(&self, (r, c): Coordinate) -> Result<usize, Error> {
        if r < self.rows && c < self.columns {
            Ok(index_from_coord((r, c), self.columns))
        } else {
            Err(Error::CoordinateOutOfRange((r, c)))
        }
    }

    pub fn coordinate_of(&self, index: usize) -> Result<Coordinate, Error> {
        self.check_index(index)?;
        Ok(coord_from_index(index, self.columns))
    }

    pub fn tile(&self, index: usize) -> Result<&Tile, Error> {
        self.tiles.get(index).ok_or(Error::IndexOutOfRange {
            index,
            len: self.tiles.len(),
        })
    }

    pub fn tile_at(&self, coord: Coordinate) -> Result<&Tile, Error> {
        self.tile(self.index_of(coord)?)
    }

    pub fn neighbours(&self, index: usize) -> Result<impl Iterator<Item = usize> + '_, Error> {
        Ok(self.tile(index)?.adjacent_tiles.iter())
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::of(self)
    }

    fn check_index(&self, index: usize) -> Result<(), Error> {
        self.tile(index).map(|_| ())
    }

    /// Reveals the tile at `index`, placing the mines first if this is the
    /// opening move. Revealing a flagged tile only removes its flag.
    pub fn reveal(&mut self, index: usize) -> Result<RevealOutcome, Error> {
        self.reveal_with(index, VecDeque::pop_front)
    }

    pub(crate) fn reveal_with(
        &mut self,
        index: usize,
        drain: Drain,
    ) -> Result<RevealOutcome, Error> {
        let tile = self.tile(index)?;

        if self.is_over() {
            return Ok(RevealOutcome::AlreadyOver);
        }
        if tile.revealed {
            return Ok(RevealOutcome::AlreadyRevealed);
        }
        if tile.flagged {
            self.unflag(index);
            return Ok(RevealOutcome::Unflagged);
        }

        if let Phase::NotYetPlaced { rng } = &mut self.phase {
            let mines = sample_mines(rng, self.tiles.len(), self.mines, index);
            debug!(protected = index, mines = mines.len(), "placing mines");
            self.lay_mines(&mines);
        }

        let outcome = match self.tiles[index].value {
            Value::Mine => {
                self.tiles[index].revealed = true;
                self.finish(Status::Lost);
                return Ok(RevealOutcome::MineHit);
            }
            Value::Proximity(0) => {
                self.mark_revealed(index);
                let revealed = 1 + self.cascade(index, drain);
                trace!(start = index, revealed, "cascade");
                RevealOutcome::Cascade { revealed }
            }
            Value::Proximity(n) => {
                self.mark_revealed(index);
                RevealOutcome::Numbered(n)
            }
        };

        if self.tiles_remaining == 0 {
            self.finish(Status::Won);
        }
        Ok(outcome)
    }

    pub fn reveal_at(&mut self, coord: Coordinate) -> Result<RevealOutcome, Error> {
        let index = self.index_of(coord)?;
        self.reveal(index)
    }

    /// Flood fill out of the already revealed blank tile at `start`. Only
    /// blank tiles are expanded; flagged tiles stay hidden. Returns how many
    /// tiles were newly revealed.
    fn cascade(&mut self, start: usize, drain: Drain) -> usize {
        let mut pending = VecDeque::from([start]);
        let mut revealed = 0;

        while let Some(index) = drain(&mut pending) {
            let neighbours = self.tiles[index].adjacent_tiles.iter().collect::<Vec<_>>();
            for neighbour in neighbours {
                let tile = &self.tiles[neighbour];
                if tile.revealed || tile.flagged || tile.is_mine() {
                    continue;
                }
                let blank = tile.value == Value::Proximity(0);
                self.mark_revealed(neighbour);
                revealed += 1;
                if blank {
                    pending.push_back(neighbour);
                }
            }
        }

        revealed
    }

    fn mark_revealed(&mut self, index: usize) {
        let tile = &mut self.tiles[index];
        debug_assert!(!tile.revealed && !tile.flagged && !tile.is_mine());
        tile.revealed = true;
        assert!(self.tiles_remaining > 0);
        self.tiles_remaining -= 1;
    }

    fn lay_mines(&mut self, mines: &BitSet) {
        for (index, tile) in self.tiles.iter_mut().enumerate() {
            tile.value = if mines.contains(index) {
                Value::Mine
            } else {
                // sum the number of adjacent tiles that are in the mine set
                let adjacent_mines = tile
                    .adjacent_tiles
                    .iter()
                    .fold(0, |total, index| total + u8::from(mines.contains(index)));
                assert!(adjacent_mines <= 8);
                Value::Proximity(adjacent_mines)
            };
        }
        self.phase = Phase::Placed;
    }

    fn finish(&mut self, status: Status) {
        self.status = status;
        info!(
            ?status,
            tiles_remaining = self.tiles_remaining,
            flags_remaining = self.flags_remaining,
            "game over"
        );
    }

    /// Places (`true`) or removes (`false`) a flag on an unrevealed tile.
    pub fn set_flag(&mut self, index: usize, flagged: bool) -> Result<(), Error> {
        let tile = self.tile(index)?;

        if self.is_over() {
            return Err(Error::GameAlreadyOver);
        }
        if tile.revealed {
            return Err(Error::CannotFlagRevealedTile(index));
        }

        match (flagged, tile.flagged) {
            (true, true) | (false, false) => Ok(()),
            (true, false) if self.flags_remaining == 0 => Err(Error::NoFlagsRemaining),
            (true, false) => {
                self.tiles[index].flagged = true;
                self.flags_remaining -= 1;
                Ok(())
            }
            (false, true) => {
                self.unflag(index);
                Ok(())
            }
        }
    }

    /// Flips the flag on `index`, returning whether the tile is now flagged.
    pub fn toggle_flag(&mut self, index: usize) -> Result<bool, Error> {
        let flagged = !self.tile(index)?.flagged;
        self.set_flag(index, flagged)?;
        Ok(flagged)
    }

    fn unflag(&mut self, index: usize) {
        self.tiles[index].flagged = false;
        self.flags_remaining += 1;
        assert!(self.flags_remaining <= self.mines);
    }
}

/// Picks `count` distinct tiles out of `ntiles`, never `protected`.
fn sample_mines(rng: &mut ChaCha8Rng, ntiles: usize, count: usize, protected: usize) -> BitSet {
    rand::seq::index::sample(rng, ntiles - 1, count)
        .into_iter()
        .map(|index| if index >= protected { index + 1 } else { index })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    fn mine_count(board: &Board) -> usize {
        board.tiles().filter(|tile| tile.is_mine()).count()
    }

    fn revealed_set(board: &Board) -> BTreeSet<usize> {
        board
            .tiles()
            .enumerate()
            .filter(|(_, tile)| tile.revealed())
            .map(|(i, _)| i)
            .collect()
    }

    fn seeded(difficulty: Difficulty, seed: u64) -> Board {
        Board::with_settings(Settings::builder().difficulty(difficulty).seed(seed).build())
    }

    #[test]
    fn test_board_initialization() {
        for difficulty in Difficulty::ALL {
            let board = Board::new(difficulty);

            assert_eq!(board.rows(), difficulty.rows());
            assert_eq!(board.columns(), difficulty.columns());
            assert_eq!(board.len(), difficulty.rows() * difficulty.columns());
            assert_eq!(board.flags_remaining(), difficulty.mines());
            assert_eq!(board.tiles_remaining(), difficulty.tiles() - difficulty.mines());
            assert!(!board.mines_placed());
            assert!(!board.is_over());
            assert!(board
                .tiles()
                .all(|t| !t.revealed() && !t.flagged() && t.value() == Value::Proximity(0)));
        }
    }

    #[test]
    fn test_coordinate_mapping() {
        let board = Board::new(Difficulty::Expert);

        assert_eq!(board.index_of((0, 0)), Ok(0));
        assert_eq!(board.index_of((0, 30)), Ok(30));
        assert_eq!(board.index_of((1, 0)), Ok(31));
        assert_eq!(board.index_of((15, 30)), Ok(board.len() - 1));
        assert_eq!(board.coordinate_of(31), Ok((1, 0)));
        assert_eq!(
            board.index_of((16, 0)),
            Err(Error::CoordinateOutOfRange((16, 0)))
        );
        assert_eq!(board.index_of((0, 31)), Err(Error::CoordinateOutOfRange((0, 31))));

        for index in 0..board.len() {
            let coord = board.coordinate_of(index).unwrap();
            assert_eq!(board.index_of(coord), Ok(index));
        }
    }

    #[test]
    fn test_neighbours() {
        let board = Board::new(Difficulty::Beginner);

        let corner = board.neighbours(0).unwrap().collect::<BTreeSet<_>>();
        assert_eq!(corner, BTreeSet::from([1, 8, 9]));

        let edge = board.neighbours(3).unwrap().collect::<BTreeSet<_>>();
        assert_eq!(edge, BTreeSet::from([2, 4, 10, 11, 12]));

        let centre = board.neighbours(9 * 3).unwrap().count();
        assert_eq!(centre, 8);

        let far_corner = board.neighbours(63).unwrap().collect::<BTreeSet<_>>();
        assert_eq!(far_corner, BTreeSet::from([54, 55, 62]));
    }

    #[test]
    fn test_first_reveal_is_safe() {
        for difficulty in Difficulty::ALL {
            for seed in 0..20 {
                let mut board = seeded(difficulty, seed);
                let target = (seed as usize * 7) % board.len();

                let outcome = board.reveal(target).unwrap();

                assert_ne!(outcome, RevealOutcome::MineHit);
                assert!(board.mines_placed());
                assert_eq!(mine_count(&board), difficulty.mines());
                assert!(!board.tile(target).unwrap().is_mine());
                assert!(board.tile(target).unwrap().revealed());
            }
        }
    }

    #[test]
    fn test_mine_placement_happens_once() {
        let mut board = seeded(Difficulty::Intermediate, 7);
        board.reveal(0).unwrap();
        let layout = board.tiles().map(Tile::value).collect::<Vec<_>>();

        let next = (0..board.len())
            .find(|&i| !board.tile(i).unwrap().revealed() && !board.tile(i).unwrap().is_mine())
            .unwrap();
        board.reveal(next).unwrap();

        assert_eq!(board.tiles().map(Tile::value).collect::<Vec<_>>(), layout);
    }

    #[test]
    fn test_same_seed_same_layout() {
        let mut first = seeded(Difficulty::Expert, 42);
        let mut second = seeded(Difficulty::Expert, 42);
        first.reveal(100).unwrap();
        second.reveal(100).unwrap();

        assert_eq!(first.seed(), Some(42));
        assert_eq!(
            first.tiles().map(Tile::value).collect::<Vec<_>>(),
            second.tiles().map(Tile::value).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_proximity_on_hand_built_board() {
        let board = Board::from_layout(3, 3, [0]).unwrap();

        let values = board.tiles().map(Tile::value).collect::<Vec<_>>();
        assert_eq!(
            values,
            vec![
                Value::Mine,
                Value::Proximity(1),
                Value::Proximity(0),
                Value::Proximity(1),
                Value::Proximity(1),
                Value::Proximity(0),
                Value::Proximity(0),
                Value::Proximity(0),
                Value::Proximity(0),
            ]
        );
        assert_eq!(board.tile_at((1, 1)).unwrap().value(), Value::Proximity(1));
        assert_eq!(board.tiles_remaining(), 8);
        assert!(board.mines_placed());
    }

    #[test]
    fn test_adjacency() {
        let board = {
            let mut board = seeded(Difficulty::Intermediate, 3);
            board.reveal(17).unwrap();
            board
        };
        let (rows, columns) = (board.rows(), board.columns());

        for r in 0..rows {
            for c in 0..columns {
                let tile = board.tile_at((r, c)).unwrap();
                if tile.is_mine() {
                    continue;
                }
                let mut count = 0;
                for dr in -1..=1 {
                    for dc in -1..=1 {
                        if dr == 0 && dc == 0 {
                            continue;
                        }
                        let nr = r as isize + dr;
                        let nc = c as isize + dc;
                        if nr >= 0 && nr < rows as isize && nc >= 0 && nc < columns as isize {
                            if board.tile_at((nr as usize, nc as usize)).unwrap().is_mine() {
                                count += 1;
                            }
                        }
                    }
                }
                assert_eq!(tile.value(), Value::Proximity(count), "Mismatch at ({r}, {c})");
            }
        }
    }

    #[test]
    fn test_from_layout_rejects_bad_input() {
        assert!(matches!(Board::from_layout(0, 3, []), Err(Error::InvalidLayout(_))));
        assert!(matches!(Board::from_layout(2, 2, [4]), Err(Error::InvalidLayout(_))));
        assert!(matches!(Board::from_layout(2, 2, [1, 1]), Err(Error::InvalidLayout(_))));
        assert!(matches!(
            Board::from_layout(2, 2, [0, 1, 2, 3]),
            Err(Error::InvalidLayout(_))
        ));
        assert!(matches!(
            Board::from_layout(usize::MAX, 2, []),
            Err(Error::InvalidLayout(_))
        ));
        assert!(matches!(
            Board::from_layout(2, usize::MAX, [0]),
            Err(Error::InvalidLayout(_))
        ));
        assert!(Board::from_layout(2, 2, [0, 1, 2]).is_ok());
    }

    #[test]
    fn test_cascade_reveals_whole_blank_region_and_wins() {
        let mut board = Board::from_layout(3, 3, [0]).unwrap();

        let outcome = board.reveal(8).unwrap();

        assert_eq!(outcome, RevealOutcome::Cascade { revealed: 8 });
        assert_eq!(revealed_set(&board), (1..9).collect());
        assert_eq!(board.tiles_remaining(), 0);
        assert_eq!(board.status(), Status::Won);
        assert!(board.is_over());
    }

    #[test]
    fn test_cascade_stops_at_numbered_border() {
        // column 2 of a 4x5 board holds mines in rows 0 and 3
        let mut board = Board::from_layout(4, 5, [2, 17]).unwrap();

        let outcome = board.reveal(0).unwrap();

        // columns 0 and 1 open up, column 2 and beyond stay hidden
        let expected = [0, 1, 5, 6, 10, 11, 15, 16].into_iter().collect::<BTreeSet<_>>();
        assert_eq!(outcome, RevealOutcome::Cascade { revealed: 8 });
        assert_eq!(revealed_set(&board), expected);
        assert_eq!(board.tiles_remaining(), 18 - 8);
        assert_eq!(board.status(), Status::InProgress);
    }

    #[test]
    fn test_cascade_skips_flagged_tiles() {
        let mut board = Board::from_layout(3, 3, [0]).unwrap();
        board.set_flag(2, true).unwrap();

        let outcome = board.reveal(8).unwrap();

        assert_eq!(outcome, RevealOutcome::Cascade { revealed: 7 });
        assert!(!board.tile(2).unwrap().revealed());
        assert!(board.tile(2).unwrap().flagged());
        assert_eq!(board.tiles_remaining(), 1);
        assert!(!board.is_over());

        assert_eq!(board.reveal(2), Ok(RevealOutcome::Unflagged));
        assert_eq!(board.reveal(2), Ok(RevealOutcome::Cascade { revealed: 1 }));
        assert!(board.won());
    }

    #[test]
    fn test_numbered_reveal() {
        let mut board = Board::from_layout(3, 3, [0]).unwrap();

        assert_eq!(board.reveal(4), Ok(RevealOutcome::Numbered(1)));
        assert_eq!(revealed_set(&board), BTreeSet::from([4]));
        assert_eq!(board.tiles_remaining(), 7);
    }

    #[test]
    fn test_reveal_twice_is_a_no_op() {
        let mut board = Board::from_layout(3, 3, [0]).unwrap();
        board.reveal(4).unwrap();
        let before = board.snapshot();

        assert_eq!(board.reveal(4), Ok(RevealOutcome::AlreadyRevealed));
        assert_eq!(board.snapshot(), before);
    }

    #[test]
    fn test_reveal_out_of_range() {
        let mut board = Board::new(Difficulty::Beginner);

        assert_eq!(
            board.reveal(64),
            Err(Error::IndexOutOfRange { index: 64, len: 64 })
        );
        assert_eq!(
            board.set_flag(100, true),
            Err(Error::IndexOutOfRange { index: 100, len: 64 })
        );
        assert_eq!(board.reveal_at((8, 0)), Err(Error::CoordinateOutOfRange((8, 0))));
        assert!(!board.mines_placed());
    }

    #[test]
    fn test_mine_hit_ends_the_game() {
        let mut board = Board::from_layout(3, 3, [0]).unwrap();

        assert_eq!(board.reveal(0), Ok(RevealOutcome::MineHit));
        assert!(board.is_over());
        assert!(!board.won());
        assert_eq!(board.status(), Status::Lost);
        assert_eq!(board.tiles_remaining(), 8);

        let before = board.snapshot();
        assert_eq!(board.reveal(4), Ok(RevealOutcome::AlreadyOver));
        assert_eq!(board.set_flag(4, true), Err(Error::GameAlreadyOver));
        assert_eq!(board.set_flag(4, false), Err(Error::GameAlreadyOver));
        assert_eq!(board.toggle_flag(4), Err(Error::GameAlreadyOver));
        assert_eq!(board.snapshot(), before);
    }

    #[test]
    fn test_won_game_rejects_moves() {
        let mut board = Board::from_layout(3, 3, [0]).unwrap();
        board.reveal(8).unwrap();
        assert!(board.won());

        assert_eq!(board.reveal(0), Ok(RevealOutcome::AlreadyOver));
        assert_eq!(board.set_flag(0, true), Err(Error::GameAlreadyOver));
        assert!(!board.tile(0).unwrap().revealed());
    }

    #[test]
    fn test_win_regardless_of_flags() {
        let mut flagged = Board::from_layout(2, 2, [0]).unwrap();
        flagged.set_flag(0, true).unwrap();
        for index in 1..4 {
            flagged.reveal(index).unwrap();
        }
        assert!(flagged.won());
        assert_eq!(flagged.flags_remaining(), 0);

        let unflagged = {
            let mut board = Board::from_layout(2, 2, [0]).unwrap();
            for index in 1..4 {
                board.reveal(index).unwrap();
            }
            board
        };
        assert!(unflagged.won());
        assert_eq!(unflagged.flags_remaining(), 1);
    }

    #[test]
    fn test_flagging() {
        let mut board = Board::new(Difficulty::Beginner);
        let mines = board.mines();

        for index in 0..mines {
            board.set_flag(index, true).unwrap();
        }
        assert_eq!(board.flags_remaining(), 0);
        assert_eq!(board.set_flag(mines, true), Err(Error::NoFlagsRemaining));

        // already flagged is a no-op even with an empty pool
        assert_eq!(board.set_flag(0, true), Ok(()));

        board.set_flag(0, false).unwrap();
        assert_eq!(board.flags_remaining(), 1);
        assert!(!board.tile(0).unwrap().flagged());
        board.set_flag(mines, true).unwrap();
        assert!(board.tile(mines).unwrap().flagged());
        assert_eq!(board.flags_remaining(), 0);

        // unflagging an unflagged tile changes nothing
        board.set_flag(mines + 1, false).unwrap();
        assert_eq!(board.flags_remaining(), 0);
    }

    #[test]
    fn test_toggle_flag() {
        let mut board = Board::new(Difficulty::Beginner);

        assert_eq!(board.toggle_flag(5), Ok(true));
        assert_eq!(board.flags_remaining(), board.mines() - 1);
        assert_eq!(board.toggle_flag(5), Ok(false));
        assert_eq!(board.flags_remaining(), board.mines());
    }

    #[test]
    fn test_cannot_flag_revealed_tile() {
        let mut board = Board::from_layout(3, 3, [0]).unwrap();
        board.reveal(4).unwrap();

        assert_eq!(board.set_flag(4, true), Err(Error::CannotFlagRevealedTile(4)));
        assert_eq!(board.set_flag(4, false), Err(Error::CannotFlagRevealedTile(4)));
        assert_eq!(board.flags_remaining(), 1);
    }

    #[test]
    fn test_reveal_on_flagged_tile_unflags() {
        let mut board = Board::new(Difficulty::Beginner);
        board.set_flag(12, true).unwrap();

        assert_eq!(board.reveal(12), Ok(RevealOutcome::Unflagged));
        let tile = board.tile(12).unwrap();
        assert!(!tile.flagged());
        assert!(!tile.revealed());
        assert_eq!(board.flags_remaining(), board.mines());
        assert!(!board.mines_placed());
    }

    /// Straightforward recursive flood fill used as an oracle.
    fn recursive_region(board: &Board, start: usize) -> BTreeSet<usize> {
        fn visit(board: &Board, index: usize, seen: &mut BTreeSet<usize>) {
            for neighbour in board.neighbours(index).unwrap() {
                let tile = board.tile(neighbour).unwrap();
                if tile.flagged() || tile.is_mine() || !seen.insert(neighbour) {
                    continue;
                }
                if tile.value() == Value::Proximity(0) {
                    visit(board, neighbour, seen);
                }
            }
        }

        let mut seen = BTreeSet::from([start]);
        visit(board, start, &mut seen);
        seen
    }

    fn layout_strategy() -> impl Strategy<Value = (usize, usize, Vec<usize>, Vec<usize>, usize)> {
        (1usize..12, 1usize..12).prop_flat_map(|(rows, columns)| {
            let ntiles = rows * columns;
            (
                Just(rows),
                Just(columns),
                proptest::collection::vec(0..ntiles, 0..ntiles),
                proptest::collection::vec(0..ntiles, 0..4),
                0..ntiles,
            )
        })
    }

    proptest! {
        #[test]
        fn cascade_is_independent_of_traversal_order(
            (rows, columns, mines, flags, start) in layout_strategy()
        ) {
            let mines = mines.into_iter().filter(|&m| m != start).collect::<BTreeSet<_>>();
            let mut breadth = Board::from_layout(rows, columns, mines.iter().copied()).unwrap();
            for &flag in flags.iter().filter(|&&f| f != start) {
                let _ = breadth.set_flag(flag, true);
            }
            let mut depth = breadth.clone();
            let blank = breadth.tile(start).unwrap().value() == Value::Proximity(0);

            let first = breadth.reveal_with(start, VecDeque::pop_front).unwrap();
            let second = depth.reveal_with(start, VecDeque::pop_back).unwrap();

            prop_assert_eq!(first, second);
            prop_assert_eq!(revealed_set(&breadth), revealed_set(&depth));
            prop_assert_eq!(breadth.tiles_remaining(), depth.tiles_remaining());
            if blank {
                prop_assert_eq!(revealed_set(&breadth), recursive_region(&breadth, start));
            }
        }

        #[test]
        fn first_reveal_never_hits_a_mine(seed in any::<u64>(), target in 0usize..(16 * 31)) {
            let mut board = seeded(Difficulty::Expert, seed);

            let outcome = board.reveal(target).unwrap();

            prop_assert_ne!(outcome, RevealOutcome::MineHit);
            prop_assert_eq!(mine_count(&board), Difficulty::Expert.mines());
        }

        #[test]
        fn counters_track_tiles(
            seed in any::<u64>(),
            moves in proptest::collection::vec((0usize..64, 0u8..3), 1..80)
        ) {
            let mut board = seeded(Difficulty::Beginner, seed);

            for (index, action) in moves {
                let _ = match action {
                    0 => board.reveal(index).map(|_| ()),
                    1 => board.set_flag(index, true),
                    _ => board.set_flag(index, false),
                };

                let flagged = board.tiles().filter(|t| t.flagged()).count();
                prop_assert_eq!(board.flags_remaining(), board.mines() - flagged);
                prop_assert!(board.tiles().all(|t| !(t.flagged() && t.revealed())));
                if board.mines_placed() {
                    let hidden_safe = board
                        .tiles()
                        .filter(|t| !t.is_mine() && !t.revealed())
                        .count();
                    prop_assert_eq!(board.tiles_remaining(), hidden_safe);
                    prop_assert_eq!(board.won(), hidden_safe == 0);
                }
            }
        }
    }
}
