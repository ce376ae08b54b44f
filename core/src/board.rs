//! The 4×4 grid and the slide/merge rule.
//!
//! A [`Board`] is a plain `Copy` value: moving it never touches randomness.
//! Random tile insertion lives in [`crate::spawn`] and is applied by
//! [`crate::game::GameState`] only after a move that changed the board.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Width and height of the board.
pub const SIZE: usize = 4;

/// Number of cells on the board.
pub const CELLS: usize = SIZE * SIZE;

/// Largest tile that can still merge; doubling anything above it overflows
/// `u32`, so such pairs stay put.
pub const MAX_MERGEABLE: u32 = u32::MAX / 2;

/// The four move directions.
///
/// The discriminants fix the enumeration order used everywhere a choice has
/// to be made between directions: strategies break ties in this order and
/// fall back to [`Direction::Up`] when nothing moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Direction {
    Up = 0,
    Right = 1,
    Down = 2,
    Left = 3,
}

impl Direction {
    /// All four directions in tie-break order.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    /// Convert a u8 to a Direction (0=Up, 1=Right, 2=Down, 3=Left).
    /// Returns None for invalid values.
    pub fn from_u8(value: u8) -> Option<Direction> {
        Self::ALL.get(value as usize).copied()
    }

    /// Position of this direction in [`Direction::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Cell indices of one row or column, ordered from the edge the tiles
    /// move toward.
    fn line(self, line: usize) -> [usize; SIZE] {
        let row = line * SIZE;
        match self {
            Direction::Left => [row, row + 1, row + 2, row + 3],
            Direction::Right => [row + 3, row + 2, row + 1, row],
            Direction::Up => [line, line + 4, line + 8, line + 12],
            Direction::Down => [line + 12, line + 8, line + 4, line],
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::Up => "up",
            Direction::Right => "right",
            Direction::Down => "down",
            Direction::Left => "left",
        };
        f.write_str(name)
    }
}

/// Outcome of sliding a board in one direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slide {
    /// The compressed and merged board, before any tile is spawned.
    pub board: Board,
    /// Sum of the values produced by merges.
    pub reward: u64,
    /// Whether any tile moved or merged.
    pub changed: bool,
}

/// A 4×4 grid of tile values, stored row-major.
///
/// Empty cells are 0, tiles hold their face value (2, 4, 8, ...).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Board {
    cells: [u32; CELLS],
}

impl Board {
    pub const EMPTY: Board = Board { cells: [0; CELLS] };

    pub fn from_cells(cells: [u32; CELLS]) -> Self {
        Board { cells }
    }

    pub fn from_rows(rows: [[u32; SIZE]; SIZE]) -> Self {
        let mut cells = [0; CELLS];
        for (r, row) in rows.iter().enumerate() {
            cells[r * SIZE..(r + 1) * SIZE].copy_from_slice(row);
        }
        Board { cells }
    }

    /// Row-major view of the cells.
    pub fn cells(&self) -> &[u32; CELLS] {
        &self.cells
    }

    pub fn rows(&self) -> [[u32; SIZE]; SIZE] {
        let mut rows = [[0; SIZE]; SIZE];
        for (r, row) in rows.iter_mut().enumerate() {
            row.copy_from_slice(&self.cells[r * SIZE..(r + 1) * SIZE]);
        }
        rows
    }

    pub fn get(&self, row: usize, col: usize) -> u32 {
        self.cells[row * SIZE + col]
    }

    /// Copy of this board with `value` written at row-major `index`.
    pub fn with_tile(mut self, index: usize, value: u32) -> Self {
        self.cells[index] = value;
        self
    }

    /// Row-major indices of the empty cells.
    pub fn empty_cells(&self) -> Vec<usize> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, &v)| v == 0)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn empty_count(&self) -> usize {
        self.cells.iter().filter(|&&v| v == 0).count()
    }

    /// Largest tile on the board, 0 when empty.
    pub fn max_tile(&self) -> u32 {
        self.cells.iter().copied().max().unwrap_or(0)
    }

    /// Smallest non-empty tile, if any.
    pub fn min_tile(&self) -> Option<u32> {
        self.cells.iter().copied().filter(|&v| v != 0).min()
    }

    /// Whether two horizontally or vertically adjacent cells hold the same
    /// non-zero value that can still merge.
    pub fn has_adjacent_pair(&self) -> bool {
        (0..SIZE).any(|r| {
            (0..SIZE).any(|c| {
                let v = self.get(r, c);
                v != 0
                    && v <= MAX_MERGEABLE
                    && ((c + 1 < SIZE && v == self.get(r, c + 1))
                        || (r + 1 < SIZE && v == self.get(r + 1, c)))
            })
        })
    }

    /// No empty cell and no adjacent equal pair: no move can change the board.
    pub fn is_terminal(&self) -> bool {
        self.empty_count() == 0 && !self.has_adjacent_pair()
    }

    /// Slide every line toward `direction`, merging equal neighbours once.
    pub fn slide(&self, direction: Direction) -> Slide {
        let mut board = *self;
        let mut reward = 0;

        for line in 0..SIZE {
            let idx = direction.line(line);
            let mut values = idx.map(|i| self.cells[i]);
            reward += compress_and_merge(&mut values);
            for (&i, &v) in idx.iter().zip(values.iter()) {
                board.cells[i] = v;
            }
        }

        Slide {
            board,
            reward,
            changed: board != *self,
        }
    }

    /// Whether sliding toward `direction` would change the board.
    pub fn can_slide(&self, direction: Direction) -> bool {
        self.slide(direction).changed
    }
}

/// Compress and merge a line of 4 tiles (moving towards index 0).
/// Returns the points earned from merges.
///
/// 1. Compress: move all non-zero values to the front
/// 2. Merge: combine adjacent equal values (only once each)
/// 3. Compress again
fn compress_and_merge(line: &mut [u32; SIZE]) -> u64 {
    compress(line);

    let mut reward = 0;
    for i in 0..SIZE - 1 {
        if line[i] != 0 && line[i] <= MAX_MERGEABLE && line[i] == line[i + 1] {
            line[i] *= 2;
            reward += u64::from(line[i]);
            line[i + 1] = 0;
        }
    }

    compress(line);
    reward
}

/// Move all non-zero values to the front, keeping their order.
fn compress(line: &mut [u32; SIZE]) {
    let mut write_idx = 0;
    for read_idx in 0..SIZE {
        if line[read_idx] != 0 {
            if write_idx != read_idx {
                line[write_idx] = line[read_idx];
                line[read_idx] = 0;
            }
            write_idx += 1;
        }
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.rows().iter()).finish()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "+------+------+------+------+")?;
        for row in self.rows() {
            write!(f, "|")?;
            for val in row {
                if val == 0 {
                    write!(f, "      |")?;
                } else {
                    write!(f, "{:^6}|", val)?;
                }
            }
            writeln!(f)?;
            writeln!(f, "+------+------+------+------+")?;
        }
        Ok(())
    }
}
