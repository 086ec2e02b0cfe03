//! The local board and every mutation allowed on it.
//!
//! [`BoardStore`] is the only owner of cell data. User edits and
//! server-origin replacements both go through its narrow API, and every
//! operation either succeeds completely or leaves the board untouched.
//!
//! # Layout
//!
//! Cells are addressed `(i, j)` with `i < columns` and `j < rows`. The
//! backing vector is laid out outer index first, so cell `(i, j)` lives at
//! `i * rows + j`. [`BoardStore::flatten`] and [`BoardStore::replace_all`]
//! use the same order, which is the order the remote server expects.

use rand::Rng;

use crate::pattern::Pattern;

/// Errors that can occur when reading or mutating the board.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    /// A coordinate lies outside the board.
    #[error("cell ({i}, {j}) is outside the {columns}x{rows} board")]
    OutOfRange {
        /// Requested outer index.
        i: usize,
        /// Requested inner index.
        j: usize,
        /// Board width.
        columns: usize,
        /// Board height.
        rows: usize,
    },

    /// An inbound flattened grid has the wrong number of cells.
    #[error("malformed snapshot: expected {expected} cells, got {actual}")]
    MalformedSnapshot {
        /// `columns * rows`.
        expected: usize,
        /// Length of the rejected sequence.
        actual: usize,
    },

    /// An inbound flattened grid contains something other than 0 or 1.
    #[error("malformed snapshot: cell {index} has value {value}, expected 0 or 1")]
    InvalidCellValue {
        /// Position in the flattened sequence.
        index: usize,
        /// The offending value.
        value: u8,
    },

    /// The requested dimensions hold no cells (or overflow).
    #[error("board dimensions {columns}x{rows} are invalid")]
    InvalidDimensions {
        /// Requested width.
        columns: usize,
        /// Requested height.
        rows: usize,
    },

    /// A preset name did not match any known pattern.
    #[error("unknown pattern: {0}")]
    UnknownPattern(String),
}

/// Fixed-size grid of binary cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardStore {
    columns: usize,
    rows: usize,
    cells: Vec<u8>,
}

impl BoardStore {
    /// Create an all-dead board.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::InvalidDimensions`] if either dimension is zero
    /// or the cell count overflows `usize`.
    pub fn new(columns: usize, rows: usize) -> Result<Self, BoardError> {
        let len = columns
            .checked_mul(rows)
            .filter(|&len| len > 0)
            .ok_or(BoardError::InvalidDimensions { columns, rows })?;
        Ok(Self {
            columns,
            rows,
            cells: vec![0; len],
        })
    }

    /// Board width (extent of `i`).
    pub const fn columns(&self) -> usize {
        self.columns
    }

    /// Board height (extent of `j`).
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Total number of cells, `columns * rows`.
    pub const fn len(&self) -> usize {
        self.cells.len()
    }

    /// Always false: a board holds at least one cell.
    pub const fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Read one cell.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::OutOfRange`] for an invalid coordinate.
    pub fn get(&self, i: usize, j: usize) -> Result<u8, BoardError> {
        let index = self.index(i, j)?;
        self.cells
            .get(index)
            .copied()
            .ok_or_else(|| self.out_of_range(i, j))
    }

    /// Write one cell. Any non-zero `bit` is stored as 1.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::OutOfRange`] for an invalid coordinate.
    pub fn set(&mut self, i: usize, j: usize, bit: u8) -> Result<(), BoardError> {
        let index = self.index(i, j)?;
        let err = self.out_of_range(i, j);
        let cell = self.cells.get_mut(index).ok_or(err)?;
        *cell = u8::from(bit != 0);
        Ok(())
    }

    /// Flip one cell and return its new value.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::OutOfRange`] for an invalid coordinate.
    pub fn toggle(&mut self, i: usize, j: usize) -> Result<u8, BoardError> {
        let next = u8::from(self.get(i, j)? == 0);
        self.set(i, j, next)?;
        Ok(next)
    }

    /// Kill every cell.
    pub fn clear(&mut self) {
        self.cells.fill(0);
    }

    /// Give every cell an independent, uniformly random value.
    pub fn randomize<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for cell in &mut self.cells {
            *cell = u8::from(rng.random_bool(0.5));
        }
    }

    /// Clear the board and write a preset pattern at its fixed offsets.
    ///
    /// Every target coordinate is checked before anything is written, so a
    /// pattern that does not fit leaves the board as it was.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::OutOfRange`] for the first coordinate that does
    /// not fit on this board.
    pub fn stamp_pattern(&mut self, pattern: Pattern) -> Result<(), BoardError> {
        let indices = pattern
            .cells()
            .into_iter()
            .map(|(i, j)| self.index(i, j))
            .collect::<Result<Vec<_>, _>>()?;

        self.clear();
        for index in indices {
            if let Some(cell) = self.cells.get_mut(index) {
                *cell = 1;
            }
        }
        Ok(())
    }

    /// Replace every cell from a flattened sequence.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::MalformedSnapshot`] if `cells.len()` differs
    /// from `columns * rows`, or [`BoardError::InvalidCellValue`] if any
    /// element is not 0 or 1. The board is unchanged on error.
    pub fn replace_all(&mut self, cells: &[u8]) -> Result<(), BoardError> {
        validate_flat(cells, self.cells.len())?;
        self.cells.copy_from_slice(cells);
        Ok(())
    }

    /// Copy of the cells in wire order.
    pub fn flatten(&self) -> Vec<u8> {
        self.cells.clone()
    }

    /// Nested view indexed `[i][j]`.
    pub fn columns_view(&self) -> Vec<Vec<u8>> {
        self.cells.chunks(self.rows).map(<[u8]>::to_vec).collect()
    }

    /// Number of live cells.
    pub fn population(&self) -> usize {
        self.cells.iter().filter(|&&cell| cell == 1).count()
    }

    fn index(&self, i: usize, j: usize) -> Result<usize, BoardError> {
        if i >= self.columns || j >= self.rows {
            return Err(self.out_of_range(i, j));
        }
        i.checked_mul(self.rows)
            .and_then(|base| base.checked_add(j))
            .ok_or_else(|| self.out_of_range(i, j))
    }

    const fn out_of_range(&self, i: usize, j: usize) -> BoardError {
        BoardError::OutOfRange {
            i,
            j,
            columns: self.columns,
            rows: self.rows,
        }
    }
}

/// Check a flattened grid against an expected cell count.
///
/// Shared by inbound snapshots and outbound pushes so both directions
/// reject the same inputs.
///
/// # Errors
///
/// Returns [`BoardError::MalformedSnapshot`] on a length mismatch or
/// [`BoardError::InvalidCellValue`] on a value other than 0 or 1.
pub fn validate_flat(cells: &[u8], expected: usize) -> Result<(), BoardError> {
    if cells.len() != expected {
        return Err(BoardError::MalformedSnapshot {
            expected,
            actual: cells.len(),
        });
    }
    if let Some((index, &value)) = cells.iter().enumerate().find(|&(_, &v)| v > 1) {
        return Err(BoardError::InvalidCellValue { index, value });
    }
    Ok(())
}
