//! Scalar-field views and bit matrices.
//!
//! `FieldView` is a borrowed 2D view into a flat row-major `f32` buffer;
//! `NaN` samples mean "undefined, excluded from analysis". `BitMatrix` is
//! the one-bit-per-pixel matrix used for result and ignore bitmaps. Its
//! storage is row-aligned: every row starts on a fresh `u64` word, so
//! disjoint row ranges occupy disjoint words and can be handed to parallel
//! workers as plain `&mut` slices.

use crate::util::{PeakScanError, PeakScanResult};

/// Pixel coordinate on a field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Point {
    /// X coordinate (column).
    pub x: usize,
    /// Y coordinate (row).
    pub y: usize,
}

/// Borrowed 2D view over a flat row-major `f32` buffer.
#[derive(Copy, Clone)]
pub struct FieldView<'a> {
    data: &'a [f32],
    width: usize,
    height: usize,
}

impl<'a> FieldView<'a> {
    /// Creates a view over a contiguous `width * height` buffer.
    pub fn from_slice(data: &'a [f32], width: usize, height: usize) -> PeakScanResult<Self> {
        let expected = checked_size(width, height)?;
        if data.len() != expected {
            return Err(PeakScanError::BufferSizeMismatch {
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Returns the field width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the field height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the backing slice.
    pub fn as_slice(&self) -> &'a [f32] {
        self.data
    }

    /// Returns the sample at `(x, y)` if it is within bounds.
    pub fn get(&self, x: usize, y: usize) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(y * self.width + x).copied()
    }
}

pub(crate) fn checked_size(width: usize, height: usize) -> PeakScanResult<usize> {
    if width == 0 || height == 0 {
        return Err(PeakScanError::InvalidDimensions { width, height });
    }
    width
        .checked_mul(height)
        .ok_or(PeakScanError::InvalidDimensions { width, height })
}

const WORD_BITS: usize = 64;

/// Bit matrix with row-aligned `u64` storage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BitMatrix {
    words: Vec<u64>,
    width: usize,
    height: usize,
    words_per_row: usize,
}

impl BitMatrix {
    /// Creates an all-zero bit matrix.
    pub fn new(width: usize, height: usize) -> PeakScanResult<Self> {
        checked_size(width, height)?;
        let words_per_row = width.div_ceil(WORD_BITS);
        let total = words_per_row
            .checked_mul(height)
            .ok_or(PeakScanError::InvalidDimensions { width, height })?;
        Ok(Self {
            words: vec![0; total],
            width,
            height,
            words_per_row,
        })
    }

    /// Returns the matrix width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the matrix height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the number of `u64` words backing each row.
    pub fn words_per_row(&self) -> usize {
        self.words_per_row
    }

    /// Returns the bit at `(x, y)`.
    ///
    /// # Panics
    /// Panics if `(x, y)` is out of bounds.
    pub fn get(&self, x: usize, y: usize) -> bool {
        assert!(x < self.width && y < self.height, "bit index out of bounds");
        let word = self.words[y * self.words_per_row + x / WORD_BITS];
        word & (1u64 << (x % WORD_BITS)) != 0
    }

    /// Sets the bit at `(x, y)`.
    ///
    /// # Panics
    /// Panics if `(x, y)` is out of bounds.
    pub fn set(&mut self, x: usize, y: usize) {
        assert!(x < self.width && y < self.height, "bit index out of bounds");
        self.words[y * self.words_per_row + x / WORD_BITS] |= 1u64 << (x % WORD_BITS);
    }

    /// Returns the number of set bits.
    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Returns all set positions in row-major scan order.
    pub fn set_positions(&self) -> Vec<Point> {
        let mut points = Vec::new();
        for y in 0..self.height {
            for x in 0..self.width {
                if self.get(x, y) {
                    points.push(Point { x, y });
                }
            }
        }
        points
    }

    /// Splits the matrix into mutable views over contiguous row blocks of
    /// height `block_len` (the last block may be shorter).
    ///
    /// Because rows are word-aligned, the returned views borrow disjoint
    /// word slices; no two views can address the same storage word.
    pub fn split_rows_mut(&mut self, block_len: usize) -> Vec<BitRowsMut<'_>> {
        assert!(block_len > 0, "zero block length");
        let words_per_row = self.words_per_row;
        let width = self.width;
        let mut views = Vec::with_capacity(self.height.div_ceil(block_len));
        let mut rest: &mut [u64] = &mut self.words;
        let mut first_row = 0;
        while first_row < self.height {
            let rows = block_len.min(self.height - first_row);
            let (head, tail) = rest.split_at_mut(rows * words_per_row);
            views.push(BitRowsMut {
                words: head,
                width,
                words_per_row,
                first_row,
                rows,
            });
            rest = tail;
            first_row += rows;
        }
        views
    }

    /// Mutable view over the full row range.
    pub fn all_rows_mut(&mut self) -> BitRowsMut<'_> {
        BitRowsMut {
            width: self.width,
            words_per_row: self.words_per_row,
            first_row: 0,
            rows: self.height,
            words: &mut self.words,
        }
    }
}

/// Mutable view over a contiguous row range of a [`BitMatrix`].
///
/// Each view owns its rows exclusively; bits are addressed with absolute
/// matrix coordinates.
pub struct BitRowsMut<'a> {
    words: &'a mut [u64],
    width: usize,
    words_per_row: usize,
    first_row: usize,
    rows: usize,
}

impl BitRowsMut<'_> {
    /// First row owned by this view.
    pub fn first_row(&self) -> usize {
        self.first_row
    }

    /// Number of rows owned by this view.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Sets the bit at absolute coordinates `(x, y)`.
    ///
    /// # Panics
    /// Panics if `x` is out of bounds or `y` is not owned by this view.
    pub fn set(&mut self, x: usize, y: usize) {
        assert!(x < self.width, "bit index out of bounds");
        assert!(
            y >= self.first_row && y < self.first_row + self.rows,
            "row {y} not owned by this view"
        );
        let row = y - self.first_row;
        self.words[row * self.words_per_row + x / WORD_BITS] |= 1u64 << (x % WORD_BITS);
    }
}
