//! The column buffer manager: per-column value/mask storage, sized for a starting row capacity
//! and grown geometrically on demand.
//!
//! There is no `free_all` here the way a C rendition of this decoder would need one. Both
//! [`FixedColumnBuffer`] and [`TextColumnBuffer`] own plain `Vec`s; if a decode call returns
//! `Err`, whatever buffers it had already built simply drop along with the `Vec<ColumnSink>`
//! holding them, freeing every allocation (and every owned string) without a manual sweep.

use std::collections::TryReserveError;

use crate::error::Error;

/// Tunable knobs for the column buffer manager's allocation profile. `Default` reproduces the
/// spec's allocation profile exactly (starting capacity 4096, growth factor 2); the only reason
/// to change either is to exercise the growth path cheaply in a test or benchmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Row capacity each column buffer starts out with.
    pub starting_capacity: usize,
    /// Factor a column buffer's capacity is multiplied by each time it is grown.
    pub growth_factor: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        DecodeOptions {
            starting_capacity: 4096,
            growth_factor: 2,
        }
    }
}

/// A fixed-width column's value buffer (`capacity * element_size` bytes) and null mask
/// (`capacity` bytes, one per row), grown in lock step.
pub struct FixedColumnBuffer {
    element_size: usize,
    values: Vec<u8>,
    mask: Vec<u8>,
    capacity: usize,
}

impl FixedColumnBuffer {
    /// Allocates a buffer pair sized for `options.starting_capacity` rows of `element_size`
    /// bytes each.
    pub fn allocate(element_size: usize, options: &DecodeOptions) -> Result<Self, Error> {
        let capacity = options.starting_capacity;
        let mut values = Vec::new();
        reserve_exact(&mut values, capacity * element_size)?;
        let mut mask = Vec::new();
        reserve_exact(&mut mask, capacity)?;
        Ok(FixedColumnBuffer {
            element_size,
            values,
            mask,
            capacity,
        })
    }

    /// Number of rows currently held.
    pub fn row_count(&self) -> usize {
        self.mask.len()
    }

    /// Row capacity before another growth is needed.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Multiplies capacity by `options.growth_factor` and reserves the additional bytes for
    /// both buffers. Overflow in the capacity arithmetic, or allocator failure, leaves the
    /// buffer in its previous, still valid state and returns an error - `Vec::try_reserve_exact`
    /// never partially frees an existing allocation on failure.
    pub fn grow(&mut self, options: &DecodeOptions) -> Result<(), Error> {
        let new_capacity = self
            .capacity
            .checked_mul(options.growth_factor)
            .ok_or(Error::CapacityOverflow)?;
        let additional_rows = new_capacity - self.capacity;
        let additional_value_bytes = additional_rows
            .checked_mul(self.element_size)
            .ok_or(Error::CapacityOverflow)?;
        reserve_exact(&mut self.values, additional_value_bytes)?;
        reserve_exact(&mut self.mask, additional_rows)?;
        self.capacity = new_capacity;
        Ok(())
    }

    /// Appends `element_size` value bytes and a mask entry in one step. `value` must be exactly
    /// `element_size` bytes long; callers (the per-type parsers in `column_sink`) guarantee
    /// this.
    pub fn push(&mut self, value: &[u8], is_valid: bool) {
        debug_assert_eq!(value.len(), self.element_size);
        self.values.extend_from_slice(value);
        self.mask.push(is_valid as u8);
    }

    /// The packed value bytes, `row_count() * element_size` long.
    pub fn values(&self) -> &[u8] {
        &self.values
    }

    /// One byte per row: non-zero where the row has a value, zero where it is NULL.
    pub fn mask(&self) -> &[u8] {
        &self.mask
    }

    pub fn into_values(self) -> Vec<u8> {
        self.values
    }
}

/// A text column's value storage: one `Option<Box<str>>` per row, `None` standing in for the
/// "none" singleton the spec's host runtime would otherwise refcount.
pub struct TextColumnBuffer {
    values: Vec<Option<Box<str>>>,
    capacity: usize,
}

impl TextColumnBuffer {
    pub fn allocate(options: &DecodeOptions) -> Result<Self, Error> {
        let capacity = options.starting_capacity;
        let mut values = Vec::new();
        reserve_exact(&mut values, capacity)?;
        Ok(TextColumnBuffer { values, capacity })
    }

    pub fn row_count(&self) -> usize {
        self.values.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn grow(&mut self, options: &DecodeOptions) -> Result<(), Error> {
        let new_capacity = self
            .capacity
            .checked_mul(options.growth_factor)
            .ok_or(Error::CapacityOverflow)?;
        let additional_rows = new_capacity - self.capacity;
        reserve_exact(&mut self.values, additional_rows)?;
        self.capacity = new_capacity;
        Ok(())
    }

    pub fn push(&mut self, value: Option<Box<str>>) {
        self.values.push(value);
    }

    pub fn into_values(self) -> Vec<Option<Box<str>>> {
        self.values
    }
}

/// `Vec::try_reserve_exact` surfaced as this crate's `Error`, so a failed allocation becomes a
/// `Resource` error instead of the process aborting the way unchecked `Vec` growth would.
fn reserve_exact<T>(vec: &mut Vec<T>, additional: usize) -> Result<(), TryReserveError> {
    vec.try_reserve_exact(additional)
}
