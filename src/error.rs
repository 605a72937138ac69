use std::collections::TryReserveError;

use arrow::error::ArrowError;
use thiserror::Error;

use crate::column_type::ColumnTypeId;

/// Everything that can go wrong decoding a `COPY (FORMAT BINARY)` payload.
///
/// Every variant is terminal: the core never retries, and a partially built decode is always
/// dropped rather than surfaced (see the crate's top level documentation).
#[derive(Error, Debug)]
pub enum Error {
    /// The envelope itself is malformed: missing signature, bad flags, a non-zero header
    /// extension, a row whose field count does not match the caller-supplied column count, an
    /// unknown type-id, or a column count above the `u16` limit.
    #[error("malformed COPY binary envelope: {0}")]
    Framing(String),

    /// A declared field length or cursor advance would read past the input, or would overflow
    /// the cursor arithmetic.
    #[error(
        "attempted to read {needed} byte(s) at offset {cursor}, but the input is only \
         {input_len} byte(s) long"
    )]
    Bounds {
        cursor: usize,
        needed: usize,
        input_len: usize,
    },

    /// A fixed-width column's advertised field length does not match the on-wire width its type
    /// requires.
    #[error(
        "column {column} ({type_id:?}) expects a {expected_len}-byte field, found a field of \
         length {actual_len}"
    )]
    TypeMismatch {
        column: usize,
        type_id: ColumnTypeId,
        expected_len: usize,
        actual_len: i32,
    },

    /// A column buffer could not be allocated or grown.
    #[error("failed to allocate column buffer: {0}")]
    Resource(#[from] TryReserveError),

    /// Growing a column buffer would overflow its capacity arithmetic.
    #[error("column buffer capacity overflowed while growing")]
    CapacityOverflow,

    /// Finalizing a decoded column into an Arrow array failed, for example because a date value
    /// did not narrow into the 32 bits `Date32Array` requires.
    #[error("failed to build Arrow array for column {column}: {source}")]
    ArrayConstruction {
        column: usize,
        #[source]
        source: ArrowError,
    },
}
