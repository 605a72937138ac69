//! Decode a PostgreSQL `COPY ... TO STDOUT (FORMAT BINARY)` byte stream into typed, columnar
//! [`arrow`] arrays.
//!
//! This crate is the consumer half of a fast bulk-export path: given a single contiguous input
//! buffer holding the entire binary COPY payload and a list of the expected column types, it
//! produces, for each column, a value array in Arrow's native in-memory layout plus a boolean
//! mask array recording which rows are SQL NULL. It does not issue queries, does not speak the
//! Postgres wire protocol, and does not stream - obtaining the payload (typically via a database
//! client's `COPY` handler) is the caller's concern.
//!
//! ## Usage
//!
//! ```
//! use arrow_pgcopy::{decode_copy_binary, ColumnTypeId};
//!
//! // PGCOPY header, one row with a single int32 value of 42, end-of-data sentinel.
//! let mut payload = Vec::new();
//! payload.extend_from_slice(b"PGCOPY\n\xff\r\n\0");
//! payload.extend_from_slice(&0u32.to_be_bytes()); // flags
//! payload.extend_from_slice(&0u32.to_be_bytes()); // header extension length
//! payload.extend_from_slice(&1i16.to_be_bytes()); // field count
//! payload.extend_from_slice(&4i32.to_be_bytes()); // field length
//! payload.extend_from_slice(&42i32.to_be_bytes()); // field value
//! payload.extend_from_slice(&(-1i16).to_be_bytes()); // end of data
//!
//! let columns = decode_copy_binary(&payload, &[ColumnTypeId::Int32]).unwrap();
//! let (values, mask) = &columns[0];
//! assert_eq!(values.len(), 1);
//! assert!(mask.value(0));
//! ```

mod byte_reader;
mod column_buffer;
mod column_sink;
mod column_type;
mod decoder;
mod error;

// Reexport arrow to make it easier for downstream crates to depend on it without risking a
// version mismatch.
pub use arrow;

pub use self::{
    column_buffer::DecodeOptions,
    column_type::{type_id_for_name, ColumnTypeId, POSTGRES_SIGNATURE, TYPE_ID_MAP},
    error::Error,
};

use arrow::array::{ArrayRef, BooleanArray};

/// Decodes `input` into one `(value array, null mask)` pair per entry in `type_ids`, using the
/// default allocation profile (starting capacity 4096 rows, growth factor 2).
///
/// # Parameters
///
/// * `input`: the complete `COPY (FORMAT BINARY)` payload, fully materialized in memory.
/// * `type_ids`: one type-id per expected column, in column order. Must match what PostgreSQL
///   will actually emit for the queried columns - this crate does not infer types from the
///   stream.
///
/// # Errors
///
/// Returns [`Error::Framing`] if `type_ids.len()` exceeds `u16::MAX` or contains an unrecognized
/// id, before any allocation happens. See [`Error`] for the full set of ways a decode can fail.
pub fn decode_copy_binary(
    input: &[u8],
    type_ids: &[u16],
) -> Result<Vec<(ArrayRef, BooleanArray)>, Error> {
    decode_copy_binary_with_options(input, type_ids, &DecodeOptions::default())
}

/// Like [`decode_copy_binary`], but with an explicit [`DecodeOptions`] controlling the column
/// buffer manager's starting capacity and growth factor. Most callers want
/// [`decode_copy_binary`]; this is mainly useful for tests and benchmarks that want to exercise
/// the growth path without constructing multi-thousand-row fixtures.
pub fn decode_copy_binary_with_options(
    input: &[u8],
    type_ids: &[u16],
    options: &DecodeOptions,
) -> Result<Vec<(ArrayRef, BooleanArray)>, Error> {
    if type_ids.len() > u16::MAX as usize {
        return Err(Error::Framing(format!(
            "column count {} exceeds the u16 limit",
            type_ids.len()
        )));
    }

    let column_types = type_ids
        .iter()
        .map(|&id| ColumnTypeId::try_from(id))
        .collect::<Result<Vec<_>, _>>()?;

    decoder::decode_frame(input, &column_types, options)
}
