//! The frame decoder and row/field decoder: the two halves of spec.md's §4.4, driving the outer
//! `PGCOPY` envelope and, within it, the length-prefixed row/field framing.

use arrow::array::{ArrayRef, BooleanArray};
use log::{debug, trace, warn};

use crate::byte_reader::{can_consume, checked_consume_i16, checked_consume_i32, checked_consume_u32};
use crate::column_buffer::DecodeOptions;
use crate::column_sink::ColumnSink;
use crate::column_type::{ColumnTypeId, POSTGRES_SIGNATURE};
use crate::error::Error;

/// Bit 16 of the header flags field: rows carry a leading OID that must be read and discarded.
const WITH_OIDS_FLAG: u32 = 1 << 16;

/// Decodes a complete `COPY (FORMAT BINARY)` payload into one `(value array, null mask)` pair
/// per entry in `column_types`.
///
/// This is the public entry point's workhorse; see [`crate::decode_copy_binary`] for the
/// caller-facing wrapper that also validates `type_ids` before getting here.
pub fn decode_frame(
    input: &[u8],
    column_types: &[ColumnTypeId],
    options: &DecodeOptions,
) -> Result<Vec<(ArrayRef, BooleanArray)>, Error> {
    let len = input.len();
    let ncolumns = column_types.len();

    if len < POSTGRES_SIGNATURE.len() || input[..POSTGRES_SIGNATURE.len()] != POSTGRES_SIGNATURE {
        return Err(fail(Error::Framing("missing postgres signature".into())));
    }
    let mut cursor = POSTGRES_SIGNATURE.len();

    let flags = checked_consume_u32(input, &mut cursor, len)?;
    if flags != 0 && flags != WITH_OIDS_FLAG {
        return Err(fail(Error::Framing(format!(
            "invalid flags in header: {flags:#010x}"
        ))));
    }
    let with_oids = flags & WITH_OIDS_FLAG != 0;

    let ext_len = checked_consume_u32(input, &mut cursor, len)?;
    if ext_len != 0 {
        return Err(fail(Error::Framing(format!(
            "non-zero header extension length: {ext_len}"
        ))));
    }

    debug!(
        "decoding COPY binary header: {ncolumns} column(s), with_oids={with_oids}"
    );

    let mut sinks: Vec<ColumnSink> = column_types
        .iter()
        .map(|&type_id| ColumnSink::allocate(type_id, options))
        .collect::<Result<_, _>>()
        .map_err(fail)?;

    let mut row_count: usize = 0;

    loop {
        let field_count = checked_consume_i16(input, &mut cursor, len).map_err(fail)?;
        if field_count == -1 {
            break;
        }
        if field_count as isize != ncolumns as isize {
            return Err(fail(Error::Framing(format!(
                "mismatched field_count and ncolumns: {field_count} != {ncolumns}"
            ))));
        }

        if with_oids {
            // Read and discard the OID: a fixed 4-byte advance, not an advance by the OID's
            // own value.
            checked_consume_u32(input, &mut cursor, len).map_err(fail)?;
        }

        if let Some(capacity) = sinks.first().map(ColumnSink::capacity) {
            if row_count == capacity {
                trace!("growing column buffers: capacity {capacity} exhausted at row {row_count}");
                for sink in sinks.iter_mut() {
                    sink.grow(options).map_err(fail)?;
                }
            }
        }

        for (column, sink) in sinks.iter_mut().enumerate() {
            let datalen = checked_consume_i32(input, &mut cursor, len).map_err(fail)?;
            if datalen == -1 {
                sink.push_null();
                continue;
            }
            let datalen = datalen as usize;
            can_consume(datalen, cursor, len).map_err(fail)?;
            let field = &input[cursor..cursor + datalen];
            sink.push_value(column, field).map_err(fail)?;
            cursor += datalen;
        }

        row_count += 1;
    }

    debug!("decoded {row_count} row(s) across {ncolumns} column(s)");

    sinks
        .into_iter()
        .enumerate()
        .map(|(column, sink)| sink.finish(column))
        .collect::<Result<_, _>>()
        .map_err(fail)
}

/// Logs `error` via the `log` facade (so a caller's subscriber sees exactly one line per failed
/// decode) and passes it through unchanged.
fn fail(error: Error) -> Error {
    warn!("COPY binary decode failed: {error}");
    error
}
