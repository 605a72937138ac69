//! Per-column decode state: one [`ColumnSink`] is constructed per declared column, before the
//! row loop starts, and is then matched once per field as the row/field decoder walks the
//! input. This is the "dispatch-once-per-column" pattern favored over a function-pointer table:
//! the match compiles to a jump table, not an indirect call per field.

use std::sync::Arc;

use arrow::array::{
    ArrayRef, BooleanArray, Date32Array, Float32Array, Float64Array, Int16Array, Int32Array,
    Int64Array, StringArray, TimestampMicrosecondArray,
};

use crate::byte_reader::{read_i16, read_i32, read_i64};
use crate::column_buffer::{DecodeOptions, FixedColumnBuffer, TextColumnBuffer};
use crate::column_type::{ColumnTypeId, DATE_EPOCH_SHIFT_DAYS, DATETIME_EPOCH_SHIFT_MICROS, NOT_A_TIME_SENTINEL};
use crate::error::Error;

/// Owns one column's buffer and knows how to parse a field into it, write a null into it, and
/// finish it into an `(ArrayRef, BooleanArray)` pair.
pub enum ColumnSink {
    Int16(FixedColumnBuffer),
    Int32(FixedColumnBuffer),
    Int64(FixedColumnBuffer),
    Float32(FixedColumnBuffer),
    Float64(FixedColumnBuffer),
    Boolean(FixedColumnBuffer),
    Utf8(TextColumnBuffer),
    TimestampMicros(FixedColumnBuffer),
    Date32(FixedColumnBuffer),
}

impl ColumnSink {
    /// Constructs the sink for `type_id`, allocating its starting buffers.
    pub fn allocate(type_id: ColumnTypeId, options: &DecodeOptions) -> Result<Self, Error> {
        let sink = match type_id {
            ColumnTypeId::Int16 => ColumnSink::Int16(FixedColumnBuffer::allocate(2, options)?),
            ColumnTypeId::Int32 => ColumnSink::Int32(FixedColumnBuffer::allocate(4, options)?),
            ColumnTypeId::Int64 => ColumnSink::Int64(FixedColumnBuffer::allocate(8, options)?),
            ColumnTypeId::Float32 => {
                ColumnSink::Float32(FixedColumnBuffer::allocate(4, options)?)
            }
            ColumnTypeId::Float64 => {
                ColumnSink::Float64(FixedColumnBuffer::allocate(8, options)?)
            }
            ColumnTypeId::Boolean => ColumnSink::Boolean(FixedColumnBuffer::allocate(1, options)?),
            ColumnTypeId::Utf8 => ColumnSink::Utf8(TextColumnBuffer::allocate(options)?),
            ColumnTypeId::TimestampMicros => {
                ColumnSink::TimestampMicros(FixedColumnBuffer::allocate(8, options)?)
            }
            ColumnTypeId::Date32 => ColumnSink::Date32(FixedColumnBuffer::allocate(8, options)?),
        };
        Ok(sink)
    }

    /// Row capacity of the underlying buffer, used by the row loop to decide whether a growth
    /// is due before writing the next row.
    pub fn capacity(&self) -> usize {
        match self {
            ColumnSink::Int16(b)
            | ColumnSink::Int32(b)
            | ColumnSink::Int64(b)
            | ColumnSink::Float32(b)
            | ColumnSink::Float64(b)
            | ColumnSink::Boolean(b)
            | ColumnSink::TimestampMicros(b)
            | ColumnSink::Date32(b) => b.capacity(),
            ColumnSink::Utf8(b) => b.capacity(),
        }
    }

    /// Grows the underlying buffer by `options.growth_factor`.
    pub fn grow(&mut self, options: &DecodeOptions) -> Result<(), Error> {
        match self {
            ColumnSink::Int16(b)
            | ColumnSink::Int32(b)
            | ColumnSink::Int64(b)
            | ColumnSink::Float32(b)
            | ColumnSink::Float64(b)
            | ColumnSink::Boolean(b)
            | ColumnSink::TimestampMicros(b)
            | ColumnSink::Date32(b) => b.grow(options),
            ColumnSink::Utf8(b) => b.grow(options),
        }
    }

    /// Writes the typed null sentinel for this column and records `false` in the mask.
    pub fn push_null(&mut self) {
        match self {
            ColumnSink::Int16(b) => b.push(&[0, 0], false),
            ColumnSink::Int32(b) => b.push(&[0, 0, 0, 0], false),
            ColumnSink::Int64(b) => b.push(&[0; 8], false),
            ColumnSink::Float32(b) => b.push(&[0, 0, 0, 0], false),
            ColumnSink::Float64(b) => b.push(&[0; 8], false),
            ColumnSink::Boolean(b) => b.push(&[0], false),
            ColumnSink::Utf8(b) => b.push(None),
            ColumnSink::TimestampMicros(b) => b.push(&NOT_A_TIME_SENTINEL.to_ne_bytes(), false),
            ColumnSink::Date32(b) => b.push(&NOT_A_TIME_SENTINEL.to_ne_bytes(), false),
        }
    }

    /// Parses `field` (the exact `datalen` bytes advertised on the wire) into this column,
    /// recording `true` in the mask. `column` is only used to annotate a [`Error::TypeMismatch`].
    pub fn push_value(&mut self, column: usize, field: &[u8]) -> Result<(), Error> {
        match self {
            ColumnSink::Int16(b) => {
                let raw = expect_len(column, ColumnTypeId::Int16, 2, field)?;
                let value = read_i16(raw);
                b.push(&value.to_ne_bytes(), true);
            }
            ColumnSink::Int32(b) => {
                let raw = expect_len(column, ColumnTypeId::Int32, 4, field)?;
                let value = read_i32(raw);
                b.push(&value.to_ne_bytes(), true);
            }
            ColumnSink::Int64(b) => {
                let raw = expect_len(column, ColumnTypeId::Int64, 8, field)?;
                let value = read_i64(raw);
                b.push(&value.to_ne_bytes(), true);
            }
            ColumnSink::Float32(b) => {
                let raw = expect_len(column, ColumnTypeId::Float32, 4, field)?;
                let bits = u32::from_be_bytes(raw.try_into().unwrap());
                let value = f32::from_bits(bits);
                b.push(&value.to_ne_bytes(), true);
            }
            ColumnSink::Float64(b) => {
                let raw = expect_len(column, ColumnTypeId::Float64, 8, field)?;
                let bits = u64::from_be_bytes(raw.try_into().unwrap());
                let value = f64::from_bits(bits);
                b.push(&value.to_ne_bytes(), true);
            }
            ColumnSink::Boolean(b) => {
                let raw = expect_len(column, ColumnTypeId::Boolean, 1, field)?;
                b.push(raw, true);
            }
            ColumnSink::Utf8(b) => {
                // Postgres `text`/`varchar` values are UTF-8 when the client encoding is UTF-8;
                // this layer is decode-only and does not renegotiate encoding, so a malformed
                // byte sequence is replaced rather than failing the whole decode.
                let text = String::from_utf8_lossy(field).into_owned();
                b.push(Some(text.into_boxed_str()));
            }
            ColumnSink::TimestampMicros(b) => {
                let raw = expect_len(column, ColumnTypeId::TimestampMicros, 8, field)?;
                let on_wire = read_i64(raw);
                let value = on_wire.wrapping_add(DATETIME_EPOCH_SHIFT_MICROS);
                b.push(&value.to_ne_bytes(), true);
            }
            ColumnSink::Date32(b) => {
                let raw = expect_len(column, ColumnTypeId::Date32, 4, field)?;
                let on_wire = read_i32(raw);
                let value = on_wire as i64 + DATE_EPOCH_SHIFT_DAYS;
                b.push(&value.to_ne_bytes(), true);
            }
        }
        Ok(())
    }

    /// Consumes the sink, producing the `(value array, null mask)` pair the public entry point
    /// returns for this column.
    pub fn finish(self, column: usize) -> Result<(ArrayRef, BooleanArray), Error> {
        let pair: (ArrayRef, BooleanArray) = match self {
            ColumnSink::Int16(b) => {
                let mask = mask_array(&b);
                let values: Vec<i16> = native_chunks(b.values(), i16::from_ne_bytes);
                (Arc::new(Int16Array::from(values)), mask)
            }
            ColumnSink::Int32(b) => {
                let mask = mask_array(&b);
                let values: Vec<i32> = native_chunks(b.values(), i32::from_ne_bytes);
                (Arc::new(Int32Array::from(values)), mask)
            }
            ColumnSink::Int64(b) => {
                let mask = mask_array(&b);
                let values: Vec<i64> = native_chunks(b.values(), i64::from_ne_bytes);
                (Arc::new(Int64Array::from(values)), mask)
            }
            ColumnSink::Float32(b) => {
                let mask = mask_array(&b);
                let values: Vec<f32> = native_chunks(b.values(), f32::from_ne_bytes);
                (Arc::new(Float32Array::from(values)), mask)
            }
            ColumnSink::Float64(b) => {
                let mask = mask_array(&b);
                let values: Vec<f64> = native_chunks(b.values(), f64::from_ne_bytes);
                (Arc::new(Float64Array::from(values)), mask)
            }
            ColumnSink::Boolean(b) => {
                let mask = mask_array(&b);
                let values: Vec<bool> = b.values().iter().map(|&byte| byte != 0).collect();
                (Arc::new(BooleanArray::from(values)), mask)
            }
            ColumnSink::Utf8(b) => {
                let row_count = b.row_count();
                let values = b.into_values();
                let mask = BooleanArray::from(
                    values.iter().map(Option::is_some).collect::<Vec<bool>>(),
                );
                debug_assert_eq!(mask.len(), row_count);
                let array = StringArray::from(
                    values
                        .iter()
                        .map(|v| v.as_deref())
                        .collect::<Vec<Option<&str>>>(),
                );
                (Arc::new(array), mask)
            }
            ColumnSink::TimestampMicros(b) => {
                let mask = mask_array(&b);
                let values: Vec<i64> = native_chunks(b.values(), i64::from_ne_bytes);
                (Arc::new(TimestampMicrosecondArray::from(values)), mask)
            }
            ColumnSink::Date32(b) => {
                let mask = mask_array(&b);
                let widened: Vec<i64> = native_chunks(b.values(), i64::from_ne_bytes);
                let mut narrowed = Vec::with_capacity(widened.len());
                for value in widened {
                    let narrow = i32::try_from(value).map_err(|_| Error::ArrayConstruction {
                        column,
                        source: arrow::error::ArrowError::CastError(format!(
                            "date value {value} (days since epoch) does not fit in Date32's \
                             32-bit representation"
                        )),
                    })?;
                    narrowed.push(narrow);
                }
                (Arc::new(Date32Array::from(narrowed)), mask)
            }
        };
        Ok(pair)
    }
}

/// Builds the authoritative null mask array for a fixed-width column from its raw mask bytes.
fn mask_array(buffer: &FixedColumnBuffer) -> BooleanArray {
    BooleanArray::from(buffer.mask().iter().map(|&b| b != 0).collect::<Vec<bool>>())
}

/// Reassembles a native-endian byte buffer into a typed `Vec<T>`, one element per
/// `size_of::<T>()`-byte chunk.
fn native_chunks<T, const N: usize>(bytes: &[u8], from_ne_bytes: fn([u8; N]) -> T) -> Vec<T> {
    bytes
        .chunks_exact(N)
        .map(|chunk| from_ne_bytes(chunk.try_into().unwrap()))
        .collect()
}

/// Validates a fixed-width field's advertised length against the width `type_id` requires,
/// returning the field bytes back out for convenience at the call site.
fn expect_len(
    column: usize,
    type_id: ColumnTypeId,
    expected_len: usize,
    field: &[u8],
) -> Result<&[u8], Error> {
    if field.len() != expected_len {
        return Err(Error::TypeMismatch {
            column,
            type_id,
            expected_len,
            actual_len: field.len() as i32,
        });
    }
    Ok(field)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column_buffer::DecodeOptions;

    #[test]
    fn int32_round_trips_big_endian_wire_bytes() {
        let options = DecodeOptions::default();
        let mut sink = ColumnSink::allocate(ColumnTypeId::Int32, &options).unwrap();
        sink.push_value(0, &42i32.to_be_bytes()).unwrap();
        sink.push_null();
        let (values, mask) = sink.finish(0).unwrap();
        let values = values.as_any().downcast_ref::<Int32Array>().unwrap();
        assert_eq!(values.value(0), 42);
        assert_eq!(values.value(1), 0);
        assert!(mask.value(0));
        assert!(!mask.value(1));
    }

    #[test]
    fn wrong_field_length_is_a_type_mismatch() {
        let options = DecodeOptions::default();
        let mut sink = ColumnSink::allocate(ColumnTypeId::Int32, &options).unwrap();
        let err = sink.push_value(3, &[0, 0, 0]).unwrap_err();
        assert!(matches!(
            err,
            Error::TypeMismatch {
                column: 3,
                expected_len: 4,
                actual_len: 3,
                ..
            }
        ));
    }

    #[test]
    fn datetime_applies_the_y2k_to_epoch_shift() {
        let options = DecodeOptions::default();
        let mut sink = ColumnSink::allocate(ColumnTypeId::TimestampMicros, &options).unwrap();
        sink.push_value(0, &0i64.to_be_bytes()).unwrap();
        let (values, mask) = sink.finish(0).unwrap();
        let values = values
            .as_any()
            .downcast_ref::<TimestampMicrosecondArray>()
            .unwrap();
        assert_eq!(values.value(0), DATETIME_EPOCH_SHIFT_MICROS);
        assert!(mask.value(0));
    }

    #[test]
    fn date_widens_then_narrows_around_the_shift() {
        let options = DecodeOptions::default();
        let mut sink = ColumnSink::allocate(ColumnTypeId::Date32, &options).unwrap();
        sink.push_value(0, &0i32.to_be_bytes()).unwrap();
        let (values, _mask) = sink.finish(0).unwrap();
        let values = values.as_any().downcast_ref::<Date32Array>().unwrap();
        assert_eq!(values.value(0) as i64, DATE_EPOCH_SHIFT_DAYS);
    }

    #[test]
    fn text_column_distinguishes_empty_string_from_null() {
        let options = DecodeOptions::default();
        let mut sink = ColumnSink::allocate(ColumnTypeId::Utf8, &options).unwrap();
        sink.push_value(0, b"").unwrap();
        sink.push_null();
        let (values, mask) = sink.finish(0).unwrap();
        let values = values.as_any().downcast_ref::<StringArray>().unwrap();
        assert!(mask.value(0));
        assert!(!mask.value(1));
        assert_eq!(values.value(0), "");
        assert!(values.is_null(1));
    }

    #[test]
    fn float32_is_a_bit_copy_not_a_numeric_cast() {
        let options = DecodeOptions::default();
        let mut sink = ColumnSink::allocate(ColumnTypeId::Float32, &options).unwrap();
        let on_wire = 1.5f32.to_be_bytes();
        sink.push_value(0, &on_wire).unwrap();
        let (values, _mask) = sink.finish(0).unwrap();
        let values = values.as_any().downcast_ref::<Float32Array>().unwrap();
        assert_eq!(values.value(0), 1.5f32);
    }
}
