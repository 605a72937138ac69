//! End-to-end scenarios against the public entry point, built directly from the wire-format
//! descriptions in the crate's design documents rather than against a live database - the
//! decoder's only input is an already-materialized byte buffer.

use arrow::array::{
    BooleanArray, Date32Array, Int32Array, StringArray, TimestampMicrosecondArray,
};
use arrow_pgcopy::{decode_copy_binary, decode_copy_binary_with_options, DecodeOptions, Error};

const SIGNATURE: [u8; 11] = *b"PGCOPY\n\xff\r\n\0";
const DATETIME_EPOCH_SHIFT_MICROS: i64 = 946_684_800_000_000;
const DATE_EPOCH_SHIFT_DAYS: i64 = 10_957;

fn header(flags: u32) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&SIGNATURE);
    buf.extend_from_slice(&flags.to_be_bytes());
    buf.extend_from_slice(&0u32.to_be_bytes());
    buf
}

fn end_of_data() -> [u8; 2] {
    (-1i16).to_be_bytes()
}

#[test]
fn smallest_well_formed_stream_one_int32_row() {
    let mut input = header(0);
    input.extend_from_slice(&1i16.to_be_bytes());
    input.extend_from_slice(&4i32.to_be_bytes());
    input.extend_from_slice(&42i32.to_be_bytes());
    input.extend_from_slice(&end_of_data());

    let columns = decode_copy_binary(&input, &[1]).unwrap();
    assert_eq!(columns.len(), 1);
    let (values, mask) = &columns[0];
    let values = values.as_any().downcast_ref::<Int32Array>().unwrap();
    assert_eq!(values.len(), 1);
    assert_eq!(values.value(0), 42);
    assert!(mask.value(0));
}

#[test]
fn null_field_is_zero_valued_with_mask_false() {
    let mut input = header(0);
    input.extend_from_slice(&1i16.to_be_bytes());
    input.extend_from_slice(&(-1i32).to_be_bytes());
    input.extend_from_slice(&end_of_data());

    let columns = decode_copy_binary(&input, &[1]).unwrap();
    let (values, mask) = &columns[0];
    let values = values.as_any().downcast_ref::<Int32Array>().unwrap();
    assert_eq!(values.value(0), 0);
    assert!(!mask.value(0));
}

#[test]
fn datetime_offset_shifts_from_y2k_to_unix_epoch() {
    let mut input = header(0);
    input.extend_from_slice(&1i16.to_be_bytes());
    input.extend_from_slice(&8i32.to_be_bytes());
    input.extend_from_slice(&0i64.to_be_bytes());
    input.extend_from_slice(&end_of_data());

    let columns = decode_copy_binary(&input, &[7]).unwrap();
    let (values, mask) = &columns[0];
    let values = values
        .as_any()
        .downcast_ref::<TimestampMicrosecondArray>()
        .unwrap();
    assert_eq!(values.value(0), DATETIME_EPOCH_SHIFT_MICROS);
    assert!(mask.value(0));
}

#[test]
fn date_widening_shifts_days_and_narrows_to_32_bits() {
    let mut input = header(0);
    input.extend_from_slice(&1i16.to_be_bytes());
    input.extend_from_slice(&4i32.to_be_bytes());
    input.extend_from_slice(&0i32.to_be_bytes());
    input.extend_from_slice(&end_of_data());

    let columns = decode_copy_binary(&input, &[8]).unwrap();
    let (values, mask) = &columns[0];
    let values = values.as_any().downcast_ref::<Date32Array>().unwrap();
    assert_eq!(values.value(0) as i64, DATE_EPOCH_SHIFT_DAYS);
    assert!(mask.value(0));
}

#[test]
fn growth_crossing_4097_bool_rows_with_every_seventh_row_null() {
    let options = DecodeOptions::default();
    let mut input = header(0);
    let row_count = options.starting_capacity + 1;
    for i in 0..row_count {
        input.extend_from_slice(&1i16.to_be_bytes());
        if (i + 1) % 7 == 0 {
            input.extend_from_slice(&(-1i32).to_be_bytes());
        } else {
            input.extend_from_slice(&1i32.to_be_bytes());
            input.push((i % 2 == 0) as u8);
        }
    }
    input.extend_from_slice(&end_of_data());

    let columns = decode_copy_binary_with_options(&input, &[5], &options).unwrap();
    let (values, mask) = &columns[0];
    let values = values
        .as_any()
        .downcast_ref::<BooleanArray>()
        .unwrap();
    assert_eq!(values.len(), row_count);
    assert_eq!(mask.len(), row_count);
    for i in 0..row_count {
        if (i + 1) % 7 == 0 {
            assert!(!mask.value(i), "row {i} should be null");
            assert!(!values.value(i), "null row {i} should carry the zero sentinel");
        } else {
            assert!(mask.value(i), "row {i} should be valid");
            assert_eq!(values.value(i), i % 2 == 0);
        }
    }
}

#[test]
fn malformed_signature_fails_without_leaking_or_panicking() {
    let mut input = header(0);
    input[3] ^= 0x01;
    input.extend_from_slice(&end_of_data());

    let err = decode_copy_binary(&input, &[1]).unwrap_err();
    assert!(matches!(err, Error::Framing(_)));
}

#[test]
fn text_column_round_trips_owned_strings() {
    let mut input = header(0);
    input.extend_from_slice(&1i16.to_be_bytes());
    input.extend_from_slice(&5i32.to_be_bytes());
    input.extend_from_slice(b"hello");
    input.extend_from_slice(&end_of_data());

    let columns = decode_copy_binary(&input, &[6]).unwrap();
    let (values, mask) = &columns[0];
    let values = values.as_any().downcast_ref::<StringArray>().unwrap();
    assert_eq!(values.value(0), "hello");
    assert!(mask.value(0));
}

#[test]
fn truncation_after_the_signature_is_a_bounds_error() {
    // Signature present in full, but the flags field is cut short - the signature check passes,
    // the subsequent bounds-checked read does not.
    let mut input = SIGNATURE.to_vec();
    input.extend_from_slice(&[0x00, 0x00]);
    let err = decode_copy_binary(&input, &[1]).unwrap_err();
    assert!(matches!(err, Error::Bounds { .. }));
}

#[test]
fn unknown_type_id_is_rejected_before_any_row_is_read() {
    let mut input = header(0);
    input.extend_from_slice(&end_of_data());

    let err = decode_copy_binary(&input, &[42]).unwrap_err();
    assert!(matches!(err, Error::Framing(_)));
}
