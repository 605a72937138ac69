//! Bounds-checked, endian-correct reads over a borrowed byte slice with an advancing cursor.
//!
//! Every multi-byte value on the wire is big-endian. Reads are assembled byte-wise via
//! `from_be_bytes` rather than a pointer cast, so a misaligned `cursor` is never undefined
//! behavior - only ever a bounds check away from being rejected.

use crate::error::Error;

/// Returns `Ok(())` if `size` more bytes can be read starting at `cursor` without running past
/// `len`, otherwise a bounds error. Detects both arithmetic overflow in `cursor + size` and a
/// cursor that would land beyond the end of the input.
pub fn can_consume(size: usize, cursor: usize, len: usize) -> Result<(), Error> {
    let end = cursor.checked_add(size).ok_or(Error::Bounds {
        cursor,
        needed: size,
        input_len: len,
    })?;
    if end > len {
        return Err(Error::Bounds {
            cursor,
            needed: size,
            input_len: len,
        });
    }
    Ok(())
}

/// Reads a big-endian `u32` at `cursor` and advances it by 4, bounds-checked.
pub fn checked_consume_u32(buffer: &[u8], cursor: &mut usize, len: usize) -> Result<u32, Error> {
    can_consume(4, *cursor, len)?;
    let bytes: [u8; 4] = buffer[*cursor..*cursor + 4].try_into().unwrap();
    *cursor += 4;
    Ok(u32::from_be_bytes(bytes))
}

/// Reads a big-endian `i16` at `cursor` and advances it by 2, bounds-checked.
pub fn checked_consume_i16(buffer: &[u8], cursor: &mut usize, len: usize) -> Result<i16, Error> {
    can_consume(2, *cursor, len)?;
    let bytes: [u8; 2] = buffer[*cursor..*cursor + 2].try_into().unwrap();
    *cursor += 2;
    Ok(i16::from_be_bytes(bytes))
}

/// Reads a big-endian `i32` at `cursor` and advances it by 4, bounds-checked.
pub fn checked_consume_i32(buffer: &[u8], cursor: &mut usize, len: usize) -> Result<i32, Error> {
    can_consume(4, *cursor, len)?;
    let bytes: [u8; 4] = buffer[*cursor..*cursor + 4].try_into().unwrap();
    *cursor += 4;
    Ok(i32::from_be_bytes(bytes))
}

/// Reads a big-endian `i64` from a slice already known to be exactly 8 bytes long. Used by the
/// fixed-width column parsers, which have already validated the field length against the
/// expected on-wire width before calling this.
pub fn read_i64(field: &[u8]) -> i64 {
    i64::from_be_bytes(field.try_into().unwrap())
}

/// Reads a big-endian `i32` from a slice already known to be exactly 4 bytes long.
pub fn read_i32(field: &[u8]) -> i32 {
    i32::from_be_bytes(field.try_into().unwrap())
}

/// Reads a big-endian `i16` from a slice already known to be exactly 2 bytes long.
pub fn read_i16(field: &[u8]) -> i16 {
    i16::from_be_bytes(field.try_into().unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consume_u32_advances_cursor_by_four() {
        let buf = [0x00, 0x01, 0x00, 0x00, 0xAB];
        let mut cursor = 0;
        let value = checked_consume_u32(&buf, &mut cursor, buf.len()).unwrap();
        assert_eq!(value, 1 << 16);
        assert_eq!(cursor, 4);
    }

    #[test]
    fn can_consume_rejects_reads_past_the_end() {
        assert!(can_consume(4, 6, 8).is_err());
        assert!(can_consume(4, 4, 8).is_ok());
        assert!(can_consume(1, 8, 8).is_err());
    }

    #[test]
    fn can_consume_rejects_cursor_overflow() {
        assert!(can_consume(usize::MAX, 1, 8).is_err());
    }

    #[test]
    fn checked_consume_i16_reports_bounds_error_on_truncated_input() {
        let buf = [0x00];
        let mut cursor = 0;
        assert!(checked_consume_i16(&buf, &mut cursor, buf.len()).is_err());
    }
}
