//! The type descriptor table: the small, fixed set of column types this crate knows how to
//! decode off the wire, identified by the type-id the caller supplies per column.

/// The 11 byte signature every `COPY (FORMAT BINARY)` payload starts with.
pub const POSTGRES_SIGNATURE: [u8; 11] = *b"PGCOPY\n\xff\r\n\0";

/// Microseconds between the Postgres epoch (2000-01-01 UTC) and the Unix epoch
/// (1970-01-01 UTC).
pub const DATETIME_EPOCH_SHIFT_MICROS: i64 = 946_684_800_000_000;

/// Days between the Postgres epoch (2000-01-01) and the Unix epoch (1970-01-01).
pub const DATE_EPOCH_SHIFT_DAYS: i64 = 10_957;

/// Bit pattern written into an 8-byte temporal slot to represent NULL without consulting the
/// mask - every byte `0xFF`, the "not-a-time" sentinel named in the column data model.
pub const NOT_A_TIME_SENTINEL: i64 = -1;

/// One of the nine column types this crate can decode, identified by the small integer the
/// caller supplies per column (`type-id` in the wire/data model documentation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ColumnTypeId {
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    Boolean,
    /// Variable length text, decoded into an owned `Box<str>` per non-null row.
    Utf8,
    /// Microseconds since the Unix epoch.
    TimestampMicros,
    /// Days since the Unix epoch.
    Date32,
}

impl ColumnTypeId {
    /// Constructs a `ColumnTypeId` from the caller-supplied wire type-id (0..=8). Returns `None`
    /// for any id the decoder does not recognize.
    pub fn from_u16(id: u16) -> Option<Self> {
        let type_id = match id {
            0 => ColumnTypeId::Int16,
            1 => ColumnTypeId::Int32,
            2 => ColumnTypeId::Int64,
            3 => ColumnTypeId::Float32,
            4 => ColumnTypeId::Float64,
            5 => ColumnTypeId::Boolean,
            6 => ColumnTypeId::Utf8,
            7 => ColumnTypeId::TimestampMicros,
            8 => ColumnTypeId::Date32,
            _ => return None,
        };
        Some(type_id)
    }

    /// The numeric type-id this variant was constructed from, the inverse of [`Self::from_u16`].
    pub fn as_u16(self) -> u16 {
        match self {
            ColumnTypeId::Int16 => 0,
            ColumnTypeId::Int32 => 1,
            ColumnTypeId::Int64 => 2,
            ColumnTypeId::Float32 => 3,
            ColumnTypeId::Float64 => 4,
            ColumnTypeId::Boolean => 5,
            ColumnTypeId::Utf8 => 6,
            ColumnTypeId::TimestampMicros => 7,
            ColumnTypeId::Date32 => 8,
        }
    }

    /// Dtype name as exposed through [`TYPE_ID_MAP`], mirroring the numpy dtype strings the
    /// decoder's ancestor used (`"int16"`, `"datetime64[us]"`, ...).
    pub fn dtype_name(self) -> &'static str {
        match self {
            ColumnTypeId::Int16 => "int16",
            ColumnTypeId::Int32 => "int32",
            ColumnTypeId::Int64 => "int64",
            ColumnTypeId::Float32 => "float32",
            ColumnTypeId::Float64 => "float64",
            ColumnTypeId::Boolean => "bool",
            ColumnTypeId::Utf8 => "object",
            ColumnTypeId::TimestampMicros => "datetime64[us]",
            ColumnTypeId::Date32 => "datetime64[D]",
        }
    }

    /// The width, in bytes, this column type occupies in its internal decode buffer. For
    /// [`ColumnTypeId::Utf8`] there is no fixed width - values live in a `Vec<Option<Box<str>>>`
    /// rather than a byte buffer, see `column_buffer::TextColumnBuffer`.
    pub fn element_size(self) -> Option<usize> {
        match self {
            ColumnTypeId::Int16 => Some(2),
            ColumnTypeId::Int32 => Some(4),
            ColumnTypeId::Int64 => Some(8),
            ColumnTypeId::Float32 => Some(4),
            ColumnTypeId::Float64 => Some(8),
            ColumnTypeId::Boolean => Some(1),
            ColumnTypeId::Utf8 => None,
            ColumnTypeId::TimestampMicros => Some(8),
            // Internally widened to 8 bytes to keep a uniform byte-buffer representation even
            // though the on-wire width is 4 and the returned `Date32Array` narrows back to 4.
            ColumnTypeId::Date32 => Some(8),
        }
    }

    /// The on-wire width PostgreSQL uses for this type, or `None` for the variable-length text
    /// type.
    pub fn wire_width(self) -> Option<usize> {
        match self {
            ColumnTypeId::Date32 => Some(4),
            ColumnTypeId::Utf8 => None,
            other => other.element_size(),
        }
    }
}

impl TryFrom<u16> for ColumnTypeId {
    type Error = crate::error::Error;

    fn try_from(id: u16) -> Result<Self, Self::Error> {
        ColumnTypeId::from_u16(id)
            .ok_or_else(|| crate::error::Error::Framing(format!("unknown column type-id: {id}")))
    }
}

impl From<ColumnTypeId> for u16 {
    fn from(type_id: ColumnTypeId) -> Self {
        type_id.as_u16()
    }
}

/// Name -> type-id mapping exposed for introspection, e.g. by a caller building the `type_ids`
/// slice from user-facing column type names rather than hard-coded integers.
pub const TYPE_ID_MAP: &[(&str, u16)] = &[
    ("int16", 0),
    ("int32", 1),
    ("int64", 2),
    ("float32", 3),
    ("float64", 4),
    ("bool", 5),
    ("object", 6),
    ("datetime64[us]", 7),
    ("datetime64[D]", 8),
];

/// Looks up a type-id by its dtype name, the inverse of [`ColumnTypeId::dtype_name`].
pub fn type_id_for_name(name: &str) -> Option<u16> {
    TYPE_ID_MAP
        .iter()
        .find(|(dtype_name, _)| *dtype_name == name)
        .map(|(_, id)| *id)
}
