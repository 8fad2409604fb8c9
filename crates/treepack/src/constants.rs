//! Wire constants: the one-byte kind tags and fixed header layouts.

use std::fmt;

/// One-byte discriminator for a value's primitive kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Tag {
    U8 = 0,
    U16 = 1,
    U32 = 2,
    U64 = 3,
    I8 = 4,
    I16 = 5,
    I32 = 6,
    I64 = 7,
    F32 = 8,
    F64 = 9,
    Str = 10,
    Array = 11,
    Object = 12,
}

impl Tag {
    /// Element tag written into the header of an array that never received
    /// an element.
    pub const EMPTY_ARRAY_ELEMENT: Tag = Tag::U8;

    pub const ALL: [Tag; 13] = [
        Tag::U8,
        Tag::U16,
        Tag::U32,
        Tag::U64,
        Tag::I8,
        Tag::I16,
        Tag::I32,
        Tag::I64,
        Tag::F32,
        Tag::F64,
        Tag::Str,
        Tag::Array,
        Tag::Object,
    ];

    #[inline]
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Encoded width of a numeric scalar, `None` for variable-size kinds.
    pub fn width(self) -> Option<usize> {
        match self {
            Tag::U8 | Tag::I8 => Some(1),
            Tag::U16 | Tag::I16 => Some(2),
            Tag::U32 | Tag::I32 | Tag::F32 => Some(4),
            Tag::U64 | Tag::I64 | Tag::F64 => Some(8),
            Tag::Str | Tag::Array | Tag::Object => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Tag::U8 => "u8",
            Tag::U16 => "u16",
            Tag::U32 => "u32",
            Tag::U64 => "u64",
            Tag::I8 => "i8",
            Tag::I16 => "i16",
            Tag::I32 => "i32",
            Tag::I64 => "i64",
            Tag::F32 => "f32",
            Tag::F64 => "f64",
            Tag::Str => "string",
            Tag::Array => "array",
            Tag::Object => "object",
        }
    }
}

impl TryFrom<u8> for Tag {
    type Error = u8;

    fn try_from(byte: u8) -> Result<Self, u8> {
        Tag::ALL.get(byte as usize).copied().ok_or(byte)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// `[tag: u8][element_count: u32][element_tag: u8]`
pub const ARRAY_HEADER_SIZE: usize = 6;
/// `[tag: u8][member_count: u32]`
pub const OBJECT_HEADER_SIZE: usize = 5;
/// Offset of the count field in both header kinds.
pub const HEADER_COUNT_OFFSET: usize = 1;
/// Offset of the element tag in an array header.
pub const ARRAY_ELEMENT_TAG_OFFSET: usize = 5;
/// Width of the length prefix in front of every string.
pub const STRING_LENGTH_SIZE: usize = 4;
