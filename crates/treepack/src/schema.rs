//! Decoding schemas.
//!
//! Scalars carry no tag on the wire, so a reader needs to know the shape of
//! what it reads. Array headers still record their element tag, which the
//! decoder checks against the schema.

use crate::constants::{Tag, ARRAY_HEADER_SIZE, OBJECT_HEADER_SIZE, STRING_LENGTH_SIZE};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeSchema {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    Str,
    Array(Box<TreeSchema>),
    /// Members by name. Order on the wire is free.
    Object(Vec<(String, TreeSchema)>),
}

impl TreeSchema {
    pub fn array(element: TreeSchema) -> Self {
        TreeSchema::Array(Box::new(element))
    }

    pub fn object<I, K>(members: I) -> Self
    where
        I: IntoIterator<Item = (K, TreeSchema)>,
        K: Into<String>,
    {
        TreeSchema::Object(members.into_iter().map(|(k, s)| (k.into(), s)).collect())
    }

    pub fn tag(&self) -> Tag {
        match self {
            TreeSchema::U8 => Tag::U8,
            TreeSchema::U16 => Tag::U16,
            TreeSchema::U32 => Tag::U32,
            TreeSchema::U64 => Tag::U64,
            TreeSchema::I8 => Tag::I8,
            TreeSchema::I16 => Tag::I16,
            TreeSchema::I32 => Tag::I32,
            TreeSchema::I64 => Tag::I64,
            TreeSchema::F32 => Tag::F32,
            TreeSchema::F64 => Tag::F64,
            TreeSchema::Str => Tag::Str,
            TreeSchema::Array(_) => Tag::Array,
            TreeSchema::Object(_) => Tag::Object,
        }
    }

    /// Fewest bytes any value of this shape occupies on the wire.
    pub fn min_encoded_size(&self) -> usize {
        match self {
            TreeSchema::Str => STRING_LENGTH_SIZE,
            TreeSchema::Array(_) => ARRAY_HEADER_SIZE,
            TreeSchema::Object(_) => OBJECT_HEADER_SIZE,
            scalar => scalar.tag().width().unwrap_or(1),
        }
    }

    /// Looks up the schema of an object member.
    pub fn member(&self, name: &str) -> Option<&TreeSchema> {
        match self {
            TreeSchema::Object(members) => members
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, schema)| schema),
            _ => None,
        }
    }
}
