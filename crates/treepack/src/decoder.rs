//! Schema-driven decoder for treepack streams.

use treepack_buffers::Reader;

use crate::constants::{Tag, STRING_LENGTH_SIZE};
use crate::error::DecodeError;
use crate::schema::TreeSchema;
use crate::value::TreeValue;

/// Reads consecutive top-level values from a byte slice.
///
/// ```
/// use treepack::{TreeDecoder, TreeSchema, TreeValue};
///
/// let bytes = [7, 0, 0, 0, 1, 0, 0, 0, b'x'];
/// let mut dec = TreeDecoder::new(&bytes);
/// assert_eq!(dec.read(&TreeSchema::U32)?, TreeValue::U32(7));
/// assert_eq!(dec.read(&TreeSchema::Str)?, TreeValue::Str("x".into()));
/// assert!(dec.is_done());
/// # Ok::<(), treepack::DecodeError>(())
/// ```
pub struct TreeDecoder<'a> {
    reader: Reader<'a>,
}

impl<'a> TreeDecoder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            reader: Reader::new(data),
        }
    }

    pub fn reset(&mut self, data: &'a [u8]) {
        self.reader.reset(data);
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.reader.size()
    }

    pub fn is_done(&self) -> bool {
        self.reader.is_done()
    }

    /// Reads one value shaped like `schema`.
    pub fn read(&mut self, schema: &TreeSchema) -> Result<TreeValue, DecodeError> {
        let r = &mut self.reader;
        Ok(match schema {
            TreeSchema::U8 => TreeValue::U8(r.try_u8()?),
            TreeSchema::U16 => TreeValue::U16(r.try_u16()?),
            TreeSchema::U32 => TreeValue::U32(r.try_u32()?),
            TreeSchema::U64 => TreeValue::U64(r.try_u64()?),
            TreeSchema::I8 => TreeValue::I8(r.try_i8()?),
            TreeSchema::I16 => TreeValue::I16(r.try_i16()?),
            TreeSchema::I32 => TreeValue::I32(r.try_i32()?),
            TreeSchema::I64 => TreeValue::I64(r.try_i64()?),
            TreeSchema::F32 => TreeValue::F32(r.try_f32()?),
            TreeSchema::F64 => TreeValue::F64(r.try_f64()?),
            TreeSchema::Str => TreeValue::Str(self.read_str()?),
            TreeSchema::Array(element) => self.read_array(element)?,
            TreeSchema::Object(_) => self.read_object(schema)?,
        })
    }

    fn read_str(&mut self) -> Result<String, DecodeError> {
        let len = self.reader.try_u32()? as usize;
        Ok(self.reader.try_utf8(len)?.to_owned())
    }

    fn read_tag(&mut self) -> Result<Tag, DecodeError> {
        let byte = self.reader.try_u8()?;
        Tag::try_from(byte).map_err(DecodeError::UnknownTag)
    }

    fn expect_tag(&mut self, expected: Tag) -> Result<(), DecodeError> {
        let found = self.read_tag()?;
        if found != expected {
            return Err(DecodeError::UnexpectedTag { expected, found });
        }
        Ok(())
    }

    fn read_array(&mut self, element: &TreeSchema) -> Result<TreeValue, DecodeError> {
        self.expect_tag(Tag::Array)?;
        let count = self.reader.try_u32()? as usize;
        let found = self.read_tag()?;
        // An empty array's element tag is a placeholder.
        if count > 0 && found != element.tag() {
            return Err(DecodeError::UnexpectedTag {
                expected: element.tag(),
                found,
            });
        }
        let fits = self.remaining() / element.min_encoded_size();
        let mut items = Vec::with_capacity(count.min(fits));
        for _ in 0..count {
            items.push(self.read(element)?);
        }
        Ok(TreeValue::Array(items))
    }

    fn read_object(&mut self, schema: &TreeSchema) -> Result<TreeValue, DecodeError> {
        self.expect_tag(Tag::Object)?;
        let count = self.reader.try_u32()? as usize;
        // Every member carries at least its name's length prefix.
        let fits = self.remaining() / STRING_LENGTH_SIZE;
        let mut members = Vec::with_capacity(count.min(fits));
        for _ in 0..count {
            let name = self.read_str()?;
            let member = schema
                .member(&name)
                .ok_or_else(|| DecodeError::UnknownMember(name.clone()))?;
            let value = self.read(member)?;
            members.push((name, value));
        }
        Ok(TreeValue::Object(members))
    }
}

/// Decodes exactly one value; trailing bytes are an error.
pub fn decode(data: &[u8], schema: &TreeSchema) -> Result<TreeValue, DecodeError> {
    let mut dec = TreeDecoder::new(data);
    let value = dec.read(schema)?;
    match dec.remaining() {
        0 => Ok(value),
        n => Err(DecodeError::TrailingBytes(n)),
    }
}

/// Decodes top-level values of the same shape until the input ends.
pub fn decode_many(data: &[u8], schema: &TreeSchema) -> Result<Vec<TreeValue>, DecodeError> {
    let mut dec = TreeDecoder::new(data);
    let mut out = Vec::new();
    while !dec.is_done() {
        out.push(dec.read(schema)?);
    }
    Ok(out)
}
