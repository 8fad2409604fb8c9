//! Open-container frames and their header backpatching.

use treepack_buffers::Writer;

use crate::constants::{
    Tag, ARRAY_ELEMENT_TAG_OFFSET, ARRAY_HEADER_SIZE, HEADER_COUNT_OFFSET, OBJECT_HEADER_SIZE,
};
use crate::error::{ProtocolViolation, SerialiseError};

/// An array or object that has been started but not yet ended.
///
/// The frame's buffer begins with its header, written with a zero count
/// (and a sentinel element tag for arrays) when the frame opens.
pub(crate) enum Frame {
    Array(ArrayFrame),
    Object(ObjectFrame),
}

pub(crate) struct ArrayFrame {
    pub writer: Writer,
    element: Option<Tag>,
    count: u32,
}

pub(crate) struct ObjectFrame {
    pub writer: Writer,
    members: u32,
    pending_name: Option<String>,
}

impl Frame {
    pub fn tag(&self) -> Tag {
        match self {
            Frame::Array(_) => Tag::Array,
            Frame::Object(_) => Tag::Object,
        }
    }
}

fn add_count(count: u32, n: usize) -> Result<u32, SerialiseError> {
    u32::try_from(n)
        .ok()
        .and_then(|n| count.checked_add(n))
        .ok_or_else(|| {
            ProtocolViolation::LengthOverflow {
                len: (count as usize).saturating_add(n),
            }
            .into()
        })
}

impl ArrayFrame {
    pub fn open(alloc_size: usize) -> Self {
        let mut writer = Writer::with_alloc_size(alloc_size.max(ARRAY_HEADER_SIZE));
        writer.u8u32(Tag::Array.as_u8(), 0);
        writer.u8(Tag::EMPTY_ARRAY_ELEMENT.as_u8());
        Self {
            writer,
            element: None,
            count: 0,
        }
    }

    /// Checks that `count` elements of kind `tag` may be appended and
    /// records them. An empty run changes nothing.
    pub fn admit(&mut self, tag: Tag, count: usize) -> Result<(), SerialiseError> {
        if count == 0 {
            return Ok(());
        }
        match self.element {
            None => self.element = Some(tag),
            Some(expected) if expected != tag => {
                return Err(SerialiseError::TypeMismatch {
                    expected,
                    found: tag,
                });
            }
            Some(_) => {}
        }
        self.count = add_count(self.count, count)?;
        Ok(())
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Backpatches the header and returns the finished bytes.
    pub fn close(mut self) -> Result<Vec<u8>, SerialiseError> {
        let element = self.element.unwrap_or(Tag::EMPTY_ARRAY_ELEMENT);
        self.writer.patch_u32(HEADER_COUNT_OFFSET, self.count)?;
        self.writer.patch_u8(ARRAY_ELEMENT_TAG_OFFSET, element.as_u8())?;
        Ok(self.writer.flush())
    }
}

impl ObjectFrame {
    pub fn open(alloc_size: usize) -> Self {
        let mut writer = Writer::with_alloc_size(alloc_size.max(OBJECT_HEADER_SIZE));
        writer.u8u32(Tag::Object.as_u8(), 0);
        Self {
            writer,
            members: 0,
            pending_name: None,
        }
    }

    pub fn set_name(&mut self, name: &str) -> Result<(), SerialiseError> {
        if let Some(pending) = &self.pending_name {
            return Err(SerialiseError::DuplicateName {
                pending: pending.clone(),
                next: name.to_owned(),
            });
        }
        self.pending_name = Some(name.to_owned());
        Ok(())
    }

    /// Consumes the pending name for the member about to be written.
    pub fn take_name(&mut self) -> Result<String, SerialiseError> {
        let name = self.pending_name.take().ok_or(SerialiseError::MissingName)?;
        self.members = add_count(self.members, 1)?;
        Ok(name)
    }

    pub fn members(&self) -> u32 {
        self.members
    }

    pub fn close(mut self) -> Result<Vec<u8>, SerialiseError> {
        self.writer.patch_u32(HEADER_COUNT_OFFSET, self.members)?;
        Ok(self.writer.flush())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_array_closes_with_sentinel_element_tag() {
        let bytes = ArrayFrame::open(16).close().unwrap();
        assert_eq!(bytes, [11, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn array_records_first_tag_and_rejects_others() {
        let mut frame = ArrayFrame::open(16);
        frame.admit(Tag::U16, 2).unwrap();
        frame.writer.u16(1);
        frame.writer.u16(2);
        let err = frame.admit(Tag::U32, 1).unwrap_err();
        assert!(matches!(
            err,
            SerialiseError::TypeMismatch {
                expected: Tag::U16,
                found: Tag::U32
            }
        ));
        assert_eq!(frame.count(), 2);
        let bytes = frame.close().unwrap();
        assert_eq!(bytes, [11, 2, 0, 0, 0, 1, 1, 0, 2, 0]);
    }

    #[test]
    fn empty_run_does_not_fix_element_tag() {
        let mut frame = ArrayFrame::open(16);
        frame.admit(Tag::F64, 0).unwrap();
        frame.admit(Tag::I8, 1).unwrap();
        frame.writer.i8(-1);
        assert_eq!(frame.close().unwrap(), [11, 1, 0, 0, 0, 4, 0xff]);
    }

    #[test]
    fn object_name_protocol() {
        let mut frame = ObjectFrame::open(16);
        assert!(matches!(frame.take_name(), Err(SerialiseError::MissingName)));
        frame.set_name("a").unwrap();
        let err = frame.set_name("b").unwrap_err();
        assert!(matches!(
            err,
            SerialiseError::DuplicateName { ref pending, ref next } if pending == "a" && next == "b"
        ));
        assert_eq!(frame.take_name().unwrap(), "a");
        assert_eq!(frame.members(), 1);
        assert_eq!(frame.close().unwrap(), [12, 1, 0, 0, 0]);
    }

    #[test]
    fn element_count_past_u32_is_a_length_overflow() {
        let mut frame = ArrayFrame::open(16);
        frame.admit(Tag::U8, u32::MAX as usize).unwrap();
        assert_eq!(frame.count(), u32::MAX);
        let err = frame.admit(Tag::U8, 1).unwrap_err();
        assert!(matches!(
            err,
            SerialiseError::Protocol(ProtocolViolation::LengthOverflow { len })
                if len == u32::MAX as usize + 1
        ));
        assert_eq!(frame.count(), u32::MAX);
    }

    #[test]
    fn member_count_past_u32_is_a_length_overflow() {
        let mut frame = ObjectFrame::open(16);
        frame.members = u32::MAX;
        frame.set_name("last").unwrap();
        assert!(matches!(
            frame.take_name(),
            Err(SerialiseError::Protocol(ProtocolViolation::LengthOverflow { .. }))
        ));
        assert_eq!(frame.members(), u32::MAX);
    }

    #[test]
    fn header_fits_even_with_a_tiny_allocation() {
        let frame = ArrayFrame::open(1);
        assert_eq!(frame.writer.len(), ARRAY_HEADER_SIZE);
        let frame = ObjectFrame::open(0);
        assert_eq!(frame.writer.len(), OBJECT_HEADER_SIZE);
    }
}
