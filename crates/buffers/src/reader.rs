//! Bounds-checked byte reader with cursor tracking.

use std::str;

use crate::BufferError;

/// A little-endian byte reader over a borrowed slice.
///
/// Every read is bounds-checked and leaves the cursor untouched on error.
///
/// # Example
///
/// ```
/// use treepack_buffers::Reader;
///
/// let data = [0x01, 0x03, 0x02];
/// let mut reader = Reader::new(&data);
///
/// assert_eq!(reader.try_u8(), Ok(0x01));
/// assert_eq!(reader.try_u16(), Ok(0x0203));
/// ```
pub struct Reader<'a> {
    /// The underlying byte slice.
    pub uint8: &'a [u8],
    /// Current cursor position.
    pub x: usize,
}

impl<'a> Reader<'a> {
    pub fn new(uint8: &'a [u8]) -> Self {
        Self { uint8, x: 0 }
    }

    /// Resets the reader with a new byte slice.
    pub fn reset(&mut self, uint8: &'a [u8]) {
        self.uint8 = uint8;
        self.x = 0;
    }

    /// Returns the number of remaining bytes.
    pub fn size(&self) -> usize {
        self.uint8.len() - self.x
    }

    pub fn is_done(&self) -> bool {
        self.x >= self.uint8.len()
    }

    #[inline]
    fn check(&self, n: usize) -> Result<(), BufferError> {
        if self.x + n > self.uint8.len() {
            Err(BufferError::EndOfBuffer)
        } else {
            Ok(())
        }
    }

    #[inline]
    fn take<const N: usize>(&mut self) -> Result<[u8; N], BufferError> {
        self.check(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(&self.uint8[self.x..self.x + N]);
        self.x += N;
        Ok(out)
    }

    #[inline]
    pub fn try_u8(&mut self) -> Result<u8, BufferError> {
        Ok(self.take::<1>()?[0])
    }

    #[inline]
    pub fn try_i8(&mut self) -> Result<i8, BufferError> {
        Ok(self.take::<1>()?[0] as i8)
    }

    #[inline]
    pub fn try_u16(&mut self) -> Result<u16, BufferError> {
        self.take().map(u16::from_le_bytes)
    }

    #[inline]
    pub fn try_i16(&mut self) -> Result<i16, BufferError> {
        self.take().map(i16::from_le_bytes)
    }

    #[inline]
    pub fn try_u32(&mut self) -> Result<u32, BufferError> {
        self.take().map(u32::from_le_bytes)
    }

    #[inline]
    pub fn try_i32(&mut self) -> Result<i32, BufferError> {
        self.take().map(i32::from_le_bytes)
    }

    #[inline]
    pub fn try_u64(&mut self) -> Result<u64, BufferError> {
        self.take().map(u64::from_le_bytes)
    }

    #[inline]
    pub fn try_i64(&mut self) -> Result<i64, BufferError> {
        self.take().map(i64::from_le_bytes)
    }

    #[inline]
    pub fn try_f32(&mut self) -> Result<f32, BufferError> {
        self.take().map(f32::from_le_bytes)
    }

    #[inline]
    pub fn try_f64(&mut self) -> Result<f64, BufferError> {
        self.take().map(f64::from_le_bytes)
    }

    /// Reads `size` raw bytes and advances the cursor.
    pub fn try_buf(&mut self, size: usize) -> Result<&'a [u8], BufferError> {
        self.check(size)?;
        let bin = &self.uint8[self.x..self.x + size];
        self.x += size;
        Ok(bin)
    }

    /// Reads a UTF-8 string of `size` bytes.
    pub fn try_utf8(&mut self, size: usize) -> Result<&'a str, BufferError> {
        self.check(size)?;
        let s = str::from_utf8(&self.uint8[self.x..self.x + size])
            .map_err(|_| BufferError::InvalidUtf8)?;
        self.x += size;
        Ok(s)
    }
}
