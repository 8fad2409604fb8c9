//! Growable byte writer with in-place patching.

use crate::BufferError;

/// A little-endian byte writer that grows automatically as needed.
///
/// Bytes between the flush position `x0` and the cursor `x` form the
/// pending region. [`Writer::patch_u8`] and [`Writer::patch_u32`] address
/// that region by offset from `x0`, so previously written placeholder fields
/// can be rewritten once their real values are known.
///
/// # Example
///
/// ```
/// use treepack_buffers::Writer;
///
/// let mut writer = Writer::new();
/// writer.u8(0x01);
/// writer.u16(0x0203);
/// let data = writer.flush();
/// assert_eq!(data, [0x01, 0x03, 0x02]);
/// ```
pub struct Writer {
    /// The underlying byte buffer.
    pub uint8: Vec<u8>,
    /// Position where last flush happened.
    pub x0: usize,
    /// Current cursor position.
    pub x: usize,
    /// Allocation size when buffer needs to grow.
    alloc_size: usize,
}

impl Default for Writer {
    fn default() -> Self {
        Self::new()
    }
}

impl Writer {
    /// Creates a new writer with default allocation size (64KB).
    pub fn new() -> Self {
        Self::with_alloc_size(64 * 1024)
    }

    /// Creates a new writer with custom allocation size.
    pub fn with_alloc_size(alloc_size: usize) -> Self {
        let alloc_size = alloc_size.max(1);
        Self {
            uint8: vec![0u8; alloc_size],
            x0: 0,
            x: 0,
            alloc_size,
        }
    }

    /// Ensures the buffer has at least `capacity` bytes available.
    pub fn ensure_capacity(&mut self, capacity: usize) {
        let remaining = self.uint8.len() - self.x;
        if remaining < capacity {
            let total = self.uint8.len() - self.x0;
            let total_required = total + capacity - remaining;
            let new_size = if total_required <= self.alloc_size {
                self.alloc_size
            } else {
                total_required * 2
            };
            self.grow(new_size);
        }
    }

    fn grow(&mut self, new_size: usize) {
        let len = self.x - self.x0;
        let mut new_buf = vec![0u8; new_size];
        new_buf[..len].copy_from_slice(&self.uint8[self.x0..self.x]);
        self.uint8 = new_buf;
        self.x = len;
        self.x0 = 0;
    }

    /// Number of pending (written but not flushed) bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.x - self.x0
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.x == self.x0
    }

    /// Discards the pending region.
    pub fn reset(&mut self) {
        self.x = self.x0;
    }

    /// Borrows the pending region without flushing it.
    pub fn written(&self) -> &[u8] {
        &self.uint8[self.x0..self.x]
    }

    /// Returns the pending region and advances the flush position.
    pub fn flush(&mut self) -> Vec<u8> {
        let result = self.uint8[self.x0..self.x].to_vec();
        self.x0 = self.x;
        result
    }

    #[inline]
    pub fn u8(&mut self, val: u8) {
        self.ensure_capacity(1);
        self.uint8[self.x] = val;
        self.x += 1;
    }

    #[inline]
    pub fn i8(&mut self, val: i8) {
        self.u8(val as u8);
    }

    #[inline]
    pub fn u16(&mut self, val: u16) {
        self.put(&val.to_le_bytes());
    }

    #[inline]
    pub fn i16(&mut self, val: i16) {
        self.put(&val.to_le_bytes());
    }

    #[inline]
    pub fn u32(&mut self, val: u32) {
        self.put(&val.to_le_bytes());
    }

    #[inline]
    pub fn i32(&mut self, val: i32) {
        self.put(&val.to_le_bytes());
    }

    #[inline]
    pub fn u64(&mut self, val: u64) {
        self.put(&val.to_le_bytes());
    }

    #[inline]
    pub fn i64(&mut self, val: i64) {
        self.put(&val.to_le_bytes());
    }

    #[inline]
    pub fn f32(&mut self, val: f32) {
        self.put(&val.to_le_bytes());
    }

    #[inline]
    pub fn f64(&mut self, val: f64) {
        self.put(&val.to_le_bytes());
    }

    /// Writes a u8 followed by a u32.
    pub fn u8u32(&mut self, u8_val: u8, u32_val: u32) {
        self.ensure_capacity(5);
        self.uint8[self.x] = u8_val;
        self.uint8[self.x + 1..self.x + 5].copy_from_slice(&u32_val.to_le_bytes());
        self.x += 5;
    }

    /// Writes a byte slice.
    pub fn buf(&mut self, buf: &[u8]) {
        self.put(buf);
    }

    /// Writes the raw UTF-8 bytes of `s`. Returns the number of bytes written.
    pub fn utf8(&mut self, s: &str) -> usize {
        self.put(s.as_bytes());
        s.len()
    }

    #[inline]
    fn put(&mut self, bytes: &[u8]) {
        let length = bytes.len();
        self.ensure_capacity(length);
        self.uint8[self.x..self.x + length].copy_from_slice(bytes);
        self.x += length;
    }

    /// Overwrites the byte at `offset` within the pending region.
    pub fn patch_u8(&mut self, offset: usize, val: u8) -> Result<(), BufferError> {
        if offset + 1 > self.len() {
            return Err(BufferError::EndOfBuffer);
        }
        self.uint8[self.x0 + offset] = val;
        Ok(())
    }

    /// Overwrites four bytes at `offset` within the pending region.
    pub fn patch_u32(&mut self, offset: usize, val: u32) -> Result<(), BufferError> {
        if offset + 4 > self.len() {
            return Err(BufferError::EndOfBuffer);
        }
        let at = self.x0 + offset;
        self.uint8[at..at + 4].copy_from_slice(&val.to_le_bytes());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_u8() {
        let mut writer = Writer::new();
        writer.u8(0x01);
        writer.u8(0x02);
        assert_eq!(writer.flush(), [0x01, 0x02]);
    }

    #[test]
    fn test_u16_is_little_endian() {
        let mut writer = Writer::new();
        writer.u16(0x0102);
        assert_eq!(writer.flush(), [0x02, 0x01]);
    }

    #[test]
    fn test_u32_is_little_endian() {
        let mut writer = Writer::new();
        writer.u32(0x01020304);
        assert_eq!(writer.flush(), [0x04, 0x03, 0x02, 0x01]);
    }

    #[test]
    fn test_signed_and_float_layouts() {
        let mut writer = Writer::new();
        writer.i8(-2);
        writer.i16(-1000);
        writer.i64(-9_999_999_999);
        writer.f32(1.5);
        let data = writer.flush();
        assert_eq!(data[0], 0xfe);
        assert_eq!(i16::from_le_bytes([data[1], data[2]]), -1000);
        assert_eq!(
            i64::from_le_bytes(data[3..11].try_into().unwrap()),
            -9_999_999_999
        );
        assert_eq!(f32::from_le_bytes(data[11..15].try_into().unwrap()), 1.5);
    }

    #[test]
    fn test_utf8() {
        let mut writer = Writer::new();
        assert_eq!(writer.utf8("café"), 5);
        assert_eq!(writer.flush(), "café".as_bytes());
    }

    #[test]
    fn test_flush_multiple() {
        let mut writer = Writer::new();
        writer.u8(0x01);
        assert_eq!(writer.flush(), [0x01]);
        writer.u8(0x02);
        assert_eq!(writer.flush(), [0x02]);
    }

    #[test]
    fn test_reset_discards_pending() {
        let mut writer = Writer::new();
        writer.u32(7);
        writer.reset();
        assert!(writer.is_empty());
        writer.u8(9);
        assert_eq!(writer.written(), [9]);
    }

    #[test]
    fn test_grows_past_alloc_size() {
        let mut writer = Writer::with_alloc_size(4);
        for i in 0..100u8 {
            writer.u8(i);
        }
        let data = writer.flush();
        assert_eq!(data.len(), 100);
        assert_eq!(data[99], 99);
    }

    #[test]
    fn test_patch_after_growth() {
        let mut writer = Writer::with_alloc_size(8);
        writer.u8u32(0xaa, 0);
        writer.buf(&[1u8; 64]);
        writer.patch_u32(1, 0x0a0b0c0d).unwrap();
        writer.patch_u8(0, 0xbb).unwrap();
        let data = writer.flush();
        assert_eq!(&data[..5], &[0xbb, 0x0d, 0x0c, 0x0b, 0x0a]);
        assert_eq!(data.len(), 69);
    }

    #[test]
    fn test_patch_is_relative_to_flush_position() {
        let mut writer = Writer::new();
        writer.u8(1);
        writer.flush();
        writer.u32(0);
        writer.patch_u32(0, 5).unwrap();
        assert_eq!(writer.written(), [5, 0, 0, 0]);
    }

    #[test]
    fn test_patch_out_of_bounds() {
        let mut writer = Writer::new();
        writer.u8(1);
        assert_eq!(writer.patch_u32(0, 1), Err(BufferError::EndOfBuffer));
        assert_eq!(writer.patch_u8(1, 1), Err(BufferError::EndOfBuffer));
    }
}
