//! Encoder configuration.

/// Tuning knobs for [`crate::TreeEncoder`].
///
/// ```
/// use treepack::EncoderOptions;
///
/// let options = EncoderOptions::default()
///     .with_frame_alloc_size(4096)
///     .with_max_depth(32);
/// assert_eq!(options.max_depth, Some(32));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderOptions {
    /// Initial byte allocation of each open container's buffer.
    pub frame_alloc_size: usize,
    /// Maximum number of simultaneously open containers, unlimited if `None`.
    pub max_depth: Option<usize>,
}

impl Default for EncoderOptions {
    fn default() -> Self {
        Self {
            frame_alloc_size: 256,
            max_depth: None,
        }
    }
}

impl EncoderOptions {
    pub fn with_frame_alloc_size(mut self, size: usize) -> Self {
        self.frame_alloc_size = size;
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }
}
