//! `TreeEncoder`: the stateful single-pass tree encoder.
//!
//! Each open array or object owns a [`Writer`] that starts with a
//! placeholder header. When the container ends, the header's count (and, for
//! arrays, element tag) is backpatched and the finished bytes are committed
//! one level up: into the enclosing frame, or straight to the sink once no
//! frame is open. Memory therefore stays bounded by the containers that are
//! open at the same time.
//!
//! Byte order is little-endian throughout.

use std::io::Write;

use log::{debug, trace, warn};
use treepack_buffers::Writer;

use crate::constants::Tag;
use crate::error::{ProtocolViolation, SerialiseError};
use crate::frame::{ArrayFrame, Frame, ObjectFrame};
use crate::options::EncoderOptions;
use crate::serialiser::{Scalar, Serialiser};

/// Where the next emitted value will land.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncoderState {
    TopLevel,
    InArray,
    InObject,
}

/// Push encoder writing finished top-level values to `W`.
///
/// ```
/// use treepack::{Serialiser, TreeEncoder};
///
/// let mut enc = TreeEncoder::new(Vec::new());
/// enc.start_object()?;
/// enc.write_member("a", 7u32)?;
/// enc.end_object()?;
/// let bytes = enc.finish()?;
/// assert_eq!(bytes, [12, 1, 0, 0, 0, 1, 0, 0, 0, b'a', 7, 0, 0, 0]);
/// # Ok::<(), treepack::SerialiseError>(())
/// ```
pub struct TreeEncoder<W: Write> {
    pipe: Option<W>,
    frames: Vec<Frame>,
    options: EncoderOptions,
    poisoned: bool,
}

impl<W: Write> TreeEncoder<W> {
    pub fn new(pipe: W) -> Self {
        Self::with_options(pipe, EncoderOptions::default())
    }

    pub fn with_options(pipe: W, options: EncoderOptions) -> Self {
        Self {
            pipe: Some(pipe),
            frames: Vec::new(),
            options,
            poisoned: false,
        }
    }

    pub fn options(&self) -> &EncoderOptions {
        &self.options
    }

    /// Number of open containers.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn state(&self) -> EncoderState {
        match self.frames.last() {
            None => EncoderState::TopLevel,
            Some(Frame::Array(_)) => EncoderState::InArray,
            Some(Frame::Object(_)) => EncoderState::InObject,
        }
    }

    /// `true` when no container is open and no earlier call failed.
    pub fn is_complete(&self) -> bool {
        self.frames.is_empty() && !self.poisoned
    }

    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    pub fn get_ref(&self) -> Option<&W> {
        self.pipe.as_ref()
    }

    /// Ends the document: fails if containers are still open, otherwise
    /// flushes the sink and hands it back.
    pub fn finish(mut self) -> Result<W, SerialiseError> {
        self.guarded(|enc| {
            if !enc.frames.is_empty() {
                return Err(SerialiseError::IncompleteDocument {
                    open: enc.frames.len(),
                });
            }
            enc.pipe()?.flush()?;
            Ok(())
        })?;
        debug!("document finished");
        self.pipe.take().ok_or(SerialiseError::Poisoned)
    }

    /// Runs `op` unless the encoder is already poisoned; poisons it on error.
    fn guarded<T>(
        &mut self,
        op: impl FnOnce(&mut Self) -> Result<T, SerialiseError>,
    ) -> Result<T, SerialiseError> {
        if self.poisoned {
            return Err(SerialiseError::Poisoned);
        }
        let result = op(self);
        if let Err(err) = &result {
            trace!("encoder poisoned: {err}");
            self.poisoned = true;
        }
        result
    }

    fn pipe(&mut self) -> Result<&mut W, SerialiseError> {
        self.pipe.as_mut().ok_or(SerialiseError::Poisoned)
    }

    /// Appends one value (or a run of `count` array elements) of kind `tag`
    /// to wherever the encoder currently points. `put` writes the value's
    /// bytes once all checks have passed. An empty run writes nothing
    /// anywhere.
    fn commit_value(
        &mut self,
        tag: Tag,
        count: usize,
        put: impl FnOnce(&mut Writer),
    ) -> Result<(), SerialiseError> {
        if count == 0 {
            return Ok(());
        }
        match self.frames.last_mut() {
            None => {
                if count > 1 {
                    return Err(ProtocolViolation::RunOutsideArray { count }.into());
                }
                let width = tag.width().unwrap_or(self.options.frame_alloc_size);
                let mut staged = Writer::with_alloc_size(width);
                put(&mut staged);
                self.write_through(tag, staged.written())?;
            }
            Some(Frame::Array(frame)) => {
                frame.admit(tag, count)?;
                put(&mut frame.writer);
            }
            Some(Frame::Object(frame)) => {
                if count > 1 {
                    return Err(ProtocolViolation::RunInsideObject { count }.into());
                }
                let name = frame.take_name()?;
                put_str(&mut frame.writer, &name);
                put(&mut frame.writer);
            }
        }
        Ok(())
    }

    /// Commits the finished bytes of a closed container. With no frame left
    /// open they go to the sink as they are.
    fn commit_container(&mut self, tag: Tag, bytes: Vec<u8>) -> Result<(), SerialiseError> {
        if self.frames.is_empty() {
            return self.write_through(tag, &bytes);
        }
        self.commit_value(tag, 1, |w| w.buf(&bytes))
    }

    fn write_through(&mut self, tag: Tag, bytes: &[u8]) -> Result<(), SerialiseError> {
        trace!("commit {tag} ({} bytes) to sink", bytes.len());
        self.pipe()?.write_all(bytes)?;
        Ok(())
    }

    fn commit_scalar<V: Scalar>(&mut self, value: V) -> Result<(), SerialiseError> {
        self.guarded(|enc| enc.commit_value(V::TAG, 1, |w| value.put(w)))
    }

    fn commit_run<V: Scalar>(&mut self, values: &[V]) -> Result<(), SerialiseError> {
        self.guarded(|enc| {
            enc.commit_value(V::TAG, values.len(), |w| {
                values.iter().for_each(|v| v.put(w))
            })
        })
    }

    fn push_frame(&mut self, frame: Frame) -> Result<(), SerialiseError> {
        if let Some(limit) = self.options.max_depth {
            if self.frames.len() >= limit {
                return Err(ProtocolViolation::DepthExceeded { limit }.into());
            }
        }
        trace!("open {} at depth {}", frame.tag(), self.frames.len());
        self.frames.push(frame);
        Ok(())
    }

    /// Pops the innermost frame, which must be of kind `closing`.
    fn pop_frame(&mut self, closing: Tag) -> Result<Frame, SerialiseError> {
        match self.frames.last().map(Frame::tag) {
            None => Err(ProtocolViolation::NothingOpen { closing }.into()),
            Some(open) if open != closing => {
                Err(ProtocolViolation::KindMismatch { closing, open }.into())
            }
            Some(_) => self
                .frames
                .pop()
                .ok_or_else(|| ProtocolViolation::NothingOpen { closing }.into()),
        }
    }
}

/// Writes `[len: u32][bytes]`. Callers check the length beforehand.
fn put_str(writer: &mut Writer, s: &str) {
    writer.u32(s.len() as u32);
    writer.utf8(s);
}

fn check_str_len(s: &str) -> Result<(), SerialiseError> {
    if u32::try_from(s.len()).is_err() {
        return Err(ProtocolViolation::LengthOverflow { len: s.len() }.into());
    }
    Ok(())
}

impl<W: Write> Serialiser for TreeEncoder<W> {
    type Error = SerialiseError;

    fn write_u8(&mut self, value: u8) -> Result<(), SerialiseError> {
        self.commit_scalar(value)
    }

    fn write_u16(&mut self, value: u16) -> Result<(), SerialiseError> {
        self.commit_scalar(value)
    }

    fn write_u32(&mut self, value: u32) -> Result<(), SerialiseError> {
        self.commit_scalar(value)
    }

    fn write_u64(&mut self, value: u64) -> Result<(), SerialiseError> {
        self.commit_scalar(value)
    }

    fn write_i8(&mut self, value: i8) -> Result<(), SerialiseError> {
        self.commit_scalar(value)
    }

    fn write_i16(&mut self, value: i16) -> Result<(), SerialiseError> {
        self.commit_scalar(value)
    }

    fn write_i32(&mut self, value: i32) -> Result<(), SerialiseError> {
        self.commit_scalar(value)
    }

    fn write_i64(&mut self, value: i64) -> Result<(), SerialiseError> {
        self.commit_scalar(value)
    }

    fn write_f32(&mut self, value: f32) -> Result<(), SerialiseError> {
        self.commit_scalar(value)
    }

    fn write_f64(&mut self, value: f64) -> Result<(), SerialiseError> {
        self.commit_scalar(value)
    }

    fn write_str(&mut self, value: &str) -> Result<(), SerialiseError> {
        self.guarded(|enc| {
            check_str_len(value)?;
            enc.commit_value(Tag::Str, 1, |w| put_str(w, value))
        })
    }

    fn start_array(&mut self) -> Result<(), SerialiseError> {
        self.guarded(|enc| {
            let frame = ArrayFrame::open(enc.options.frame_alloc_size);
            enc.push_frame(Frame::Array(frame))
        })
    }

    fn end_array(&mut self) -> Result<(), SerialiseError> {
        self.guarded(|enc| {
            let Frame::Array(frame) = enc.pop_frame(Tag::Array)? else {
                return Err(ProtocolViolation::NothingOpen { closing: Tag::Array }.into());
            };
            trace!("close array of {} at depth {}", frame.count(), enc.frames.len());
            let bytes = frame.close()?;
            enc.commit_container(Tag::Array, bytes)
        })
    }

    fn start_object(&mut self) -> Result<(), SerialiseError> {
        self.guarded(|enc| {
            let frame = ObjectFrame::open(enc.options.frame_alloc_size);
            enc.push_frame(Frame::Object(frame))
        })
    }

    fn end_object(&mut self) -> Result<(), SerialiseError> {
        self.guarded(|enc| {
            let Frame::Object(frame) = enc.pop_frame(Tag::Object)? else {
                return Err(ProtocolViolation::NothingOpen { closing: Tag::Object }.into());
            };
            trace!("close object of {} at depth {}", frame.members(), enc.frames.len());
            let bytes = frame.close()?;
            enc.commit_container(Tag::Object, bytes)
        })
    }

    fn set_next_member_name(&mut self, name: &str) -> Result<(), SerialiseError> {
        self.guarded(|enc| {
            check_str_len(name)?;
            match enc.frames.last_mut() {
                Some(Frame::Object(frame)) => frame.set_name(name),
                _ => Err(ProtocolViolation::NameOutsideObject.into()),
            }
        })
    }

    fn write_u8_run(&mut self, values: &[u8]) -> Result<(), SerialiseError> {
        self.guarded(|enc| enc.commit_value(Tag::U8, values.len(), |w| w.buf(values)))
    }

    fn write_u16_run(&mut self, values: &[u16]) -> Result<(), SerialiseError> {
        self.commit_run(values)
    }

    fn write_u32_run(&mut self, values: &[u32]) -> Result<(), SerialiseError> {
        self.commit_run(values)
    }

    fn write_u64_run(&mut self, values: &[u64]) -> Result<(), SerialiseError> {
        self.commit_run(values)
    }

    fn write_i8_run(&mut self, values: &[i8]) -> Result<(), SerialiseError> {
        self.commit_run(values)
    }

    fn write_i16_run(&mut self, values: &[i16]) -> Result<(), SerialiseError> {
        self.commit_run(values)
    }

    fn write_i32_run(&mut self, values: &[i32]) -> Result<(), SerialiseError> {
        self.commit_run(values)
    }

    fn write_i64_run(&mut self, values: &[i64]) -> Result<(), SerialiseError> {
        self.commit_run(values)
    }

    fn write_f32_run(&mut self, values: &[f32]) -> Result<(), SerialiseError> {
        self.commit_run(values)
    }

    fn write_f64_run(&mut self, values: &[f64]) -> Result<(), SerialiseError> {
        self.commit_run(values)
    }
}

impl<W: Write> Drop for TreeEncoder<W> {
    fn drop(&mut self) {
        let Some(pipe) = self.pipe.as_mut() else {
            return;
        };
        if !self.frames.is_empty() {
            warn!(
                "encoder dropped with {} container(s) still open; document is incomplete",
                self.frames.len()
            );
        }
        if let Err(err) = pipe.flush() {
            warn!("failed to flush sink on drop: {err}");
        }
    }
}
