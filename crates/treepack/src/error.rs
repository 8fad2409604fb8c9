//! Encoder and decoder error types.

use std::io;

use thiserror::Error;
use treepack_buffers::BufferError;

use crate::constants::Tag;

/// Structural misuse of the start/end/name protocol.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolViolation {
    #[error("{closing} closed with no open container")]
    NothingOpen { closing: Tag },
    #[error("{closing} closed while the innermost open container is an {open}")]
    KindMismatch { closing: Tag, open: Tag },
    #[error("member name set outside of an object")]
    NameOutsideObject,
    #[error("run of {count} values emitted with no enclosing array")]
    RunOutsideArray { count: usize },
    #[error("run of {count} values emitted as a single object member")]
    RunInsideObject { count: usize },
    #[error("nesting depth limit of {limit} exceeded")]
    DepthExceeded { limit: usize },
    #[error("length {len} does not fit the 32-bit length field")]
    LengthOverflow { len: usize },
}

/// Error raised by [`crate::TreeEncoder`]. Every variant leaves the encoder
/// unusable; later calls fail with [`SerialiseError::Poisoned`].
#[derive(Debug, Error)]
pub enum SerialiseError {
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolViolation),
    #[error("array element of type {found} does not match earlier elements of type {expected}")]
    TypeMismatch { expected: Tag, found: Tag },
    #[error("object member value emitted without a member name")]
    MissingName,
    #[error("member name {next:?} set while {pending:?} is still pending")]
    DuplicateName { pending: String, next: String },
    #[error("document finished with {open} container(s) still open")]
    IncompleteDocument { open: usize },
    #[error("frame buffer error: {0}")]
    Buffer(#[from] BufferError),
    #[error("sink error: {0}")]
    Sink(#[from] io::Error),
    #[error("encoder is unusable after an earlier error")]
    Poisoned,
}

/// Error raised by [`crate::TreeDecoder`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("unexpected end of input")]
    EndOfInput,
    #[error("invalid UTF-8")]
    InvalidUtf8,
    #[error("unknown type tag 0x{0:02x}")]
    UnknownTag(u8),
    #[error("expected {expected} but found {found}")]
    UnexpectedTag { expected: Tag, found: Tag },
    #[error("object member {0:?} is not part of the schema")]
    UnknownMember(String),
    #[error("{0} trailing byte(s) after the value")]
    TrailingBytes(usize),
}

impl From<BufferError> for DecodeError {
    fn from(err: BufferError) -> Self {
        match err {
            BufferError::EndOfBuffer => DecodeError::EndOfInput,
            BufferError::InvalidUtf8 => DecodeError::InvalidUtf8,
        }
    }
}
