//! Streaming push encoder for a self-describing binary tree format.
//!
//! Values are emitted one call at a time through the [`Serialiser`] trait.
//! [`TreeEncoder`] checks every call against the innermost open container and
//! writes each container's header only once its real size and element type
//! are known, so a document is produced in a single forward pass.
//!
//! Wire grammar (all integers little-endian):
//!
//! - numeric scalar: raw fixed-width bytes, no tag
//! - string: `[len: u32][utf-8 bytes]`
//! - array: `[11: u8][count: u32][element tag: u8]` then `count` elements
//! - object: `[12: u8][count: u32]` then `count` × `[name: string][value]`
//!
//! ```
//! use treepack::{decode, Serialiser, TreeEncoder, TreeSchema, TreeValue};
//!
//! let mut enc = TreeEncoder::new(Vec::new());
//! enc.start_object()?;
//! enc.write_member("id", 42u64)?;
//! enc.set_next_member_name("scores")?;
//! enc.start_array()?;
//! enc.write_f32_run(&[0.5, 0.25])?;
//! enc.end_array()?;
//! enc.end_object()?;
//! let bytes = enc.finish()?;
//!
//! let schema = TreeSchema::object([
//!     ("id", TreeSchema::U64),
//!     ("scores", TreeSchema::array(TreeSchema::F32)),
//! ]);
//! let value = decode(&bytes, &schema)?;
//! assert_eq!(
//!     value,
//!     TreeValue::Object(vec![
//!         ("id".into(), TreeValue::U64(42)),
//!         ("scores".into(), TreeValue::Array(vec![0.5f32.into(), 0.25f32.into()])),
//!     ])
//! );
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod constants;
mod decoder;
mod encoder;
mod error;
mod frame;
mod options;
mod schema;
mod serialiser;
mod value;

pub use constants::{Tag, ARRAY_HEADER_SIZE, OBJECT_HEADER_SIZE, STRING_LENGTH_SIZE};
pub use decoder::{decode, decode_many, TreeDecoder};
pub use encoder::{EncoderState, TreeEncoder};
pub use error::{DecodeError, ProtocolViolation, SerialiseError};
pub use options::EncoderOptions;
pub use schema::TreeSchema;
pub use serialiser::{Scalar, Serialiser};
pub use value::TreeValue;

/// Encodes a whole value tree into a fresh buffer.
pub fn encode(value: &TreeValue) -> Result<Vec<u8>, SerialiseError> {
    let mut enc = TreeEncoder::new(Vec::new());
    value.write_to(&mut enc)?;
    enc.finish()
}
