//! Bit-exact sysex codecs for synthesizer patch editors.
//!
//! Each supported device is a [`Codec`]: it recognizes the device's frames,
//! decodes them into a [`ParameterModel`] and encodes models back into
//! byte-identical frames. Devices describe their payloads as declarative
//! [`field::Layout`] tables over the shared transforms in [`packing`].

#![warn(missing_docs)]

pub mod checksum;
pub mod codec;
pub mod devices;
pub mod error;
pub mod field;
pub mod midi;
pub mod model;
pub mod packing;
pub mod schema;
pub mod syx;

pub use codec::{BankListing, BankRecord, Codec, Decoded, Status};
pub use error::{CodecError, DecodeError, ModelError};
pub use model::{ParameterModel, Value};
pub use schema::Schema;
