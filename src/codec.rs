//! The device codec interface and decode outcomes.

use std::fmt;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{CodecError, DecodeError};
use crate::model::ParameterModel;
use crate::schema::Schema;

/// Coarse outcome of a decode, as reported to the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    /// A complete patch was decoded
    Success,
    /// The data is valid so far but more messages are needed
    Incomplete,
    /// Wrong length, header, version or checksum
    Failed,
    /// The caller has to choose a record before decoding can finish
    Cancelled,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Success => "success",
            Status::Incomplete => "incomplete",
            Status::Failed => "failed",
            Status::Cancelled => "needs selection",
        };
        f.write_str(s)
    }
}

/// One record inside a batch dump.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankRecord {
    /// Index to pass to [`Codec::decode_record`]
    pub index: usize,
    /// Display label, usually the device's patch number
    pub label: String,
}

/// What a batch dump contains, so the caller can pick a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankListing {
    /// Records in dump order
    pub records: Vec<BankRecord>,
    /// Footer values that apply to every record (e.g. MIDI channels)
    pub shared: Vec<(String, i32)>,
}

/// Result of [`Codec::decode`].
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// Fully decoded and revised patch
    Complete(ParameterModel),
    /// Valid partial data; feed the next message
    Incomplete,
    /// Batch dump; call [`Codec::decode_record`] with a chosen index
    NeedsSelection(BankListing),
    /// The data is not usable
    Failed(DecodeError),
}

impl Decoded {
    /// Tri-state status (plus `Cancelled` for selections).
    pub fn status(&self) -> Status {
        match self {
            Decoded::Complete(_) => Status::Success,
            Decoded::Incomplete => Status::Incomplete,
            Decoded::NeedsSelection(_) => Status::Cancelled,
            Decoded::Failed(_) => Status::Failed,
        }
    }

    /// The decoded model, if decoding completed.
    pub fn into_model(self) -> Option<ParameterModel> {
        match self {
            Decoded::Complete(model) => Some(model),
            _ => None,
        }
    }
}

impl From<Result<ParameterModel, DecodeError>> for Decoded {
    fn from(result: Result<ParameterModel, DecodeError>) -> Self {
        match result {
            Ok(model) => Decoded::Complete(model),
            Err(e) => {
                warn!("decode failed: {}", e);
                Decoded::Failed(e)
            }
        }
    }
}

/// A device's sysex format.
///
/// Implementations are stateless apart from fixed configuration, so one
/// codec value can serve any number of models.
pub trait Codec {
    /// Device display name.
    fn name(&self) -> &'static str;

    /// Keys, bounds and defaults of this device's patches.
    fn schema(&self) -> &Schema;

    /// Whether `data` has the exact length and header of one of this
    /// device's frame shapes. Never panics, whatever the input.
    fn recognize(&self, data: &[u8]) -> bool;

    /// Decode a whole frame into a fresh, revised model.
    fn decode(&self, data: &[u8]) -> Decoded;

    /// Decode record `index` of a batch frame.
    fn decode_record(&self, _data: &[u8], _index: usize) -> Decoded {
        Decoded::Failed(DecodeError::NotABank)
    }

    /// Emit a single-patch frame for `model`.
    fn encode(&self, model: &ParameterModel) -> Result<Vec<u8>, CodecError>;

    /// Messages that set `key` on the device live, on MIDI `channel` (0-15).
    fn parameter_messages(
        &self,
        _model: &ParameterModel,
        _key: &str,
        _channel: u8,
    ) -> Result<Vec<Vec<u8>>, CodecError> {
        Ok(Vec::new())
    }

    /// A model with every key at its default.
    fn defaults(&self) -> ParameterModel {
        self.schema().defaults()
    }
}
