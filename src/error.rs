//! Error types for models, codec tables and decoding.

use thiserror::Error;

/// Errors raised when a [`ParameterModel`](crate::model::ParameterModel) is
/// accessed with a key or value kind its schema does not define.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// The key was never declared by the device's schema.
    #[error("parameter '{0}' is not defined")]
    Undefined(String),

    /// The key exists but holds the other kind of value.
    #[error("parameter '{key}' is not {expected}")]
    WrongKind {
        /// Offending key
        key: String,
        /// "an integer" or "text"
        expected: &'static str,
    },
}

/// Schema or field-table inconsistencies.
///
/// These are programming errors in a device definition, never the result of
/// bad wire data, so callers should treat them as fatal for the operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// A field table or encoder touched a key missing from the model.
    #[error("{device}: {source}")]
    Model {
        /// Device whose table referenced the key
        device: &'static str,
        /// Underlying model error naming the key
        #[source]
        source: ModelError,
    },

    /// A field was declared past the end of the payload it belongs to.
    #[error("field '{key}' needs bytes up to {end} but the payload is {len} bytes")]
    FieldOutOfBounds {
        /// Offending key
        key: String,
        /// One past the last byte the field touches
        end: usize,
        /// Payload length
        len: usize,
    },

    /// A batch encode was given the wrong number of records.
    #[error("expected {expected} records, got {found}")]
    RecordCount {
        /// Records the frame holds
        expected: usize,
        /// Records supplied
        found: usize,
    },
}

/// Reasons a received buffer could not be decoded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Buffer length does not match any frame shape of the device.
    #[error("expected {expected} bytes, got {found}")]
    WrongLength {
        /// Length of the frame shape that was tried
        expected: usize,
        /// Length of the buffer
        found: usize,
    },

    /// Leading bytes do not carry the device signature.
    #[error("header does not match {0}")]
    BadHeader(&'static str),

    /// The frame declares a format version this crate does not know.
    #[error("unsupported format version {0}")]
    UnsupportedVersion(u8),

    /// Checksum byte disagrees with the payload.
    #[error("checksum mismatch: computed {computed:#04x}, frame carries {found:#04x}")]
    ChecksumMismatch {
        /// Checksum computed over the payload
        computed: u8,
        /// Checksum byte found in the frame
        found: u8,
    },

    /// A record was requested from a frame that is not a batch dump.
    #[error("not a batch dump")]
    NotABank,

    /// Requested record index is past the end of the batch.
    #[error("record {index} requested but the batch holds {count}")]
    RecordOutOfRange {
        /// Requested index (0-based)
        index: usize,
        /// Records in the batch
        count: usize,
    },

    /// The device tables themselves are inconsistent.
    #[error(transparent)]
    Codec(#[from] CodecError),
}
