//! Declarative field tables and the generic encoder/decoder that walks them.
//!
//! A [`Layout`] describes one payload region (the bytes between a frame's
//! header and its checksum/terminator, after any nibble expansion has been
//! undone). Each [`FieldSpec`] names the model key it carries, where it sits
//! and how the value is transformed on the way in and out.

use log::{debug, error, warn};

use crate::error::CodecError;
use crate::model::ParameterModel;
use crate::packing::{self, BitSlice};
use crate::schema::{ParamKind, Schema};

/// Wire transform of a single field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Encoding {
    /// One byte holding the value as-is
    Byte,
    /// Two 7-bit bytes, MSB first
    Wide14,
    /// Bit 7 holds the key named by `flag`, bits 0-6 hold the value
    Flagged {
        /// Key of the 1-bit flag sharing the byte
        flag: String,
    },
    /// Value scattered over bit slices, low bits first. Slice byte indices
    /// are relative to the field offset.
    Bits(Vec<BitSlice>),
    /// Boolean written as `on` or zero; any nonzero byte reads back as 1
    Flag {
        /// Byte written when the value is nonzero
        on: u8,
    },
    /// Space-padded ASCII of exactly `width` bytes
    Text {
        /// Field width
        width: usize,
    },
}

/// Substitution for codes outside a field's enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fallback {
    /// Highest legal code
    pub limit: i32,
    /// Code used in place of anything above `limit`
    pub value: i32,
}

/// Placement and transform of one parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    /// Model key
    pub key: String,
    /// Byte offset within the payload
    pub offset: usize,
    /// Wire transform
    pub encoding: Encoding,
    /// Decode-time substitution for invalid codes
    pub fallback: Option<Fallback>,
}

impl FieldSpec {
    fn new(key: impl Into<String>, offset: usize, encoding: Encoding) -> Self {
        Self {
            key: key.into(),
            offset,
            encoding,
            fallback: None,
        }
    }

    /// Plain byte.
    pub fn byte(key: impl Into<String>, offset: usize) -> Self {
        Self::new(key, offset, Encoding::Byte)
    }

    /// 14-bit value as an MSB/LSB pair.
    pub fn wide(key: impl Into<String>, offset: usize) -> Self {
        Self::new(key, offset, Encoding::Wide14)
    }

    /// 7-bit value plus a 1-bit flag in the same byte.
    pub fn flagged(key: impl Into<String>, flag: impl Into<String>, offset: usize) -> Self {
        Self::new(key, offset, Encoding::Flagged { flag: flag.into() })
    }

    /// Sub-byte field, possibly straddling bytes.
    pub fn bits(key: impl Into<String>, offset: usize, slices: &[BitSlice]) -> Self {
        Self::new(key, offset, Encoding::Bits(slices.to_vec()))
    }

    /// Boolean stored as `on`/0.
    pub fn flag(key: impl Into<String>, offset: usize, on: u8) -> Self {
        Self::new(key, offset, Encoding::Flag { on })
    }

    /// Fixed-width name.
    pub fn text(key: impl Into<String>, offset: usize, width: usize) -> Self {
        Self::new(key, offset, Encoding::Text { width })
    }

    /// Decode codes above `limit` as `value`.
    pub fn or_fallback(mut self, limit: i32, value: i32) -> Self {
        self.fallback = Some(Fallback { limit, value });
        self
    }

    /// Number of payload bytes, counted from `offset`, the field touches.
    pub fn span(&self) -> usize {
        match &self.encoding {
            Encoding::Byte | Encoding::Flagged { .. } | Encoding::Flag { .. } => 1,
            Encoding::Wide14 => 2,
            Encoding::Bits(slices) => slices.iter().map(|s| s.byte + 1).max().unwrap_or(0),
            Encoding::Text { width } => *width,
        }
    }

    /// Keys this field reads on encode and writes on decode.
    pub fn keys(&self) -> Vec<&str> {
        match &self.encoding {
            Encoding::Flagged { flag } => vec![self.key.as_str(), flag.as_str()],
            _ => vec![self.key.as_str()],
        }
    }
}

/// Field table for one payload region.
#[derive(Debug, Clone)]
pub struct Layout {
    device: &'static str,
    len: usize,
    fields: Vec<FieldSpec>,
}

impl Layout {
    /// Empty table for a payload of `len` bytes.
    pub fn new(device: &'static str, len: usize) -> Self {
        Self {
            device,
            len,
            fields: Vec::new(),
        }
    }

    /// Append a field.
    pub fn push(&mut self, field: FieldSpec) -> &mut Self {
        self.fields.push(field);
        self
    }

    /// Append every field from `fields`.
    pub fn extend(&mut self, fields: impl IntoIterator<Item = FieldSpec>) -> &mut Self {
        self.fields.extend(fields);
        self
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the table declares no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The declared fields, in table order.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    fn model_error(&self, source: crate::error::ModelError) -> CodecError {
        CodecError::Model {
            device: self.device,
            source,
        }
    }

    fn check_span(&self, field: &FieldSpec, len: usize) -> Result<(), CodecError> {
        let end = field.offset + field.span();
        if end > len {
            return Err(CodecError::FieldOutOfBounds {
                key: field.key.clone(),
                end,
                len,
            });
        }
        Ok(())
    }

    /// Write every field of `model` into `out`.
    ///
    /// Bytes not covered by a field are left as the caller initialised them.
    pub fn encode(&self, model: &ParameterModel, out: &mut [u8]) -> Result<(), CodecError> {
        for field in &self.fields {
            self.check_span(field, out.len())?;
            let at = field.offset;
            let int = |key: &str| {
                model.int(key).map_err(|e| {
                    error!("{}: cannot encode '{}': {}", self.device, key, e);
                    self.model_error(e)
                })
            };

            match &field.encoding {
                Encoding::Byte => out[at] = (int(&field.key)? & 0xFF) as u8,
                Encoding::Wide14 => {
                    let [msb, lsb] = packing::split_14bit(int(&field.key)?);
                    out[at] = msb;
                    out[at + 1] = lsb;
                }
                Encoding::Flagged { flag } => {
                    out[at] = packing::pack_flagged(int(flag)?, int(&field.key)?);
                }
                Encoding::Bits(slices) => {
                    let value = int(&field.key)?.max(0) as u32;
                    packing::pack_bits(&mut out[at..], slices, value);
                }
                Encoding::Flag { on } => {
                    out[at] = if int(&field.key)? != 0 { *on } else { 0 };
                }
                Encoding::Text { width } => {
                    let name = model.text(&field.key).map_err(|e| {
                        error!("{}: cannot encode '{}': {}", self.device, field.key, e);
                        self.model_error(e)
                    })?;
                    out[at..at + width].copy_from_slice(&packing::encode_name(name, *width));
                }
            }
        }
        Ok(())
    }

    /// Read every field from `data` into `model`.
    ///
    /// Codes above a field's fallback limit are replaced by the fallback.
    /// Values are stored raw; run [`Schema::revise`] afterwards to clamp.
    pub fn decode(&self, data: &[u8], model: &mut ParameterModel) -> Result<(), CodecError> {
        for field in &self.fields {
            self.check_span(field, data.len())?;
            let at = field.offset;

            let value = match &field.encoding {
                Encoding::Byte => i32::from(data[at]),
                Encoding::Wide14 => packing::join_14bit(data[at], data[at + 1]),
                Encoding::Flagged { flag } => {
                    let (on, value) = packing::unpack_flagged(data[at]);
                    model.set_int(flag, on).map_err(|e| self.model_error(e))?;
                    value
                }
                Encoding::Bits(slices) => packing::unpack_bits(&data[at..], slices) as i32,
                Encoding::Flag { .. } => i32::from(data[at] != 0),
                Encoding::Text { width } => {
                    let name = packing::decode_name(&data[at..at + width]);
                    model
                        .set_text(&field.key, name)
                        .map_err(|e| self.model_error(e))?;
                    continue;
                }
            };

            let value = match field.fallback {
                Some(fallback) if value > fallback.limit => {
                    warn!(
                        "{}: invalid code {} for '{}', using {}",
                        self.device, value, field.key, fallback.value
                    );
                    fallback.value
                }
                _ => value,
            };
            model
                .set_int(&field.key, value)
                .map_err(|e| self.model_error(e))?;
        }
        debug!("{}: unpacked {} fields", self.device, self.fields.len());
        Ok(())
    }

    /// Check the table against `schema`: every key must be declared with the
    /// matching kind and every field must fit inside the payload.
    pub fn validate(&self, schema: &Schema) -> Result<(), CodecError> {
        for field in &self.fields {
            self.check_span(field, self.len)?;
            let text = matches!(field.encoding, Encoding::Text { .. });
            for key in field.keys() {
                let expected = if text && key == field.key {
                    "text"
                } else {
                    "an integer"
                };
                let ok = match schema.kind(key) {
                    Some(ParamKind::Text { .. }) => expected == "text",
                    Some(ParamKind::Int { .. }) => expected == "an integer",
                    None => {
                        return Err(
                            self.model_error(crate::error::ModelError::Undefined(key.to_string()))
                        )
                    }
                };
                if !ok {
                    return Err(self.model_error(crate::error::ModelError::WrongKind {
                        key: key.to_string(),
                        expected,
                    }));
                }
            }
        }
        Ok(())
    }
}
