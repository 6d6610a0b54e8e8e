//! Generic controller-map patches: 18 custom CC, NRPN and RPN slots, the 128
//! plain CCs and a few channel-wide tuning parameters, stored in a single
//! private sysex frame.

use crate::codec::{Codec, Decoded};
use crate::error::{CodecError, DecodeError, ModelError};
use crate::field::{FieldSpec, Layout};
use crate::midi;
use crate::model::ParameterModel;
use crate::schema::Schema;
use crate::syx::SYSEX_END;

const NAME: &str = "Generic";

/// Frame signature including the format version byte (0).
pub const HEADER: [u8; 12] = [
    0xF0, 0x7D, b'E', b'D', b'I', b'S', b'Y', b'N', b' ', b'C', b'C', 0x00,
];

const VERSION_BYTE: usize = 11;

/// Custom slots per message family
pub const SLOTS: usize = 18;
/// Bytes per custom slot
pub const SLOT_LEN: usize = 19;
/// Bytes per plain CC entry
pub const CC_LEN: usize = 21;

const SLOT_NAME_LEN: usize = 12;
const CC_NAME_LEN: usize = 20;
const TRAILER_LEN: usize = 7;

/// Bytes between the header and the terminator.
pub const PAYLOAD_LEN: usize = SLOTS * SLOT_LEN * 3 + 128 * CC_LEN + TRAILER_LEN;

/// Total frame length.
pub const FRAME_LEN: usize = HEADER.len() + PAYLOAD_LEN + 1;

const FAMILIES: [&str; 3] = ["cc", "nrpn", "rpn"];

/// Standard names of the 128 controllers, blank where unassigned.
pub const CC_NAMES: [&str; 128] = [
    "Bank Select", "Modulation", "Breath", "", "Foot Controller", "Portamento Time", "Data Entry MSB", "Volume",
    "Balance", "", "Pan", "Expression", "Effect 1", "Effect 2", "", "",
    "", "", "", "", "", "", "", "",
    "", "", "", "", "", "", "", "",
    "Bank Selct LSB", "Modulation LSB", "Breath LSB", "", "Foot Cntrl LSB", "Porta Time LSB", "Data Entry LSB", "Volume LSB",
    "Balance LSB", "Pan LSB", "Expression LSB", "Effect 1 LSB", "Effect 2 LSB", "", "", "",
    "", "", "", "", "", "", "", "",
    "", "", "", "", "", "", "", "",
    "Damper/Sustain", "Portamento", "Sostenuto", "Soft Pedal", "Legato Footsw", "Hold 2", "Sound 1", "Sound 2",
    "Sound 3", "Sound 4", "Sound 5", "Sound 6", "Sound 7", "Sound 8", "Sound 9", "Sound 10",
    "", "", "", "", "Porta Ctrl", "", "", "",
    "HiRes Vel Pref", "", "", "Effect 1 Depth", "Effect 2 Depth", "Effect 3 Depth", "Effect 4 Depth", "Effect 5 Depth",
    "Data Increment", "Data Decrement", "NRPN LSB", "NRPN MSB", "RPN LSB", "RPN MSB", "", "",
    "", "", "", "", "", "", "", "",
    "", "", "", "", "", "", "", "",
    "All Sound Off", "Reset Cntrlrs", "Local On/Off", "All Notes Off", "Omni Off", "Omni On", "Mono Mode", "Poly Mode",
];

/// Default label of plain controller `cc`.
pub fn cc_label(cc: usize) -> String {
    match CC_NAMES.get(cc) {
        Some(name) if !name.is_empty() => format!("CC {} {}", cc, name),
        _ => format!("CC {}", cc),
    }
}

/// Codec for the generic controller-map format.
#[derive(Debug)]
pub struct Generic {
    schema: Schema,
    layout: Layout,
}

impl Default for Generic {
    fn default() -> Self {
        Self::new()
    }
}

impl Generic {
    /// Build the schema and field table.
    pub fn new() -> Self {
        Self {
            schema: build_schema(),
            layout: build_layout(),
        }
    }

    /// Field table of the payload (offsets relative to the end of the header).
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    fn decode_frame(&self, data: &[u8]) -> Result<ParameterModel, DecodeError> {
        if data.len() != FRAME_LEN {
            return Err(DecodeError::WrongLength {
                expected: FRAME_LEN,
                found: data.len(),
            });
        }
        if data[..VERSION_BYTE] != HEADER[..VERSION_BYTE] {
            return Err(DecodeError::BadHeader(NAME));
        }
        if data[VERSION_BYTE] != HEADER[VERSION_BYTE] {
            return Err(DecodeError::UnsupportedVersion(data[VERSION_BYTE]));
        }
        if data[FRAME_LEN - 1] != SYSEX_END {
            return Err(DecodeError::BadHeader(NAME));
        }

        let mut model = self.schema.defaults();
        self.layout
            .decode(&data[HEADER.len()..FRAME_LEN - 1], &mut model)?;
        self.schema.revise(&mut model)?;
        Ok(model)
    }

    fn custom_messages(
        &self,
        model: &ParameterModel,
        family: &str,
        slot: &str,
        value: i32,
        channel: u8,
    ) -> Result<Vec<Vec<u8>>, CodecError> {
        let int = |key: String| {
            model.int(&key).map_err(|source| CodecError::Model {
                device: NAME,
                source,
            })
        };
        let param = int(format!("cust-{}-param-{}", family, slot))?;
        let lsb = int(format!("cust-{}-lsb-{}", family, slot))? != 0;

        Ok(match family {
            "cc" if lsb && param < 32 => midi::long_cc(channel, param, value),
            "cc" => vec![midi::cc(channel, param, value)],
            "nrpn" if lsb => midi::nrpn(channel, param, value),
            "nrpn" => midi::nrpn(channel, param, value * 128),
            _ if lsb => midi::rpn(channel, param, value),
            _ => midi::rpn(channel, param, value * 128),
        })
    }
}

fn build_schema() -> Schema {
    let mut schema = Schema::new(NAME);

    for family in FAMILIES {
        let param_max = if family == "cc" { 127 } else { 16383 };
        for i in 1..=SLOTS {
            let param = format!("cust-{}-param-{}", family, i);
            let lsb = format!("cust-{}-lsb-{}", family, i);
            schema
                .int(param.clone(), 0, param_max, 0)
                .int(format!("cust-{}-value-{}", family, i), 0, 16383, 0)
                .int(format!("cust-{}-value-alt-{}", family, i), 0, 16383, 0)
                .int(lsb.clone(), 0, 1, 0)
                .text(format!("cust-{}-name-{}", family, i), SLOT_NAME_LEN, "Name");

            for value in ["value", "value-alt"] {
                let (param_key, lsb_key) = (param.clone(), lsb.clone());
                schema.derive_max(
                    format!("cust-{}-{}-{}", family, value, i),
                    &[lsb.as_str(), param.as_str()],
                    move |m| {
                        let wide = m.int(&lsb_key).unwrap_or(0) == 1
                            && (family != "cc" || m.int(&param_key).unwrap_or(0) < 32);
                        if wide {
                            16383
                        } else {
                            127
                        }
                    },
                );
            }
        }
    }

    for cc in 0..128 {
        schema
            .int(format!("cc-{}", cc), 0, 127, 0)
            .text(format!("cc-name-{}", cc), CC_NAME_LEN, &cc_label(cc));
    }

    schema
        .int("pitchbend", 0, 16383, 8192)
        .int("pitchbendrange", 0, 12700, 200)
        .int("coarsetune", 0, 127, 64)
        .int("finetune", 0, 16383, 8192);
    schema
}

fn build_layout() -> Layout {
    let mut layout = Layout::new(NAME, PAYLOAD_LEN);
    let mut pos = 0;

    for family in FAMILIES {
        for i in 1..=SLOTS {
            layout
                .push(FieldSpec::wide(format!("cust-{}-param-{}", family, i), pos))
                .push(FieldSpec::wide(format!("cust-{}-value-{}", family, i), pos + 2))
                .push(FieldSpec::wide(format!("cust-{}-value-alt-{}", family, i), pos + 4))
                .push(FieldSpec::byte(format!("cust-{}-lsb-{}", family, i), pos + 6))
                .push(FieldSpec::text(format!("cust-{}-name-{}", family, i), pos + 7, SLOT_NAME_LEN));
            pos += SLOT_LEN;
        }
    }

    for cc in 0..128 {
        layout
            .push(FieldSpec::byte(format!("cc-{}", cc), pos))
            .push(FieldSpec::text(format!("cc-name-{}", cc), pos + 1, CC_NAME_LEN));
        pos += CC_LEN;
    }

    layout
        .push(FieldSpec::wide("pitchbend", pos))
        .push(FieldSpec::wide("pitchbendrange", pos + 2))
        .push(FieldSpec::byte("coarsetune", pos + 4))
        .push(FieldSpec::wide("finetune", pos + 5));
    layout
}

impl Codec for Generic {
    fn name(&self) -> &'static str {
        NAME
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn recognize(&self, data: &[u8]) -> bool {
        data.len() == FRAME_LEN && data.starts_with(&HEADER)
    }

    fn decode(&self, data: &[u8]) -> Decoded {
        self.decode_frame(data).into()
    }

    fn encode(&self, model: &ParameterModel) -> Result<Vec<u8>, CodecError> {
        let mut sysex = vec![0u8; FRAME_LEN];
        sysex[..HEADER.len()].copy_from_slice(&HEADER);
        self.layout
            .encode(model, &mut sysex[HEADER.len()..FRAME_LEN - 1])?;
        sysex[FRAME_LEN - 1] = SYSEX_END;
        Ok(sysex)
    }

    fn parameter_messages(
        &self,
        model: &ParameterModel,
        key: &str,
        channel: u8,
    ) -> Result<Vec<Vec<u8>>, CodecError> {
        let value = match self.schema.kind(key) {
            Some(_) if key.starts_with("cc-name-") || (key.starts_with("cust-") && key.contains("-name-")) => {
                return Ok(Vec::new())
            }
            Some(_) => model.int(key).map_err(|source| CodecError::Model {
                device: NAME,
                source,
            })?,
            None => {
                return Err(CodecError::Model {
                    device: NAME,
                    source: ModelError::Undefined(key.to_string()),
                })
            }
        };

        if let Some(cc) = key.strip_prefix("cc-") {
            let cc: i32 = cc.parse().unwrap_or(0);
            return Ok(vec![midi::cc(channel, cc, value)]);
        }

        if let Some(rest) = key.strip_prefix("cust-") {
            for family in FAMILIES {
                for field in ["value-alt-", "value-"] {
                    let prefix = format!("{}-{}", family, field);
                    if let Some(slot) = rest.strip_prefix(prefix.as_str()) {
                        return self.custom_messages(model, family, slot, value, channel);
                    }
                }
            }
            return Ok(Vec::new());
        }

        Ok(match key {
            "pitchbend" => vec![midi::pitch_bend(channel, value)],
            "pitchbendrange" => {
                let (semitones, cents) = (value / 100, value % 100);
                midi::rpn(channel, midi::RPN_PITCH_BEND_RANGE, semitones * 128 + cents)
            }
            "finetune" => midi::rpn(channel, midi::RPN_FINE_TUNING, value),
            "coarsetune" => midi::rpn(channel, midi::RPN_COARSE_TUNING, value << 7),
            _ => Vec::new(),
        })
    }
}
