//! Waldorf Microwave II/XT/XTk multi programs.
//!
//! A multi dump is `F0 3E 0E dev 11 BB NN`, 256 data bytes, a checksum over
//! the data bytes only, and `F7`.

use log::debug;

use crate::checksum;
use crate::codec::{Codec, Decoded};
use crate::error::{CodecError, DecodeError};
use crate::field::{FieldSpec, Layout};
use crate::model::ParameterModel;
use crate::packing;
use crate::schema::Schema;
use crate::syx::{SYSEX_END, SYSEX_START};

const NAME: &str = "Waldorf Microwave XT Multi";

/// Waldorf manufacturer ID
pub const WALDORF: u8 = 0x3E;
/// Microwave family ID
pub const MICROWAVE: u8 = 0x0E;

const DUMP_REQUEST: u8 = 0x01;
const MULTI_DUMP: u8 = 0x11;
const MODE_CHANGE: u8 = 0x17;
const MULTI_PARAMETER: u8 = 0x21;

/// BB value addressing the edit buffer
pub const EDIT_BUFFER: u8 = 0x20;
/// LL value addressing the global part of a multi
pub const GLOBAL_LOCATION: u8 = 0x20;

const DEV_BYTE: usize = 3;
const COMMAND_BYTE: usize = 4;
const BANK_BYTE: usize = 5;
const NUMBER_BYTE: usize = 6;
const DATA_START: usize = 7;

/// Data bytes in a multi
pub const DATA_LEN: usize = 256;
const CHECKSUM_BYTE: usize = DATA_START + DATA_LEN;
/// Multi dump length
pub const FRAME_LEN: usize = CHECKSUM_BYTE + 2;

/// BB values below this address stored multis
const STORED_BANKS: u8 = 8;

const NAME_START: usize = 16;
const NAME_LEN: usize = 16;
const INSTRUMENTS: usize = 8;
const INSTRUMENT_START: usize = 32;
const INSTRUMENT_LEN: usize = 28;

/// Global parameters with their data index.
const GLOBALS: [(&str, usize); 7] = [
    ("volume", 0),
    ("controlw", 1),
    ("controlx", 2),
    ("controly", 3),
    ("controlz", 4),
    ("arptempo", 5),
    ("midisend", 6),
];

/// Per-instrument parameters: name, index within the block, min, max, default.
const INSTRUMENT_PARAMS: [(&str, usize, i32, i32, i32); 24] = [
    ("bank", 0, 0, 1, 0),
    ("number", 1, 0, 127, 0),
    ("channel", 2, 0, 17, 0),
    ("volume", 3, 0, 127, 127),
    ("transpose", 4, 16, 112, 64),
    ("detune", 5, 0, 127, 64),
    ("output", 6, 0, 1, 0),
    ("status", 7, 0, 1, 0),
    ("panning", 8, 0, 127, 64),
    ("panmod", 9, 0, 2, 0),
    ("lowvel", 12, 1, 127, 1),
    ("hivel", 13, 1, 127, 127),
    ("lowkey", 14, 0, 127, 0),
    ("hikey", 15, 0, 127, 127),
    ("arp", 16, 0, 3, 0),
    ("arpclock", 17, 0, 15, 0),
    ("arprange", 18, 1, 10, 1),
    ("arppattern", 19, 0, 16, 0),
    ("arpdirection", 20, 0, 3, 0),
    ("arporder", 21, 0, 3, 0),
    ("arpvel", 22, 0, 1, 0),
    ("arpreset", 23, 0, 1, 0),
    ("arpnotesout", 24, 0, 18, 0),
    ("midisend", 26, 0, 1, 0),
];

fn instrument_key(inst: usize, param: &str) -> String {
    format!("inst{}{}", inst, param)
}

fn build_schema() -> Schema {
    let mut schema = Schema::new(NAME);
    schema
        .int("number", 0, 127, 0)
        .text("name", NAME_LEN, "Init Sound V1.1")
        .int("volume", 0, 127, 127)
        .int("controlw", 0, 127, 0)
        .int("controlx", 0, 127, 0)
        .int("controly", 0, 127, 0)
        .int("controlz", 0, 127, 0)
        .int("arptempo", 1, 127, 37)
        .int("midisend", 0, 1, 0);
    for inst in 1..=INSTRUMENTS {
        for (param, _, min, max, default) in INSTRUMENT_PARAMS {
            schema.int(instrument_key(inst, param), min, max, default);
        }
    }
    schema
}

fn build_layout() -> Layout {
    let mut layout = Layout::new(NAME, DATA_LEN);
    for (key, index) in GLOBALS {
        layout.push(FieldSpec::byte(key, index));
    }
    layout.push(FieldSpec::text("name", NAME_START, NAME_LEN));
    for inst in 1..=INSTRUMENTS {
        let base = INSTRUMENT_START + (inst - 1) * INSTRUMENT_LEN;
        for (param, index, ..) in INSTRUMENT_PARAMS {
            layout.push(FieldSpec::byte(instrument_key(inst, param), base + index));
        }
    }
    layout
}

/// Codec for Microwave II/XT/XTk multis.
#[derive(Debug)]
pub struct Microwave {
    device_id: u8,
    schema: Schema,
    layout: Layout,
}

impl Default for Microwave {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Microwave {
    /// Codec addressing the unit set to `device_id`.
    pub fn new(device_id: u8) -> Self {
        Self {
            device_id: device_id & 0x7F,
            schema: build_schema(),
            layout: build_layout(),
        }
    }

    /// Field table of the 256 data bytes.
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    fn frame(&self, bank: u8, number: u8, model: &ParameterModel) -> Result<Vec<u8>, CodecError> {
        let mut sysex = vec![0u8; FRAME_LEN];
        sysex[..DATA_START].copy_from_slice(&[
            SYSEX_START,
            WALDORF,
            MICROWAVE,
            self.device_id,
            MULTI_DUMP,
            bank,
            number,
        ]);
        self.layout
            .encode(model, &mut sysex[DATA_START..CHECKSUM_BYTE])?;
        sysex[CHECKSUM_BYTE] = checksum::sum7(&sysex[DATA_START..CHECKSUM_BYTE]);
        sysex[FRAME_LEN - 1] = SYSEX_END;
        Ok(sysex)
    }

    /// Emit `model` addressed to the edit buffer instead of its stored location.
    pub fn encode_to_edit_buffer(&self, model: &ParameterModel) -> Result<Vec<u8>, CodecError> {
        self.frame(EDIT_BUFFER, 0, model)
    }

    /// Ask the unit to send stored multi `number`.
    pub fn request_dump(&self, number: u8) -> Vec<u8> {
        let (bank, number) = (0u8, number & 0x7F);
        vec![
            SYSEX_START,
            WALDORF,
            MICROWAVE,
            self.device_id,
            DUMP_REQUEST,
            bank,
            number,
            bank.wrapping_add(number) & 0x7F,
            SYSEX_END,
        ]
    }

    /// Ask the unit to send the multi in its edit buffer.
    pub fn request_current(&self) -> Vec<u8> {
        vec![
            SYSEX_START,
            WALDORF,
            MICROWAVE,
            self.device_id,
            DUMP_REQUEST,
            EDIT_BUFFER,
            0x00,
            EDIT_BUFFER,
            SYSEX_END,
        ]
    }

    /// Switch the unit into multi mode.
    pub fn multi_mode(&self) -> Vec<u8> {
        vec![
            SYSEX_START,
            WALDORF,
            MICROWAVE,
            self.device_id,
            MODE_CHANGE,
            0x01,
            SYSEX_END,
        ]
    }

    fn parameter_change(&self, location: u8, index: usize, value: u8) -> Vec<u8> {
        vec![
            SYSEX_START,
            WALDORF,
            MICROWAVE,
            self.device_id,
            MULTI_PARAMETER,
            location,
            (index & 0x7F) as u8,
            value & 0x7F,
            SYSEX_END,
        ]
    }

    fn decode_frame(&self, data: &[u8]) -> Result<ParameterModel, DecodeError> {
        if data.len() != FRAME_LEN {
            return Err(DecodeError::WrongLength {
                expected: FRAME_LEN,
                found: data.len(),
            });
        }
        if data[0] != SYSEX_START
            || data[1] != WALDORF
            || data[2] != MICROWAVE
            || data[COMMAND_BYTE] != MULTI_DUMP
            || data[FRAME_LEN - 1] != SYSEX_END
        {
            return Err(DecodeError::BadHeader(NAME));
        }

        let payload = &data[DATA_START..CHECKSUM_BYTE];
        let found = data[CHECKSUM_BYTE];
        let computed = checksum::sum7(payload);
        if !checksum::verify_sum7(payload, found) {
            return Err(DecodeError::ChecksumMismatch { computed, found });
        }
        if found != computed {
            debug!("SYSEX: accepting wildcard checksum (computed {:#04x})", computed);
        }
        if data[DEV_BYTE] != self.device_id {
            debug!(
                "SYSEX: multi from device {} while addressing {}",
                data[DEV_BYTE], self.device_id
            );
        }

        let mut model = self.schema.defaults();
        self.layout.decode(payload, &mut model)?;
        if data[BANK_BYTE] < STORED_BANKS {
            model
                .set_int("number", i32::from(data[NUMBER_BYTE]))
                .map_err(|source| CodecError::Model {
                    device: NAME,
                    source,
                })?;
        }
        self.schema.revise(&mut model)?;
        Ok(model)
    }
}

impl Codec for Microwave {
    fn name(&self) -> &'static str {
        NAME
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn recognize(&self, data: &[u8]) -> bool {
        data.len() == FRAME_LEN
            && data[0] == SYSEX_START
            && data[1] == WALDORF
            && data[2] == MICROWAVE
            && data[COMMAND_BYTE] == MULTI_DUMP
    }

    fn decode(&self, data: &[u8]) -> Decoded {
        self.decode_frame(data).into()
    }

    fn encode(&self, model: &ParameterModel) -> Result<Vec<u8>, CodecError> {
        let number = model.int("number").map_err(|source| CodecError::Model {
            device: NAME,
            source,
        })?;
        self.frame(0, (number & 0x7F) as u8, model)
    }

    fn parameter_messages(
        &self,
        model: &ParameterModel,
        key: &str,
        _channel: u8,
    ) -> Result<Vec<Vec<u8>>, CodecError> {
        let model_error = |source| CodecError::Model {
            device: NAME,
            source,
        };

        if key == "name" {
            let name = packing::encode_name(model.text(key).map_err(model_error)?, NAME_LEN);
            return Ok(name
                .iter()
                .enumerate()
                .map(|(i, &c)| self.parameter_change(GLOBAL_LOCATION, NAME_START + i, c))
                .collect());
        }

        // the location number is not a data byte
        let value = model.int(key).map_err(model_error)?;
        if key == "number" {
            return Ok(Vec::new());
        }

        if let Some(&(_, index)) = GLOBALS.iter().find(|(k, _)| *k == key) {
            return Ok(vec![self.parameter_change(GLOBAL_LOCATION, index, value as u8)]);
        }

        for inst in 1..=INSTRUMENTS {
            for (param, index, ..) in INSTRUMENT_PARAMS {
                if instrument_key(inst, param) == key {
                    let location = (inst - 1) as u8;
                    return Ok(vec![self.parameter_change(location, index, value as u8)]);
                }
            }
        }
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_matches_schema() {
        let mw = Microwave::default();
        mw.layout().validate(mw.schema()).unwrap();
        // everything but the location number is a data byte
        assert_eq!(mw.layout().fields().len(), mw.schema().len() - 1);
        assert_eq!(FRAME_LEN, 265);
    }

    #[test]
    fn test_encode_header_and_checksum() {
        let mw = Microwave::new(3);
        let mut model = mw.defaults();
        mw.schema().write(&mut model, "number", 42).unwrap();

        let sysex = mw.encode(&model).unwrap();
        assert_eq!(&sysex[..7], &[0xF0, 0x3E, 0x0E, 3, 0x11, 0, 42]);
        assert_eq!(sysex[CHECKSUM_BYTE], checksum::sum7(&sysex[7..263]));
        assert_eq!(sysex[264], 0xF7);

        let edit = mw.encode_to_edit_buffer(&model).unwrap();
        assert_eq!(&edit[5..7], &[EDIT_BUFFER, 0]);
        assert_eq!(&edit[7..], &sysex[7..]);
    }

    #[test]
    fn test_edit_buffer_keeps_number() {
        let mw = Microwave::default();
        let mut model = mw.defaults();
        mw.schema().write(&mut model, "number", 42).unwrap();
        let edit = mw.encode_to_edit_buffer(&model).unwrap();
        let back = mw.decode(&edit).into_model().unwrap();
        // an edit-buffer dump carries no location
        assert_eq!(back.int("number"), Ok(0));
    }

    #[test]
    fn test_requests() {
        let mw = Microwave::new(1);
        assert_eq!(
            mw.request_dump(100),
            vec![0xF0, 0x3E, 0x0E, 1, 0x01, 0, 100, 100, 0xF7]
        );
        assert_eq!(
            mw.request_current(),
            vec![0xF0, 0x3E, 0x0E, 1, 0x01, 0x20, 0, 0x20, 0xF7]
        );
        assert_eq!(mw.multi_mode(), vec![0xF0, 0x3E, 0x0E, 1, 0x17, 0x01, 0xF7]);
    }

    #[test]
    fn test_parameter_changes() {
        let mw = Microwave::default();
        let schema = mw.schema();
        let mut model = mw.defaults();
        schema.write(&mut model, "controlx", 33).unwrap();
        schema.write(&mut model, "inst3transpose", 70).unwrap();
        schema.write_text(&mut model, "name", "Pad").unwrap();

        assert_eq!(
            mw.parameter_messages(&model, "controlx", 0),
            Ok(vec![vec![0xF0, 0x3E, 0x0E, 0, 0x21, 0x20, 2, 33, 0xF7]])
        );
        assert_eq!(
            mw.parameter_messages(&model, "inst3transpose", 0),
            Ok(vec![vec![0xF0, 0x3E, 0x0E, 0, 0x21, 2, 4, 70, 0xF7]])
        );

        let name = mw.parameter_messages(&model, "name", 0).unwrap();
        assert_eq!(name.len(), 16);
        assert_eq!(name[0], vec![0xF0, 0x3E, 0x0E, 0, 0x21, 0x20, 16, b'P', 0xF7]);
        assert_eq!(name[15][7], b' ');

        assert_eq!(mw.parameter_messages(&model, "number", 0), Ok(vec![]));
        assert!(mw.parameter_messages(&model, "inst9volume", 0).is_err());
    }
}
