//! Novation Drumstation / D Station kits.
//!
//! Both frame shapes carry nibblized data: a single kit (`22`) holds 140
//! data bytes, a bank dump (`11`) holds 15 kits of 136 bytes followed by an
//! 8-byte footer with the MIDI channels.

use log::debug;
use num_traits::clamp;

use crate::codec::{BankListing, BankRecord, Codec, Decoded};
use crate::error::{CodecError, DecodeError};
use crate::field::{FieldSpec, Layout};
use crate::midi;
use crate::model::ParameterModel;
use crate::packing::{self, BitSlice};
use crate::schema::Schema;
use crate::syx::SYSEX_END;

const NAME: &str = "Novation D Station";

/// Novation manufacturer ID and Drumstation model bytes.
pub const HEADER: [u8; 6] = [0xF0, 0x00, 0x20, 0x29, 0x02, 0x01];

const TYPE_BYTE: usize = 6;
/// Message type of a single kit
pub const SINGLE_TYPE: u8 = 0x22;
/// Message type of a bank dump
pub const BANK_TYPE: u8 = 0x11;

/// First nibble of the payload
const DATA_START: usize = 7;

/// Data bytes of a single kit
pub const SINGLE_DATA_LEN: usize = 140;
/// Single kit frame length
pub const SINGLE_LEN: usize = DATA_START + SINGLE_DATA_LEN * 2 + 1;

/// Kits in a bank dump
pub const RECORDS: usize = 15;
/// Data bytes per bank kit
pub const RECORD_LEN: usize = 136;
/// Data bytes of the bank footer
pub const FOOTER_LEN: usize = 8;
/// Bank frame length
pub const BANK_LEN: usize = DATA_START + (RECORDS * RECORD_LEN + FOOTER_LEN) * 2 + 1;

/// Device program number of the first kit in a bank dump
pub const FIRST_BANK_PROGRAM: usize = 25;

const FOOTER_TX: usize = 3;
const FOOTER_RX: usize = 6;

const MIN_CHANNEL: u8 = 1;
const MAX_CHANNEL: u8 = 16;

/// Data bytes used by the drum voices
const DRUM_BYTES: usize = 129;

/// Drum voices in wire order, with their record sizes.
pub const DRUMS: [(&str, usize); 27] = [
    ("909BD", 6), ("909RS", 4), ("909SD", 6), ("909CP", 4), ("909LT", 5), ("909MT", 5),
    ("909CH", 5), ("909HT", 5), ("909CC", 5), ("909RC", 5), ("909OH", 5),
    ("808BD", 6), ("808RS", 4), ("808CP", 4), ("808SD", 6), ("808CH", 5), ("808LT", 5),
    ("808OH", 5), ("808MT", 5), ("808CC", 5), ("808HT", 5), ("808CB", 4), ("808HC", 4),
    ("808MC", 4), ("808LC", 4), ("808MA", 4), ("808CL", 4),
];

/// The 808 crash has no tune byte and a tone byte in its place.
const CRASH_808: &str = "808CC";

const BANKS: [&str; 4] = ["banka", "bankb", "bankc", "bankd"];

/// Highest pan/output code; 15 is a second "O 4" on the hardware and
/// decodes as 13.
const PAN_MAX: i32 = 14;
const PAN_FALLBACK: i32 = 13;

/// Parameters the device answers to over CC, starting at CC 20.
pub const CC_PARAMETERS: [&str; 100] = [
    "808BDfrontcut", "808BDpan", "808BDdistortion", "808BDtune", "808BDtone", "808BDdecay",
    "808SDfrontcut", "808SDpan", "808SDdistortion", "808SDtune", "808SDtone", "808SDdecay",
    "808LTfrontcut", "808LTpan", "808LTdistortion", "808LTtune", "808LTdecay", "808MTfrontcut",
    "808MTpan", "808MTdistortion", "808MTtune", "808MTdecay", "808HTfrontcut", "808HTpan",
    "808HTdistortion", "808HTtune", "808HTdecay", "808RSpan", "808RStune", "808CPpan",
    "808CPtune", "808CBpan", "808CBdistortion", "808CBtune", "808CHpan", "808CHtune",
    "808CHdecay", "808OHpan", "808OHtune", "808OHdecay", "808CCpan", "808CCtone",
    "808CCdecay", "808LCpan", "808LCdistortion", "808LCtune", "808MCpan", "808MCdistortion",
    "808MCtune", "808HCpan", "808HCdistortion", "808HCtune", "808MApan", "808MAtune",
    "808CLpan", "808CLtune", "909BDtune", "909BDtone", "909BDdecay", "909SDtune",
    "909SDtone", "909SDdecay", "909LTfrontcut", "909LTpan", "909LTdistortion", "909LTtune",
    "909LTdecay", "909MTfrontcut", "909MTpan", "909MTdistortion", "909MTtune", "909MTdecay",
    "909HTfrontcut", "909HTpan", "909HTdistortion", "909HTtune", "909HTdecay", "909RSpan",
    "909RStune", "909CPpan", "909CPtune", "909CHdistortion", "909CHtune", "909CHdecay",
    // these ten are out of order on the device
    "909OHtune", "909BDfrontcut", "909BDpan", "909BDdistortion", "909SDfrontcut", "909SDpan",
    "909SDdistortion", "909CHpan", "909OHpan", "909OHdecay",
    "909CCpan", "909CCtune", "909CCdecay", "909RCpan", "909RCtune", "909RCdecay",
];

const FIRST_CC: i32 = 20;

/// Which velocity/value byte pairs a drum voice carries, in wire order.
fn drum_values(drum: &str, bytes: usize) -> Vec<&'static str> {
    let mut values = Vec::with_capacity(4);
    if drum != CRASH_808 {
        values.push("tune");
    }
    values.push("level");
    if drum == CRASH_808 || bytes == 6 {
        values.push("tone");
    }
    if bytes >= 5 {
        values.push("decay");
    }
    values
}

fn drum_fields() -> Vec<FieldSpec> {
    let mut fields = Vec::new();
    let mut pos = 0;
    for (drum, bytes) in DRUMS {
        for value in drum_values(drum, bytes) {
            fields.push(FieldSpec::flagged(
                format!("{}{}", drum, value),
                format!("{}{}velocity", drum, value),
                pos,
            ));
            pos += 1;
        }
        fields.push(FieldSpec::flagged(
            format!("{}frontcut", drum),
            format!("{}noteoff", drum),
            pos,
        ));
        fields.push(FieldSpec::bits(
            format!("{}distortion", drum),
            pos + 1,
            &[BitSlice::new(0, 4, 4)],
        ));
        fields.push(
            FieldSpec::bits(format!("{}pan", drum), pos + 1, &[BitSlice::new(0, 0, 4)])
                .or_fallback(PAN_MAX, PAN_FALLBACK),
        );
        pos += 2;
    }
    debug_assert_eq!(pos, DRUM_BYTES);
    fields
}

fn build_schema() -> Schema {
    let mut schema = Schema::new(NAME);
    for (drum, bytes) in DRUMS {
        for value in drum_values(drum, bytes) {
            schema
                .int(format!("{}{}", drum, value), 0, 127, 0)
                .int(format!("{}{}velocity", drum, value), 0, 1, 0);
        }
        schema
            .int(format!("{}noteoff", drum), 0, 1, 0)
            .int(format!("{}frontcut", drum), 0, 99, 0)
            .int(format!("{}distortion", drum), 0, 15, 0)
            .int(format!("{}pan", drum), 0, PAN_MAX, 4);
    }
    for bank in BANKS {
        schema.int(bank, 0, DRUMS.len() as i32 - 1, 0);
    }
    schema.int("gmset", 0, 1, 0);
    schema
}

fn single_layout() -> Layout {
    let mut layout = Layout::new(NAME, SINGLE_DATA_LEN);
    layout.extend(drum_fields());
    for (i, bank) in BANKS.into_iter().enumerate() {
        layout.push(FieldSpec::byte(bank, DRUM_BYTES + i));
    }
    // six bytes of unknown purpose
    layout.push(FieldSpec::byte("gmset", DRUM_BYTES + 10));
    layout
}

/// Bank kits squeeze the four bank selections into five bits each.
/// Bank C follows the published bit table (byte 1 bits 2-6); it has not been
/// checked against hardware.
fn record_layout() -> Layout {
    let at = DRUM_BYTES;
    let mut layout = Layout::new(NAME, RECORD_LEN);
    layout
        .extend(drum_fields())
        .push(FieldSpec::bits("banka", at, &[BitSlice::new(0, 0, 5)]))
        .push(FieldSpec::bits(
            "bankb",
            at,
            &[BitSlice::new(0, 5, 3), BitSlice::new(1, 0, 2)],
        ))
        .push(FieldSpec::bits("bankc", at, &[BitSlice::new(1, 2, 5)]))
        .push(FieldSpec::bits(
            "bankd",
            at,
            &[BitSlice::new(1, 7, 1), BitSlice::new(3, 4, 4)],
        ))
        // two unknown bytes follow the bank data; the set is 0 for 808, 4 for 909
        .push(FieldSpec::flag("gmset", at + 6, 4));
    layout
}

/// MIDI channels stored in a bank dump's footer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Channels {
    /// Transmit channel, 1-16
    pub tx: u8,
    /// Receive channel, 1-16
    pub rx: u8,
}

impl Channels {
    /// Pull both channels into 1-16.
    pub fn revised(self) -> Self {
        let revised = Self {
            tx: clamp(self.tx, MIN_CHANNEL, MAX_CHANNEL),
            rx: clamp(self.rx, MIN_CHANNEL, MAX_CHANNEL),
        };
        if revised != self {
            debug!("SYSEX: D Station footer channels {:?} clamped to {:?}", self, revised);
        }
        revised
    }
}

/// Codec for Drumstation kits and kit banks.
#[derive(Debug)]
pub struct DStation {
    schema: Schema,
    single: Layout,
    record: Layout,
}

impl Default for DStation {
    fn default() -> Self {
        Self::new()
    }
}

impl DStation {
    /// Build the schema and both field tables.
    pub fn new() -> Self {
        Self {
            schema: build_schema(),
            single: single_layout(),
            record: record_layout(),
        }
    }

    /// Field table of a single kit's 140 data bytes.
    pub fn single_layout(&self) -> &Layout {
        &self.single
    }

    /// Field table of one 136-byte bank record.
    pub fn record_layout(&self) -> &Layout {
        &self.record
    }

    /// Whether `data` is a bank dump.
    pub fn is_bank(&self, data: &[u8]) -> bool {
        data.len() == BANK_LEN && data.starts_with(&HEADER) && data[TYPE_BYTE] == BANK_TYPE
    }

    fn check_frame(&self, data: &[u8], len: usize, kind: u8) -> Result<(), DecodeError> {
        if data.len() != len {
            return Err(DecodeError::WrongLength {
                expected: len,
                found: data.len(),
            });
        }
        if !data.starts_with(&HEADER) || data[TYPE_BYTE] != kind || data[len - 1] != SYSEX_END {
            return Err(DecodeError::BadHeader(NAME));
        }
        Ok(())
    }

    fn unpack(data: &[u8], offset: usize, len: usize) -> Result<Vec<u8>, DecodeError> {
        packing::denibblize(data, offset, len).ok_or(DecodeError::WrongLength {
            expected: offset + len * 2,
            found: data.len(),
        })
    }

    fn decode_single(&self, data: &[u8]) -> Result<ParameterModel, DecodeError> {
        self.check_frame(data, SINGLE_LEN, SINGLE_TYPE)?;
        let d = Self::unpack(data, DATA_START, SINGLE_DATA_LEN)?;
        debug!("SYSEX: D Station kit, data[0..8]: {:?}", &d[..8]);

        let mut model = self.schema.defaults();
        self.single.decode(&d, &mut model)?;
        self.schema.revise(&mut model)?;
        Ok(model)
    }

    /// Read the MIDI channels from a bank dump's footer, clamped to 1-16.
    pub fn channels(&self, data: &[u8]) -> Result<Channels, DecodeError> {
        self.check_frame(data, BANK_LEN, BANK_TYPE)?;
        let footer = Self::unpack(data, DATA_START + RECORDS * RECORD_LEN * 2, FOOTER_LEN)?;
        let channels = Channels {
            tx: footer[FOOTER_TX],
            rx: footer[FOOTER_RX],
        };
        Ok(channels.revised())
    }

    fn listing(&self, data: &[u8]) -> Result<BankListing, DecodeError> {
        let channels = self.channels(data)?;
        Ok(BankListing {
            records: (0..RECORDS)
                .map(|index| BankRecord {
                    index,
                    label: (index + FIRST_BANK_PROGRAM).to_string(),
                })
                .collect(),
            shared: vec![
                ("tx".to_string(), i32::from(channels.tx)),
                ("rx".to_string(), i32::from(channels.rx)),
            ],
        })
    }

    fn decode_bank_record(&self, data: &[u8], index: usize) -> Result<ParameterModel, DecodeError> {
        self.check_frame(data, BANK_LEN, BANK_TYPE)?;
        if index >= RECORDS {
            return Err(DecodeError::RecordOutOfRange {
                index,
                count: RECORDS,
            });
        }
        let d = Self::unpack(data, DATA_START + index * RECORD_LEN * 2, RECORD_LEN)?;

        let mut model = self.schema.defaults();
        self.record.decode(&d, &mut model)?;
        self.schema.revise(&mut model)?;
        Ok(model)
    }

    /// Emit a bank dump of exactly [`RECORDS`] kits.
    ///
    /// The bytes whose purpose is unknown are written as zero.
    pub fn encode_bank(
        &self,
        models: &[ParameterModel],
        channels: Channels,
    ) -> Result<Vec<u8>, CodecError> {
        if models.len() != RECORDS {
            return Err(CodecError::RecordCount {
                expected: RECORDS,
                found: models.len(),
            });
        }

        let mut sysex = vec![0u8; BANK_LEN];
        sysex[..HEADER.len()].copy_from_slice(&HEADER);
        sysex[TYPE_BYTE] = BANK_TYPE;

        let mut d = vec![0u8; RECORD_LEN];
        for (i, model) in models.iter().enumerate() {
            d.fill(0);
            self.record.encode(model, &mut d)?;
            packing::nibblize(&d, &mut sysex, DATA_START + i * RECORD_LEN * 2);
        }

        let channels = channels.revised();
        let mut footer = [0u8; FOOTER_LEN];
        footer[FOOTER_TX] = channels.tx;
        footer[FOOTER_RX] = channels.rx;
        packing::nibblize(&footer, &mut sysex, DATA_START + RECORDS * RECORD_LEN * 2);

        sysex[BANK_LEN - 1] = SYSEX_END;
        Ok(sysex)
    }
}

impl Codec for DStation {
    fn name(&self) -> &'static str {
        NAME
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn recognize(&self, data: &[u8]) -> bool {
        if data.len() <= TYPE_BYTE || !data.starts_with(&HEADER) {
            return false;
        }
        (data.len() == SINGLE_LEN && data[TYPE_BYTE] == SINGLE_TYPE)
            || (data.len() == BANK_LEN && data[TYPE_BYTE] == BANK_TYPE)
    }

    fn decode(&self, data: &[u8]) -> Decoded {
        if self.is_bank(data) {
            return match self.listing(data) {
                Ok(listing) => Decoded::NeedsSelection(listing),
                Err(e) => Decoded::Failed(e),
            };
        }
        self.decode_single(data).into()
    }

    fn decode_record(&self, data: &[u8], index: usize) -> Decoded {
        if data.get(TYPE_BYTE) != Some(&BANK_TYPE) {
            return Decoded::Failed(DecodeError::NotABank);
        }
        self.decode_bank_record(data, index).into()
    }

    fn encode(&self, model: &ParameterModel) -> Result<Vec<u8>, CodecError> {
        let mut sysex = vec![0u8; SINGLE_LEN];
        sysex[..HEADER.len()].copy_from_slice(&HEADER);
        sysex[TYPE_BYTE] = SINGLE_TYPE;

        let mut d = vec![0u8; SINGLE_DATA_LEN];
        self.single.encode(model, &mut d)?;
        packing::nibblize(&d, &mut sysex, DATA_START);

        sysex[SINGLE_LEN - 1] = SYSEX_END;
        Ok(sysex)
    }

    fn parameter_messages(
        &self,
        model: &ParameterModel,
        key: &str,
        channel: u8,
    ) -> Result<Vec<Vec<u8>>, CodecError> {
        let value = model.int(key).map_err(|source| CodecError::Model {
            device: NAME,
            source,
        })?;
        Ok(CC_PARAMETERS
            .iter()
            .position(|&p| p == key)
            .map(|i| vec![midi::cc(channel, FIRST_CC + i as i32, value)])
            .unwrap_or_default())
    }
}
