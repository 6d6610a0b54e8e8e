use syxed::devices::dstation::{self, Channels, DStation};
use syxed::{Codec, DecodeError, Decoded, ParameterModel, Status};

mod common;
use common::{assert_round_trip, corrupted_frames, varied_model};

fn fixture_bank(ds: &DStation) -> (Vec<ParameterModel>, Vec<u8>) {
    let models: Vec<ParameterModel> = (0..dstation::RECORDS as i32)
        .map(|seed| varied_model(ds, seed))
        .collect();
    let sysex = ds
        .encode_bank(&models, Channels { tx: 10, rx: 16 })
        .unwrap();
    (models, sysex)
}

#[test]
fn test_single_round_trip() {
    let ds = DStation::new();
    let sysex = assert_round_trip(&ds, &ds.defaults());
    assert_eq!(sysex.len(), 288);
    assert_eq!(&sysex[..7], &[0xF0, 0x00, 0x20, 0x29, 0x02, 0x01, 0x22]);
    // every payload byte is a nibble
    assert!(sysex[7..287].iter().all(|&b| b <= 0x0F));

    for seed in 0..4 {
        assert_round_trip(&ds, &varied_model(&ds, seed));
    }
}

#[test]
fn test_velocity_flags_share_bytes() {
    let ds = DStation::new();
    let schema = ds.schema();
    let mut model = ds.defaults();
    schema.write(&mut model, "909BDtunevelocity", 1).unwrap();
    schema.write(&mut model, "909BDtune", 0x25).unwrap();
    schema.write(&mut model, "909BDdistortion", 0x0A).unwrap();
    schema.write(&mut model, "909BDpan", 3).unwrap();

    let sysex = ds.encode(&model).unwrap();
    // byte 0 = 0xA5, byte 5 = 0xA3, high nibble first
    assert_eq!(&sysex[7..9], &[0x0A, 0x05]);
    assert_eq!(&sysex[17..19], &[0x0A, 0x03]);
}

#[test]
fn test_invalid_pan_code_falls_back() {
    let ds = DStation::new();
    let mut sysex = ds.encode(&ds.defaults()).unwrap();
    // low nibble of 909BD's distortion/pan byte
    sysex[7 + 5 * 2 + 1] = 0x0F;

    let model = ds.decode(&sysex).into_model().unwrap();
    assert_eq!(model.int("909BDpan"), Ok(13));
}

#[test]
fn test_out_of_range_codes_are_clamped() {
    let ds = DStation::new();
    let mut sysex = ds.encode(&ds.defaults()).unwrap();
    // bank A = 30, past the 27 drum voices
    sysex[7 + 129 * 2] = 0x01;
    sysex[7 + 129 * 2 + 1] = 0x0E;
    // 909RS front cut = 120 (byte 8, noteoff in bit 7)
    sysex[7 + 8 * 2] = 0x07;
    sysex[7 + 8 * 2 + 1] = 0x08;

    let model = ds.decode(&sysex).into_model().unwrap();
    assert_eq!(model.int("banka"), Ok(26));
    assert_eq!(model.int("909RSfrontcut"), Ok(99));
    assert_eq!(model.int("909RSnoteoff"), Ok(0));
}

#[test]
fn test_recognizer_rejects_corruption() {
    let ds = DStation::new();
    let single = ds.encode(&ds.defaults()).unwrap();
    let (_, bank) = fixture_bank(&ds);
    for sysex in [single, bank] {
        for bad in corrupted_frames(&sysex) {
            assert!(!ds.recognize(&bad), "recognized {} bytes", bad.len());
            assert_eq!(ds.decode(&bad).status(), Status::Failed);
        }
    }

    // a single-kit header on a bank-sized buffer
    let (_, mut bank) = fixture_bank(&ds);
    bank[6] = dstation::SINGLE_TYPE;
    assert!(!ds.recognize(&bank));
}

#[test]
fn test_bank_needs_selection() {
    let ds = DStation::new();
    let (_, sysex) = fixture_bank(&ds);
    assert_eq!(sysex.len(), 4104);
    assert!(ds.recognize(&sysex));

    let listing = match ds.decode(&sysex) {
        Decoded::NeedsSelection(listing) => listing,
        other => panic!("expected a selection, got {:?}", other),
    };
    assert_eq!(listing.records.len(), 15);
    assert_eq!(listing.records[0].label, "25");
    assert_eq!(listing.records[14].label, "39");
    assert_eq!(
        listing.shared,
        vec![("tx".to_string(), 10), ("rx".to_string(), 16)]
    );
    assert_eq!(ds.decode(&sysex).status(), Status::Cancelled);
}

#[test]
fn test_bank_records_round_trip() {
    let ds = DStation::new();
    let (models, sysex) = fixture_bank(&ds);
    assert_eq!(ds.channels(&sysex), Ok(Channels { tx: 10, rx: 16 }));

    for (i, model) in models.iter().enumerate() {
        let decoded = ds.decode_record(&sysex, i).into_model().unwrap();
        assert_eq!(&decoded, model, "record {}", i);
    }

    assert_eq!(
        ds.decode_record(&sysex, 15),
        Decoded::Failed(DecodeError::RecordOutOfRange {
            index: 15,
            count: 15,
        })
    );
    let single = ds.encode(&models[0]).unwrap();
    assert_eq!(
        ds.decode_record(&single, 0),
        Decoded::Failed(DecodeError::NotABank)
    );
}

#[test]
fn test_bank_gm_set_is_a_flag() {
    let ds = DStation::new();
    let (models, mut sysex) = fixture_bank(&ds);
    let record = 2;
    // gm set byte of record 2: any nonzero value means 909
    let at = 7 + record * 136 * 2 + 135 * 2;
    sysex[at] = 0x00;
    sysex[at + 1] = 0x01;

    let decoded = ds.decode_record(&sysex, record).into_model().unwrap();
    assert_eq!(decoded.int("gmset"), Ok(1));
    assert_eq!(decoded.int("banka"), models[record].int("banka"));
}

#[test]
fn test_footer_channels_are_clamped() {
    let ds = DStation::new();
    let (_, mut sysex) = fixture_bank(&ds);
    let footer = 7 + 15 * 136 * 2;
    // TX = 0xFF, RX = 0x00
    sysex[footer + 3 * 2] = 0x0F;
    sysex[footer + 3 * 2 + 1] = 0x0F;
    sysex[footer + 6 * 2] = 0x00;
    sysex[footer + 6 * 2 + 1] = 0x00;

    assert_eq!(ds.channels(&sysex), Ok(Channels { tx: 16, rx: 1 }));
    match ds.decode(&sysex) {
        Decoded::NeedsSelection(listing) => assert_eq!(
            listing.shared,
            vec![("tx".to_string(), 16), ("rx".to_string(), 1)]
        ),
        other => panic!("expected a selection, got {:?}", other),
    }

    let models = vec![ds.defaults(); dstation::RECORDS];
    let written = ds.encode_bank(&models, Channels { tx: 0, rx: 40 }).unwrap();
    assert_eq!(ds.channels(&written), Ok(Channels { tx: 1, rx: 16 }));
}

#[test]
fn test_encode_bank_needs_fifteen_kits() {
    let ds = DStation::new();
    let models = vec![ds.defaults(); 3];
    assert!(ds.encode_bank(&models, Channels { tx: 1, rx: 1 }).is_err());
}
