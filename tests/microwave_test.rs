use syxed::checksum;
use syxed::devices::microwave::{self, Microwave};
use syxed::{Codec, DecodeError, Decoded, Status};

mod common;
use common::{assert_round_trip, corrupted_frames, varied_model};

const CHECKSUM_BYTE: usize = 263;

#[test]
fn test_round_trip() {
    let mw = Microwave::default();
    let sysex = assert_round_trip(&mw, &mw.defaults());
    assert_eq!(sysex.len(), microwave::FRAME_LEN);
    for seed in 0..3 {
        assert_round_trip(&mw, &varied_model(&mw, seed));
    }
}

#[test]
fn test_zero_sum_checksum() {
    let mw = Microwave::default();
    let schema = mw.schema();
    let mut model = mw.defaults();

    // pad the data so it sums to a multiple of 128
    let sysex = mw.encode(&model).unwrap();
    let sum = checksum::sum7(&sysex[7..CHECKSUM_BYTE]);
    let pad = (128 - i32::from(sum)) % 128;
    schema.write(&mut model, "controlw", pad).unwrap();

    let sysex = mw.encode(&model).unwrap();
    assert_eq!(sysex[CHECKSUM_BYTE], 0x00);
    assert_eq!(mw.decode(&sysex).status(), Status::Success);
}

#[test]
fn test_checksum_excludes_location_bytes() {
    let mw = Microwave::new(5);
    let mut model = mw.defaults();
    let a = mw.encode(&model).unwrap();
    mw.schema().write(&mut model, "number", 77).unwrap();
    let b = mw.encode(&model).unwrap();
    assert_ne!(a[6], b[6]);
    assert_eq!(a[CHECKSUM_BYTE], b[CHECKSUM_BYTE]);
}

#[test]
fn test_wildcard_checksum_accepted() {
    let mw = Microwave::default();
    let mut sysex = mw.encode(&mw.defaults()).unwrap();
    // corrupt control X, then claim the wildcard
    sysex[7 + 2] = sysex[7 + 2].wrapping_add(9) & 0x7F;
    sysex[CHECKSUM_BYTE] = checksum::WILDCARD;

    let model = mw.decode(&sysex).into_model().unwrap();
    assert_eq!(model.int("controlx"), Ok(9));
}

#[test]
fn test_checksum_mismatch_fails() {
    let mw = Microwave::default();
    let mut model = mw.defaults();
    // the default multi happens to sum to the wildcard
    mw.schema().write(&mut model, "controlw", 5).unwrap();
    let mut sysex = mw.encode(&model).unwrap();
    let found = sysex[CHECKSUM_BYTE];
    assert_ne!(found, checksum::WILDCARD);
    sysex[7 + 2] = 9;

    let decoded = mw.decode(&sysex);
    assert_eq!(decoded.status(), Status::Failed);
    assert_eq!(
        decoded,
        Decoded::Failed(DecodeError::ChecksumMismatch {
            computed: (found + 9) & 0x7F,
            found,
        })
    );
}

#[test]
fn test_number_comes_from_stored_location() {
    let mw = Microwave::default();
    let mut model = mw.defaults();
    mw.schema().write(&mut model, "number", 12).unwrap();
    let mut sysex = mw.encode(&model).unwrap();

    assert_eq!(mw.decode(&sysex).into_model().unwrap().int("number"), Ok(12));

    // edit-buffer locations carry no multi number
    sysex[5] = microwave::EDIT_BUFFER;
    assert_eq!(mw.decode(&sysex).into_model().unwrap().int("number"), Ok(0));
}

#[test]
fn test_recognizer_rejects_corruption() {
    let mw = Microwave::default();
    let sysex = mw.encode(&mw.defaults()).unwrap();
    for bad in corrupted_frames(&sysex) {
        assert!(!mw.recognize(&bad), "recognized {} bytes", bad.len());
        assert_eq!(mw.decode(&bad).status(), Status::Failed);
    }

    // single-sound dumps share the length but not the command byte
    let mut sound = sysex.clone();
    sound[4] = 0x10;
    assert!(!mw.recognize(&sound));
}

#[test]
fn test_any_device_id_is_recognized() {
    let mw = Microwave::new(0);
    let other = Microwave::new(9);
    let sysex = other.encode(&other.defaults()).unwrap();
    assert_eq!(sysex[3], 9);
    assert!(mw.recognize(&sysex));
    assert_eq!(mw.decode(&sysex).status(), Status::Success);
}
