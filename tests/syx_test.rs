use syxed::devices::dstation::DStation;
use syxed::devices::generic::Generic;
use syxed::devices::microwave::Microwave;
use syxed::syx::{self, Reassembler};
use syxed::{devices, Codec, DecodeError, Decoded, Status};

#[test]
fn test_divided_frame_reassembles() {
    let generic = Generic::new();
    let mut model = generic.defaults();
    generic.schema().write(&mut model, "cc-7", 100).unwrap();
    let sysex = generic.encode(&model).unwrap();

    let fragments = syx::divide(&sysex, 256).unwrap();
    assert!(fragments.len() > 1);
    assert!(fragments.iter().all(|f| f.len() > 1));

    let mut reassembler = Reassembler::new(&generic);
    let (last, rest) = fragments.split_last().unwrap();
    for fragment in rest {
        assert_eq!(reassembler.push(fragment), Decoded::Incomplete);
    }
    assert_eq!(reassembler.pending(), sysex.len() - last.len());

    let decoded = reassembler.push(last).into_model().unwrap();
    assert_eq!(decoded.int("cc-7"), Ok(100));
    assert_eq!(reassembler.pending(), 0);
}

#[test]
fn test_divide_keeps_every_byte() {
    let ds = DStation::new();
    let sysex = ds.encode(&ds.defaults()).unwrap();
    // 288 = 41 * 7 + 1, so the last two fragments are rebalanced
    let fragments = syx::divide(&sysex, 7).unwrap();
    let lengths: Vec<usize> = fragments.iter().map(|f| f.len()).collect();
    assert_eq!(lengths.len(), 42);
    assert!(lengths[..40].iter().all(|&len| len == 7));
    assert_eq!(&lengths[40..], &[6, 2]);
    assert_eq!(fragments.concat(), sysex);
}

#[test]
fn test_divided_multi_has_no_bare_terminator() {
    let mw = Microwave::default();
    let sysex = mw.encode(&mw.defaults()).unwrap();
    let fragments = syx::divide(&sysex, 4).unwrap();

    let last = fragments.last().unwrap();
    assert_ne!(*last, &[0xF7][..]);
    assert!(fragments.iter().all(|f| f.len() <= 4));

    let mut reassembler = Reassembler::new(&mw);
    let decoded = fragments.iter().map(|f| reassembler.push(f)).last().unwrap();
    assert_eq!(decoded.status(), Status::Success);
}

#[test]
fn test_reassembler_rejects_missing_start() {
    let mw = Microwave::default();
    let sysex = mw.encode(&mw.defaults()).unwrap();

    let mut reassembler = Reassembler::new(&mw);
    assert_eq!(
        reassembler.push(&sysex[1..]),
        Decoded::Failed(DecodeError::BadHeader("sysex"))
    );
    assert_eq!(reassembler.pending(), 0);

    // the buffer is still usable afterwards
    assert_eq!(reassembler.push(&sysex).status(), Status::Success);
}

#[test]
fn test_read_file_identifies_each_device() {
    let codecs = devices::all();
    let generic = Generic::new();
    let ds = DStation::new();
    let mw = Microwave::new(3);

    let mut data = Vec::new();
    data.extend(generic.encode(&generic.defaults()).unwrap());
    data.extend([0xB0, 0x07, 0x40]);
    data.extend(ds.encode(&ds.defaults()).unwrap());
    data.extend(mw.encode(&mw.defaults()).unwrap());

    let path = std::env::temp_dir().join(format!("syxed-{}.syx", std::process::id()));
    std::fs::write(&path, &data).unwrap();
    let messages = syx::read_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    let names: Vec<&str> = messages
        .iter()
        .map(|m| devices::identify(&codecs, m).map_or("unknown", |c| c.name()))
        .collect();
    assert_eq!(names, vec![generic.name(), ds.name(), mw.name()]);
}

#[test]
fn test_read_file_missing() {
    let err = syx::read_file("/nonexistent/path/to.syx").unwrap_err();
    assert!(format!("{:#}", err).contains("Failed to read SYSEX file"));
}
