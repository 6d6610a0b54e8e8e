#![allow(dead_code)]

use syxed::schema::ParamKind;
use syxed::{Codec, Decoded, ParameterModel};

/// A model with every key moved away from its default, staying in bounds.
///
/// `seed` shifts the chosen values so different calls give different models.
pub fn varied_model(codec: &dyn Codec, seed: i32) -> ParameterModel {
    let schema = codec.schema();
    let mut model = codec.defaults();
    let keys: Vec<String> = schema.keys().map(str::to_string).collect();

    for (i, key) in keys.iter().enumerate() {
        match schema.kind(key) {
            Some(ParamKind::Int { .. }) => {
                let (min, max) = schema.bounds(key, &model).unwrap();
                let span = max - min + 1;
                let value = min + (i as i32 * 37 + seed * 11 + 5).rem_euclid(span);
                schema.write(&mut model, key, value).unwrap();
            }
            Some(ParamKind::Text { .. }) => {
                schema
                    .write_text(&mut model, key, &format!("Ed{} {}", seed, i))
                    .unwrap();
            }
            None => unreachable!(),
        }
    }
    schema.revise(&mut model).unwrap();
    model
}

/// Encode `model`, check the frame is recognized and decodes back to the
/// same model. Returns the frame.
pub fn assert_round_trip(codec: &dyn Codec, model: &ParameterModel) -> Vec<u8> {
    let sysex = codec.encode(model).unwrap();
    assert!(
        codec.recognize(&sysex),
        "{} does not recognize its own frame",
        codec.name()
    );

    match codec.decode(&sysex) {
        Decoded::Complete(decoded) => {
            for (key, value) in model.iter() {
                assert_eq!(
                    decoded.get(key),
                    Some(value),
                    "{}: '{}' did not survive a round trip",
                    codec.name(),
                    key
                );
            }
            assert_eq!(codec.encode(&decoded).unwrap(), sysex);
        }
        other => panic!("{}: expected a complete decode, got {:?}", codec.name(), other),
    }
    sysex
}

/// Buffers that must never be recognized as `sysex`'s device.
pub fn corrupted_frames(sysex: &[u8]) -> Vec<Vec<u8>> {
    let mut wrong_header = sysex.to_vec();
    wrong_header[1] ^= 0x01;
    let mut long = sysex.to_vec();
    long.push(0xF7);

    vec![
        Vec::new(),
        vec![0xF0],
        sysex[..sysex.len() - 1].to_vec(),
        sysex[..7].to_vec(),
        long,
        wrong_header,
    ]
}
