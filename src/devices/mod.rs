//! Device codecs and lookup by recognized frame.

pub mod dstation;
pub mod generic;
pub mod microwave;

pub use dstation::DStation;
pub use generic::Generic;
pub use microwave::Microwave;

use crate::codec::Codec;

/// Every supported device, with default configuration.
pub fn all() -> Vec<Box<dyn Codec>> {
    vec![
        Box::new(Generic::new()),
        Box::new(DStation::new()),
        Box::new(Microwave::default()),
    ]
}

/// The first codec in `codecs` that recognizes `data`.
pub fn identify<'a>(codecs: &'a [Box<dyn Codec>], data: &[u8]) -> Option<&'a dyn Codec> {
    codecs
        .iter()
        .find(|codec| codec.recognize(data))
        .map(|codec| codec.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identify_each_device() {
        let codecs = all();
        for codec in &codecs {
            let sysex = codec.encode(&codec.defaults()).unwrap();
            let found = identify(&codecs, &sysex).map(|c| c.name());
            assert_eq!(found, Some(codec.name()));
        }
        assert!(identify(&codecs, &[]).is_none());
        assert!(identify(&codecs, &[0xF0, 0x7E, 0x00, 0x06, 0x01, 0xF7]).is_none());
    }
}
