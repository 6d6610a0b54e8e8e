//! Low-level byte transforms shared by the device field tables.
//!
//! Everything here is total: inputs are masked to the width of the target
//! field, so out-of-range values are truncated deterministically instead of
//! spilling into neighbouring bits.

/// Mask for a single nibble
pub const NIBBLE_MASK: u8 = 0x0F;

/// Mask for a 7-bit sysex data byte
pub const DATA_MASK: u8 = 0x7F;

/// Largest value a 14-bit MSB/LSB pair can carry
pub const MAX_14BIT: i32 = 0x3FFF;

/// Expand `data` into high/low nibble pairs, writing them into `out`
/// starting at `offset`.
///
/// # Panics
///
/// Panics if `out` is shorter than `offset + 2 * data.len()`. Encoders size
/// their frames up front, so this only fires on a broken frame layout.
pub fn nibblize(data: &[u8], out: &mut [u8], offset: usize) {
    let dest = &mut out[offset..offset + data.len() * 2];
    for (pair, &byte) in dest.chunks_exact_mut(2).zip(data) {
        pair[0] = (byte >> 4) & NIBBLE_MASK;
        pair[1] = byte & NIBBLE_MASK;
    }
}

/// Rebuild `len` bytes from the nibble pairs starting at `offset`.
///
/// Returns `None` when `nibbles` does not hold `2 * len` bytes past `offset`.
/// Stray high bits in a nibble are masked off.
pub fn denibblize(nibbles: &[u8], offset: usize, len: usize) -> Option<Vec<u8>> {
    let src = nibbles.get(offset..offset + len * 2)?;
    Some(
        src.chunks_exact(2)
            .map(|pair| ((pair[0] & NIBBLE_MASK) << 4) | (pair[1] & NIBBLE_MASK))
            .collect(),
    )
}

/// One contiguous run of bits inside a byte.
///
/// `shift` counts from bit 0 (least significant). A field that straddles a
/// byte boundary, or is scattered over several bytes, is described by a list
/// of slices ordered from the field's low bits to its high bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitSlice {
    /// Byte index within the buffer
    pub byte: usize,
    /// Position of the slice's lowest bit within the byte
    pub shift: u8,
    /// Number of bits in the slice
    pub width: u8,
}

impl BitSlice {
    /// Describe `width` bits of byte `byte` starting at bit `shift`.
    pub const fn new(byte: usize, shift: u8, width: u8) -> Self {
        Self { byte, shift, width }
    }

    fn mask(&self) -> u32 {
        (1u32 << self.width) - 1
    }
}

/// Total width in bits of a multi-slice field.
pub fn bit_width(slices: &[BitSlice]) -> u32 {
    slices.iter().map(|s| u32::from(s.width)).sum()
}

/// Write `value` into the bits described by `slices`, low bits first.
///
/// Bits of `value` beyond the total slice width are discarded. Bits of the
/// target bytes outside the slices are left untouched.
pub fn pack_bits(buf: &mut [u8], slices: &[BitSlice], value: u32) {
    let mut consumed = 0u32;
    for slice in slices {
        debug_assert!(slice.shift + slice.width <= 8);
        let mask = slice.mask();
        let part = (value >> consumed) & mask;
        let cleared = u32::from(buf[slice.byte]) & !(mask << slice.shift);
        buf[slice.byte] = (cleared | (part << slice.shift)) as u8;
        consumed += u32::from(slice.width);
    }
}

/// Read back a value written by [`pack_bits`].
pub fn unpack_bits(buf: &[u8], slices: &[BitSlice]) -> u32 {
    let mut value = 0u32;
    let mut consumed = 0u32;
    for slice in slices {
        let part = (u32::from(buf[slice.byte]) >> slice.shift) & slice.mask();
        value |= part << consumed;
        consumed += u32::from(slice.width);
    }
    value
}

/// Split a 14-bit value into its MSB and LSB 7-bit halves.
pub fn split_14bit(value: i32) -> [u8; 2] {
    [((value >> 7) & 0x7F) as u8, (value & 0x7F) as u8]
}

/// Join an MSB/LSB pair back into a 14-bit value.
pub fn join_14bit(msb: u8, lsb: u8) -> i32 {
    (i32::from(msb & DATA_MASK) << 7) | i32::from(lsb & DATA_MASK)
}

/// Pack a 1-bit flag into bit 7 and a 7-bit value into bits 0-6.
pub fn pack_flagged(flag: i32, value: i32) -> u8 {
    (((flag & 0x01) << 7) | (value & 0x7F)) as u8
}

/// Split a byte written by [`pack_flagged`] into `(flag, value)`.
pub fn unpack_flagged(byte: u8) -> (i32, i32) {
    (i32::from(byte >> 7), i32::from(byte & DATA_MASK))
}

/// Whether `c` survives a trip through a 7-bit-clean device unchanged.
pub fn is_printable(c: char) -> bool {
    (' '..='~').contains(&c)
}

/// Render `name` as exactly `width` bytes: non-printable characters become
/// spaces, long names are cut, short names are padded with spaces.
pub fn encode_name(name: &str, width: usize) -> Vec<u8> {
    let mut out: Vec<u8> = name
        .chars()
        .take(width)
        .map(|c| if is_printable(c) { c as u8 } else { b' ' })
        .collect();
    out.resize(width, b' ');
    out
}

/// Read a padded name field, dropping trailing whitespace.
pub fn decode_name(bytes: &[u8]) -> String {
    let name: String = bytes
        .iter()
        .map(|&b| {
            let c = char::from(b);
            if is_printable(c) {
                c
            } else {
                ' '
            }
        })
        .collect();
    name.trim_end().to_string()
}
