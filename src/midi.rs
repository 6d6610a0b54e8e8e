//! Channel-voice messages used for live parameter edits.

use crate::packing;

const CONTROL_CHANGE: u8 = 0xB0;
const PITCH_BEND: u8 = 0xE0;

const NRPN_MSB: u8 = 99;
const NRPN_LSB: u8 = 98;
const RPN_MSB: u8 = 101;
const RPN_LSB: u8 = 100;
const DATA_ENTRY_MSB: u8 = 6;
const DATA_ENTRY_LSB: u8 = 38;

/// RPN 0
pub const RPN_PITCH_BEND_RANGE: i32 = 0;
/// RPN 1
pub const RPN_FINE_TUNING: i32 = 1;
/// RPN 2
pub const RPN_COARSE_TUNING: i32 = 2;

/// A single Control Change.
pub fn cc(channel: u8, number: i32, value: i32) -> Vec<u8> {
    vec![
        CONTROL_CHANGE | (channel & 0x0F),
        (number & 0x7F) as u8,
        (value & 0x7F) as u8,
    ]
}

/// A 14-bit Control Change: MSB on `number`, LSB on `number + 32`.
pub fn long_cc(channel: u8, number: i32, value: i32) -> Vec<Vec<u8>> {
    let [msb, lsb] = packing::split_14bit(value);
    vec![
        cc(channel, number, i32::from(msb)),
        cc(channel, number + 32, i32::from(lsb)),
    ]
}

fn parameter_number(channel: u8, select: (u8, u8), param: i32, value: i32) -> Vec<Vec<u8>> {
    let [param_msb, param_lsb] = packing::split_14bit(param);
    let [value_msb, value_lsb] = packing::split_14bit(value);
    vec![
        cc(channel, i32::from(select.0), i32::from(param_msb)),
        cc(channel, i32::from(select.1), i32::from(param_lsb)),
        cc(channel, i32::from(DATA_ENTRY_MSB), i32::from(value_msb)),
        cc(channel, i32::from(DATA_ENTRY_LSB), i32::from(value_lsb)),
    ]
}

/// NRPN select followed by 14-bit data entry.
pub fn nrpn(channel: u8, param: i32, value: i32) -> Vec<Vec<u8>> {
    parameter_number(channel, (NRPN_MSB, NRPN_LSB), param, value)
}

/// RPN select followed by 14-bit data entry.
pub fn rpn(channel: u8, param: i32, value: i32) -> Vec<Vec<u8>> {
    parameter_number(channel, (RPN_MSB, RPN_LSB), param, value)
}

/// Pitch bend, LSB first as the wire format requires. 8192 is centre.
pub fn pitch_bend(channel: u8, value: i32) -> Vec<u8> {
    let [msb, lsb] = packing::split_14bit(value);
    vec![PITCH_BEND | (channel & 0x0F), lsb, msb]
}
