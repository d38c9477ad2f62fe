//! Command frames and response parsers.
//!
//! This table is the compatibility surface with the hardware: opcodes,
//! selectors and operand layouts must match byte for byte. Responses are
//! inspected after the length byte has been stripped, so offset 0 is the
//! echoed opcode.

use minidsp_frame::Frame;

use crate::error::{DeviceError, Result};
use crate::types::{InputLevels, MasterStatus, Source};

/// Read an internal status register.
pub const OP_READ_STATUS: u8 = 0x05;
/// Read the input level meters.
pub const OP_READ_LEVELS: u8 = 0x14;
/// Write a 32-bit register value.
pub const OP_WRITE_REGISTER: u8 = 0x13;
/// Set the global mute flag.
pub const OP_SET_MUTE: u8 = 0x17;
/// Load a configuration preset.
pub const OP_SET_CONFIG: u8 = 0x25;
/// Upload one biquad section.
pub const OP_WRITE_BIQUAD: u8 = 0x30;
/// Select the input source.
pub const OP_SET_SOURCE: u8 = 0x34;
/// Set the master volume.
pub const OP_SET_VOLUME: u8 = 0x42;

pub const SEL_MASTER_STATUS: [u8; 3] = [0xFF, 0xDA, 0x02];
pub const SEL_SOURCE: [u8; 3] = [0xFF, 0xD9, 0x01];
pub const SEL_CONFIG_PRESET: [u8; 3] = [0xFF, 0xE5, 0x01];
pub const SEL_CONFIG_STATE: [u8; 3] = [0xFF, 0xE0, 0x01];
pub const SEL_INPUT_LEVELS: [u8; 3] = [0x00, 0x44, 0x02];

/// Register-write prefix for input channel parameters.
const INPUT_REGISTER_PREFIX: [u8; 2] = [0x80, 0x00];
/// Address-space marker in front of a biquad address.
const BIQUAD_PREFIX: u8 = 0x80;

pub const MIN_VOLUME_DB: f32 = -127.0;
pub const MAX_VOLUME_DB: f32 = 0.0;
pub const MIN_GAIN_DB: f32 = -127.0;
pub const MAX_GAIN_DB: f32 = 12.0;
pub const CONFIG_PRESETS: u8 = 4;
pub const BIQUAD_COEFFICIENTS: usize = 5;

/// Input mute flags. Not a boolean bit.
const INPUT_MUTED: u8 = 1;
const INPUT_UNMUTED: u8 = 2;

pub fn read_master_status() -> Frame {
    Frame::command(OP_READ_STATUS, &SEL_MASTER_STATUS)
}

/// Parse `05 ff da <volume> <mute>`.
pub fn parse_master_status(payload: &[u8]) -> Result<MasterStatus> {
    let body = expect_header(payload, OP_READ_STATUS, &SEL_MASTER_STATUS, 2)?;
    Ok(MasterStatus {
        volume_db: -0.5 * f32::from(body[0]),
        muted: body[1] != 0,
    })
}

/// Master volume: the magnitude is sent doubled, so -20 dB becomes 40.
pub fn set_volume(db: f32) -> Result<Frame> {
    check_range("volume", db, MIN_VOLUME_DB, MAX_VOLUME_DB)?;
    let raw = (db.abs() * 2.0).floor() as u8;
    Ok(Frame::command(OP_SET_VOLUME, &[raw]))
}

pub fn set_mute(muted: bool) -> Frame {
    Frame::command(OP_SET_MUTE, &[u8::from(muted)])
}

pub fn set_source(source: Source) -> Frame {
    Frame::command(OP_SET_SOURCE, &[source.index()])
}

pub fn read_source() -> Frame {
    Frame::command(OP_READ_STATUS, &SEL_SOURCE)
}

/// Parse `05 ff d9 <source>`.
pub fn parse_source(payload: &[u8]) -> Result<Source> {
    let body = expect_header(payload, OP_READ_STATUS, &SEL_SOURCE, 1)?;
    Source::try_from(body[0])
}

/// The four frames that load configuration preset `index`, in order.
///
/// Only the first selects the preset; the three reads that follow are what
/// the vendor application sends so the DSP refreshes its state.
pub fn set_config(index: u8) -> Result<[Frame; 4]> {
    if index >= CONFIG_PRESETS {
        return Err(DeviceError::InvalidArgument(format!(
            "configuration index {index} out of range 0..{}",
            CONFIG_PRESETS - 1
        )));
    }
    Ok([
        Frame::command(OP_SET_CONFIG, &[index, 0x01]),
        Frame::command(OP_READ_STATUS, &SEL_CONFIG_PRESET),
        Frame::command(OP_READ_STATUS, &SEL_CONFIG_STATE),
        Frame::command(OP_READ_STATUS, &SEL_MASTER_STATUS),
    ])
}

pub fn read_input_levels() -> Frame {
    Frame::command(OP_READ_LEVELS, &SEL_INPUT_LEVELS)
}

/// Parse `14 00 44 <f32 le> <f32 le>`.
pub fn parse_input_levels(payload: &[u8]) -> Result<InputLevels> {
    let body = expect_header(payload, OP_READ_LEVELS, &SEL_INPUT_LEVELS, 8)?;
    Ok(InputLevels {
        input1: read_f32_le(&body[0..4]),
        input2: read_f32_le(&body[4..8]),
    })
}

/// Gain register for input 1 or 2.
pub fn input_register(index: u8) -> Result<u8> {
    match index {
        1 => Ok(0x1A),
        2 => Ok(0x1B),
        other => Err(DeviceError::InvalidArgument(format!(
            "no such input channel: {other}"
        ))),
    }
}

pub fn set_input_mute(index: u8, muted: bool) -> Result<Frame> {
    input_register(index)?;
    let flag = if muted { INPUT_MUTED } else { INPUT_UNMUTED };
    let [p0, p1] = INPUT_REGISTER_PREFIX;
    Ok(Frame::command(
        OP_WRITE_REGISTER,
        &[p0, p1, index, flag, 0, 0, 0],
    ))
}

pub fn set_input_gain(index: u8, db: f32) -> Result<Frame> {
    let register = input_register(index)?;
    check_range("input gain", db, MIN_GAIN_DB, MAX_GAIN_DB)?;

    let mut operands = [0u8; 7];
    operands[..2].copy_from_slice(&INPUT_REGISTER_PREFIX);
    operands[2] = register;
    operands[3..].copy_from_slice(&db.to_le_bytes());
    Ok(Frame::command(OP_WRITE_REGISTER, &operands))
}

/// One biquad section: `30 80 <addr le16> <bank le16> <5 x f32 le>`.
pub fn write_biquad(address: u16, bank: u16, coefficients: &[f32]) -> Result<Frame> {
    if coefficients.len() != BIQUAD_COEFFICIENTS {
        return Err(DeviceError::InvalidArgument(format!(
            "a biquad takes exactly {BIQUAD_COEFFICIENTS} coefficients, got {}",
            coefficients.len()
        )));
    }
    if let Some(bad) = coefficients.iter().find(|c| !c.is_finite()) {
        return Err(DeviceError::InvalidArgument(format!(
            "biquad coefficient {bad} is not finite"
        )));
    }

    let mut operands = Vec::with_capacity(5 + 4 * BIQUAD_COEFFICIENTS);
    operands.push(BIQUAD_PREFIX);
    operands.extend_from_slice(&address.to_le_bytes());
    operands.extend_from_slice(&bank.to_le_bytes());
    for coefficient in coefficients {
        operands.extend_from_slice(&coefficient.to_le_bytes());
    }
    Ok(Frame::command(OP_WRITE_BIQUAD, &operands))
}

fn check_range(what: &str, value: f32, min: f32, max: f32) -> Result<()> {
    if !value.is_finite() || value < min || value > max {
        return Err(DeviceError::InvalidArgument(format!(
            "{what} {value} dB out of range {min}..{max} dB"
        )));
    }
    Ok(())
}

/// Check the echoed opcode and the first two selector bytes, returning the
/// body that follows them.
fn expect_header<'a>(
    payload: &'a [u8],
    opcode: u8,
    selector: &[u8; 3],
    body_len: usize,
) -> Result<&'a [u8]> {
    let header = [opcode, selector[0], selector[1]];
    if payload.len() < header.len() + body_len || payload[..header.len()] != header {
        return Err(DeviceError::Protocol(format!(
            "unexpected response {}",
            minidsp_frame::hex(payload)
        )));
    }
    Ok(&payload[header.len()..header.len() + body_len])
}

fn read_f32_le(bytes: &[u8]) -> f32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(bytes);
    f32::from_le_bytes(raw)
}
