//! Packing frames into fixed-size HID reports.
//!
//! The device exchanges 64-byte reports. Outgoing reports carry one frame,
//! left-aligned and padded with `0xFF`, behind a report-id byte that hidapi
//! expects first. Incoming reports carry one frame and arbitrary padding.

use bytes::{Bytes, BytesMut};

use crate::codec::{encode_frame, Frame};
use crate::error::{FrameError, Result};

/// Size of one HID report on the wire (excluding the report id).
pub const REPORT_SIZE: usize = 64;

/// Report id prepended to every outgoing report.
pub const REPORT_ID: u8 = 0x00;

/// Filler for unused trailing report bytes. Never a valid zero-argument opcode.
pub const REPORT_PADDING: u8 = 0xFF;

/// Largest length byte that fits in one report.
#[cfg(any(test, feature = "sim"))]
pub const MAX_REPORT_LENGTH_BYTE: u8 = (REPORT_SIZE - 1) as u8;

/// Build the buffer handed to the HID write call: report id + 64 bytes.
pub fn encode_report(frame: &Frame) -> Result<[u8; REPORT_SIZE + 1]> {
    if frame.wire_len() > REPORT_SIZE {
        return Err(FrameError::ReportOverflow {
            size: frame.wire_len(),
            max: REPORT_SIZE,
        });
    }

    let mut wire = BytesMut::with_capacity(frame.wire_len());
    encode_frame(frame, &mut wire)?;

    let mut report = [REPORT_PADDING; REPORT_SIZE + 1];
    report[0] = REPORT_ID;
    report[1..=wire.len()].copy_from_slice(&wire);
    Ok(report)
}

/// Extract the single frame carried by a received report.
///
/// Takes exactly the number of bytes the length byte declares and ignores
/// the rest as padding.
pub fn decode_report(report: &[u8]) -> Result<Frame> {
    let Some(&length) = report.first() else {
        return Err(FrameError::Truncated {
            declared: 0,
            available: 0,
        });
    };
    if length == 0 {
        return Err(FrameError::InvalidLength(length));
    }

    let declared = length as usize;
    let available = report.len() - 1;
    if declared > available {
        return Err(FrameError::Truncated {
            declared,
            available,
        });
    }

    let payload = Bytes::copy_from_slice(&report[1..declared]);
    let checksum = report[declared];
    Ok(Frame::from_parts(payload, checksum))
}

/// Build a padded 64-byte report as the device would send it.
///
/// For simulated devices; the host never sends reports without the report
/// id.
#[cfg(any(test, feature = "sim"))]
pub fn device_report(frame: &Frame) -> Result<[u8; REPORT_SIZE]> {
    let with_id = encode_report(frame)?;
    let mut report = [REPORT_PADDING; REPORT_SIZE];
    report.copy_from_slice(&with_id[1..]);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outgoing_report_layout() {
        let frame = Frame::command(0x34, &[0x01]);
        let report = encode_report(&frame).unwrap();

        assert_eq!(report.len(), 65);
        assert_eq!(report[0], REPORT_ID);
        assert_eq!(&report[1..5], &[0x03, 0x34, 0x01, 0x38]);
        assert!(report[5..].iter().all(|b| *b == REPORT_PADDING));
    }

    #[test]
    fn incoming_report_ignores_padding() {
        let mut report = [0u8; REPORT_SIZE];
        report[..6].copy_from_slice(&[0x05, 0x05, 0xFF, 0xD9, 0x01, 0x00]);
        // Zero padding instead of 0xFF must not matter either.
        let frame = decode_report(&report).unwrap();

        assert_eq!(frame.payload.as_ref(), &[0x05, 0xFF, 0xD9, 0x01]);
        assert_eq!(frame.checksum, 0x00);
    }

    #[test]
    fn device_report_roundtrip() {
        let frame = Frame::command(0x05, &[0xFF, 0xDA, 40, 1]);
        let report = device_report(&frame).unwrap();
        assert_eq!(decode_report(&report).unwrap(), frame);
    }

    #[test]
    fn largest_frame_fills_report() {
        let frame = Frame::new(vec![0x13; REPORT_SIZE - 2]);
        let report = encode_report(&frame).unwrap();
        assert_eq!(report[1], MAX_REPORT_LENGTH_BYTE);
        assert_eq!(report[64], frame.checksum);

        let decoded = decode_report(&report[1..]).unwrap();
        assert_eq!(decoded, frame);
    }

    #[test]
    fn oversized_frame_rejected() {
        let frame = Frame::new(vec![0x13; REPORT_SIZE - 1]);
        assert!(matches!(
            encode_report(&frame),
            Err(FrameError::ReportOverflow { size: 65, max: 64 })
        ));
    }

    #[test]
    fn overrunning_length_rejected() {
        let report = [0x10, 0x01, 0x02];
        assert!(matches!(
            decode_report(&report),
            Err(FrameError::Truncated {
                declared: 16,
                available: 2
            })
        ));
    }

    #[test]
    fn zero_length_rejected() {
        let report = [0u8; REPORT_SIZE];
        assert!(matches!(
            decode_report(&report),
            Err(FrameError::InvalidLength(0))
        ));
    }
}
