use std::fmt;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Largest value the length byte can carry.
pub const MAX_LENGTH_BYTE: u8 = u8::MAX;

/// Largest payload (opcode + operands) a single frame can carry.
pub const MAX_PAYLOAD: usize = MAX_LENGTH_BYTE as usize - 1;

/// One logical unit of the wire protocol: a command or a response.
///
/// The payload starts with the opcode. The length byte is not stored; it is
/// derived from the payload when the frame is encoded.
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    /// Opcode followed by its operands (or the response body).
    pub payload: Bytes,
    /// Checksum byte as carried on the wire.
    pub checksum: u8,
}

impl Frame {
    /// Create a frame with a freshly computed checksum.
    ///
    /// Payloads longer than [`MAX_PAYLOAD`] are rejected by [`encode_frame`].
    pub fn new(payload: impl Into<Bytes>) -> Self {
        let payload = payload.into();
        let checksum = checksum(length_byte_for(payload.len()), &payload);
        Self { payload, checksum }
    }

    /// Create a frame from an opcode and its operands.
    pub fn command(opcode: u8, operands: &[u8]) -> Self {
        let mut payload = BytesMut::with_capacity(1 + operands.len());
        payload.put_u8(opcode);
        payload.put_slice(operands);
        Self::new(payload.freeze())
    }

    /// Create a frame from parts received on the wire, without verification.
    pub fn from_parts(payload: impl Into<Bytes>, checksum: u8) -> Self {
        Self {
            payload: payload.into(),
            checksum,
        }
    }

    /// The first payload byte, if any.
    pub fn opcode(&self) -> Option<u8> {
        self.payload.first().copied()
    }

    /// Value of the length byte: payload plus checksum, excluding itself.
    pub fn length_byte(&self) -> u8 {
        length_byte_for(self.payload.len())
    }

    /// Total bytes on the wire (length byte + payload + checksum).
    pub fn wire_len(&self) -> usize {
        self.payload.len() + 2
    }

    /// The checksum this frame should carry.
    pub fn expected_checksum(&self) -> u8 {
        checksum(self.length_byte(), &self.payload)
    }

    /// Check the carried checksum against the frame contents.
    pub fn verify(&self) -> Result<()> {
        let expected = self.expected_checksum();
        if expected != self.checksum {
            return Err(FrameError::ChecksumMismatch {
                expected,
                actual: self.checksum,
            });
        }
        Ok(())
    }

    /// Encode this frame into a standalone buffer.
    pub fn to_bytes(&self) -> Result<Bytes> {
        let mut buf = BytesMut::with_capacity(self.wire_len());
        encode_frame(self, &mut buf)?;
        Ok(buf.freeze())
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("payload", &hex(&self.payload))
            .field("checksum", &format_args!("{:#04x}", self.checksum))
            .finish()
    }
}

/// 8-bit truncated sum of the length byte and all payload bytes.
pub fn checksum(length_byte: u8, payload: &[u8]) -> u8 {
    payload
        .iter()
        .fold(length_byte, |sum, byte| sum.wrapping_add(*byte))
}

fn length_byte_for(payload_len: usize) -> u8 {
    // Saturates for payloads that encode_frame rejects.
    u8::try_from(payload_len + 1).unwrap_or(MAX_LENGTH_BYTE)
}

/// Encode a frame into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────────┬─────────────────────────┬──────────┐
/// │ N (1B)   │ Opcode + operands       │ Checksum │
/// │          │ (N - 1 bytes)           │ (1B)     │
/// └──────────┴─────────────────────────┴──────────┘
/// ```
///
/// `N` counts the payload and the checksum but not itself. The checksum is
/// the carried value; use [`Frame::new`] to get a correct one.
pub fn encode_frame(frame: &Frame, dst: &mut BytesMut) -> Result<()> {
    if frame.payload.len() > MAX_PAYLOAD {
        return Err(FrameError::PayloadTooLarge {
            size: frame.payload.len(),
            max: MAX_PAYLOAD,
        });
    }
    dst.reserve(frame.wire_len());
    dst.put_u8(frame.length_byte());
    dst.put_slice(&frame.payload);
    dst.put_u8(frame.checksum);
    Ok(())
}

/// Decode a frame from a byte stream buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet.
/// On success, consumes exactly one frame from the buffer.
pub fn decode_frame(src: &mut BytesMut) -> Result<Option<Frame>> {
    let Some(&length) = src.first() else {
        return Ok(None);
    };
    if length == 0 {
        return Err(FrameError::InvalidLength(length));
    }

    let total = 1 + length as usize;
    if src.len() < total {
        src.reserve(total - src.len());
        return Ok(None);
    }

    src.advance(1);
    let payload = src.split_to(length as usize - 1).freeze();
    let checksum = src.get_u8();

    Ok(Some(Frame { payload, checksum }))
}

/// Lowercase hex rendering used in logs.
pub fn hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 3);
    for (i, byte) in bytes.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_layout() {
        let frame = Frame::command(0x42, &[40]);
        let wire = frame.to_bytes().unwrap();
        // N = opcode + operand + checksum
        assert_eq!(wire.as_ref(), &[0x03, 0x42, 40, 0x03 + 0x42 + 40]);
    }

    #[test]
    fn test_oversized_payload_never_reports_zero_length() {
        let frame = Frame::new(vec![0u8; MAX_PAYLOAD + 1]);
        assert_eq!(frame.length_byte(), MAX_LENGTH_BYTE);
        assert!(matches!(
            frame.to_bytes(),
            Err(FrameError::PayloadTooLarge { size: 255, max: 254 })
        ));

        let largest = Frame::new(vec![0u8; MAX_PAYLOAD]);
        assert_eq!(largest.length_byte(), MAX_LENGTH_BYTE);
        assert_eq!(largest.to_bytes().unwrap().len(), 256);
    }

    #[test]
    fn test_length_and_checksum_for_all_operand_lengths() {
        for len in 0..=62usize {
            let operands: Vec<u8> = (0..len).map(|i| (i as u8).wrapping_mul(37)).collect();
            let frame = Frame::command(0xA5, &operands);
            let wire = frame.to_bytes().unwrap();

            let length_byte = wire[0];
            assert_eq!(length_byte as usize, len + 2);

            let expected = operands
                .iter()
                .fold(length_byte.wrapping_add(0xA5), |s, b| s.wrapping_add(*b));
            assert_eq!(*wire.last().unwrap(), expected);
            assert_eq!(wire.len(), len + 3);
        }
    }

    #[test]
    fn test_checksum_wraps() {
        let frame = Frame::command(0xFF, &[0xFF, 0xFF]);
        assert_eq!(frame.length_byte(), 4);
        assert_eq!(frame.checksum, ((4u32 + 0xFF * 3) % 256) as u8);
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let frame = Frame::command(0x05, &[0xFF, 0xDA, 0x02]);
        let mut buf = BytesMut::new();
        encode_frame(&frame, &mut buf).unwrap();

        let decoded = decode_frame(&mut buf).unwrap().unwrap();
        assert_eq!(decoded, frame);
        assert!(decoded.verify().is_ok());
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_empty_buffer() {
        let mut buf = BytesMut::new();
        assert!(decode_frame(&mut buf).unwrap().is_none());
    }

    #[test]
    fn test_decode_incomplete_payload() {
        let wire = Frame::command(0x14, &[0x00, 0x44, 0x02]).to_bytes().unwrap();
        let mut buf = BytesMut::from(&wire[..3]);

        assert!(decode_frame(&mut buf).unwrap().is_none());
        assert_eq!(buf.len(), 3, "incomplete frames are left in place");
    }

    #[test]
    fn test_decode_zero_length_rejected() {
        let mut buf = BytesMut::from(&[0x00, 0x01][..]);
        assert!(matches!(
            decode_frame(&mut buf),
            Err(FrameError::InvalidLength(0))
        ));
    }

    #[test]
    fn test_decode_checksum_only_frame() {
        let mut buf = BytesMut::from(&[0x01, 0x01][..]);
        let frame = decode_frame(&mut buf).unwrap().unwrap();
        assert!(frame.payload.is_empty());
        assert_eq!(frame.opcode(), None);
        assert!(frame.verify().is_ok());
    }

    #[test]
    fn test_multiple_frames() {
        let mut buf = BytesMut::new();
        encode_frame(&Frame::command(0x42, &[2]), &mut buf).unwrap();
        encode_frame(&Frame::command(0x17, &[1]), &mut buf).unwrap();

        let f1 = decode_frame(&mut buf).unwrap().unwrap();
        assert_eq!(f1.opcode(), Some(0x42));

        let f2 = decode_frame(&mut buf).unwrap().unwrap();
        assert_eq!(f2.payload.as_ref(), &[0x17, 1]);

        assert!(buf.is_empty());
    }

    #[test]
    fn test_verify_detects_corruption() {
        let mut buf = BytesMut::from(&[0x03, 0x42, 40, 0x00][..]);
        let frame = decode_frame(&mut buf).unwrap().unwrap();
        assert!(matches!(
            frame.verify(),
            Err(FrameError::ChecksumMismatch {
                expected: 0x6d,
                actual: 0x00
            })
        ));
    }

    #[test]
    fn test_payload_too_large() {
        let frame = Frame::new(vec![0u8; MAX_PAYLOAD + 1]);
        let mut buf = BytesMut::new();
        assert!(matches!(
            encode_frame(&frame, &mut buf),
            Err(FrameError::PayloadTooLarge { .. })
        ));
    }

    #[test]
    fn test_largest_frame_roundtrip() {
        let frame = Frame::new(vec![0x11; MAX_PAYLOAD]);
        let wire = frame.to_bytes().unwrap();
        assert_eq!(wire[0], MAX_LENGTH_BYTE);

        let mut buf = BytesMut::from(wire.as_ref());
        assert_eq!(decode_frame(&mut buf).unwrap().unwrap(), frame);
    }

    #[test]
    fn test_hex() {
        assert_eq!(hex(&[0x05, 0xff, 0xda]), "05 ff da");
        assert_eq!(hex(&[]), "");
    }
}
