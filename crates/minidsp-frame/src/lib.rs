//! Length-prefixed, checksummed framing for the miniDSP HID protocol.
//!
//! Every command and response is framed as:
//! - A 1-byte length `N` counting the payload and the checksum
//! - The payload: an opcode followed by opcode-specific operands
//! - A 1-byte checksum, the 8-bit sum of `N` and every payload byte
//!
//! There is no byte stuffing. Boundaries come from the length byte alone,
//! either one frame per 64-byte HID report ([`report`]) or back to back on
//! a byte stream ([`FrameCodec`]).

pub mod codec;
pub mod error;
pub mod report;
pub mod stream;

pub use codec::{checksum, decode_frame, encode_frame, hex, Frame, MAX_LENGTH_BYTE, MAX_PAYLOAD};
pub use error::{FrameError, Result};
pub use report::{decode_report, encode_report, REPORT_ID, REPORT_PADDING, REPORT_SIZE};
#[cfg(feature = "sim")]
pub use report::{device_report, MAX_REPORT_LENGTH_BYTE};
pub use stream::FrameCodec;
