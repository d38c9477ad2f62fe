//! `tokio_util` codec for frames carried on a raw byte stream.
//!
//! Stream reads may split or merge frames arbitrarily; the decoder buffers
//! until the length byte's worth of bytes has arrived and then yields
//! exactly one frame.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};
use tracing::trace;

use crate::codec::{decode_frame, encode_frame, hex, Frame};
use crate::error::FrameError;

/// Length-prefixed frame codec for TCP and other byte streams.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameCodec;

impl FrameCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for FrameCodec {
    type Item = Frame;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>, FrameError> {
        let frame = decode_frame(src)?;
        if let Some(frame) = &frame {
            trace!(payload = %hex(&frame.payload), buffered = src.len(), "decoded frame");
        }
        Ok(frame)
    }
}

impl Encoder<Frame> for FrameCodec {
    type Error = FrameError;

    fn encode(&mut self, frame: Frame, dst: &mut BytesMut) -> Result<(), FrameError> {
        encode_frame(&frame, dst)
    }
}

#[cfg(test)]
mod tests {
    use futures::{SinkExt, StreamExt};
    use tokio::io::AsyncWriteExt;
    use tokio_util::codec::{FramedRead, FramedWrite};

    use super::*;

    #[test]
    fn decoder_waits_for_split_frame() {
        let wire = Frame::command(0x13, &[0x80, 0x00, 0x1A, 0, 0, 0, 0])
            .to_bytes()
            .unwrap();
        let mut codec = FrameCodec::new();
        let mut buf = BytesMut::new();

        // Split mid-payload.
        buf.extend_from_slice(&wire[..4]);
        assert!(codec.decode(&mut buf).unwrap().is_none());

        buf.extend_from_slice(&wire[4..]);
        let frame = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(frame.opcode(), Some(0x13));
        assert!(frame.verify().is_ok());
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn decoder_splits_merged_frames() {
        let mut buf = BytesMut::new();
        buf.extend_from_slice(&Frame::command(0x42, &[40]).to_bytes().unwrap());
        buf.extend_from_slice(&Frame::command(0x17, &[0]).to_bytes().unwrap());
        // Start of a third frame.
        buf.extend_from_slice(&[0x05, 0x05]);

        let mut codec = FrameCodec::new();
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap().opcode(), Some(0x42));
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap().opcode(), Some(0x17));
        assert!(codec.decode(&mut buf).unwrap().is_none());
        assert_eq!(buf.len(), 2);
    }

    #[tokio::test]
    async fn framed_read_reassembles_across_writes() {
        let (mut tx, rx) = tokio::io::duplex(64);
        let wire = Frame::command(0x14, &[0x00, 0x44, 0x02]).to_bytes().unwrap();

        let writer = tokio::spawn(async move {
            tx.write_all(&wire[..2]).await.unwrap();
            tx.flush().await.unwrap();
            tokio::task::yield_now().await;
            tx.write_all(&wire[2..]).await.unwrap();
        });

        let mut frames = FramedRead::new(rx, FrameCodec::new());
        let frame = frames.next().await.unwrap().unwrap();
        assert_eq!(frame.payload.as_ref(), &[0x14, 0x00, 0x44, 0x02]);

        writer.await.unwrap();
        assert!(frames.next().await.is_none(), "stream ends after writer drops");
    }

    #[tokio::test]
    async fn framed_write_emits_wire_format() {
        let (tx, rx) = tokio::io::duplex(64);
        let mut sink = FramedWrite::new(tx, FrameCodec::new());
        sink.send(Frame::command(0x34, &[0x02])).await.unwrap();
        drop(sink);

        let mut frames = FramedRead::new(rx, FrameCodec::new());
        let frame = frames.next().await.unwrap().unwrap();
        assert_eq!(frame, Frame::command(0x34, &[0x02]));
    }
}
