//! Length-prefixed frame codec.
//!
//! A frame is a 4-byte big-endian payload length followed by exactly that
//! many payload bytes. The prefix makes message boundaries explicit over
//! the byte stream — one decoded frame is one logical message no matter
//! how the reads split or merge.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

/// Maximum accepted payload size. Frames above this are a protocol error.
pub const MAX_FRAME_LEN: usize = 64 * 1024;

/// Codec turning the peer byte stream into discrete payloads.
#[derive(Debug, Default, Clone, Copy)]
pub struct FrameCodec;

impl Decoder for FrameCodec {
    type Item = BytesMut;
    type Error = std::io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<BytesMut>, Self::Error> {
        if src.len() < 4 {
            return Ok(None);
        }

        let mut prefix = [0u8; 4];
        prefix.copy_from_slice(&src[..4]);
        let len = u32::from_be_bytes(prefix) as usize;

        if len > MAX_FRAME_LEN {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("frame of {len} bytes exceeds the {MAX_FRAME_LEN} byte cap"),
            ));
        }

        if src.len() < 4 + len {
            src.reserve(4 + len - src.len());
            return Ok(None);
        }

        src.advance(4);
        Ok(Some(src.split_to(len)))
    }
}

impl Encoder<Bytes> for FrameCodec {
    type Error = std::io::Error;

    #[allow(clippy::cast_possible_truncation)] // length is bounded by MAX_FRAME_LEN
    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<(), Self::Error> {
        if item.len() > MAX_FRAME_LEN {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("refusing to send a {} byte frame", item.len()),
            ));
        }

        dst.reserve(4 + item.len());
        dst.put_u32(item.len() as u32);
        dst.extend_from_slice(&item);
        Ok(())
    }
}
