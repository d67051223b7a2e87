use super::protocol::Message;
use crate::{Error, Result};
use bytes::{Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder, LengthDelimitedCodec};

/// Largest frame accepted on a worker connection. An assignment frame holds a
/// whole range, so this also bounds the range size in remote mode.
pub const MAX_FRAME_BYTES: usize = 1 << 30;

/// `[u32 length][bincode Message]` frames.
pub struct WireCodec {
    frames: LengthDelimitedCodec,
}

impl WireCodec {
    pub fn new() -> Self {
        Self {
            frames: LengthDelimitedCodec::builder()
                .length_field_type::<u32>()
                .big_endian()
                .max_frame_length(MAX_FRAME_BYTES)
                .new_codec(),
        }
    }
}

impl Default for WireCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder<Message> for WireCodec {
    type Error = Error;

    fn encode(&mut self, item: Message, dst: &mut BytesMut) -> Result<()> {
        let payload = bincode::serde::encode_to_vec(&item, bincode::config::standard())?;
        self.frames.encode(Bytes::from(payload), dst)?;
        Ok(())
    }
}

impl Decoder for WireCodec {
    type Item = Message;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        match self.frames.decode(src)? {
            Some(frame) => {
                let (message, _read) =
                    bincode::serde::decode_from_slice(&frame, bincode::config::standard())?;
                Ok(Some(message))
            }
            None => Ok(None),
        }
    }
}
