use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::frame::{self, Frame};
use crate::Error;

/// Default limit for a single buffered request, the same as Redis' `proto-max-bulk-len`.
pub const DEFAULT_MAX_FRAME_SIZE: usize = 512 * 1024 * 1024;

pub struct FrameCodec {
    max_frame_size: usize,
}

impl FrameCodec {
    pub fn new(max_frame_size: usize) -> FrameCodec {
        FrameCodec { max_frame_size }
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        FrameCodec::new(DEFAULT_MAX_FRAME_SIZE)
    }
}

impl Decoder for FrameCodec {
    type Item = Frame;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match Frame::decode(&src[..])? {
            Some((frame, consumed)) => {
                // Remove the parsed frame from the buffer.
                src.advance(consumed);
                Ok(Some(frame))
            }
            // A frame that still isn't complete past the limit is never going to be accepted.
            None if src.len() > self.max_frame_size => Err(frame::Error::TooLarge {
                size: src.len(),
                limit: self.max_frame_size,
            }
            .into()),
            None => Ok(None), // Not enough data to parse a frame.
        }
    }
}

impl Encoder<Frame> for FrameCodec {
    type Error = Error;

    fn encode(&mut self, frame: Frame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.extend_from_slice(&frame.serialize());
        Ok(())
    }
}
