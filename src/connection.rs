use futures::{SinkExt, StreamExt};
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::TcpStream;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::debug;
use uuid::Uuid;

use crate::codec::FrameCodec;
use crate::frame::Frame;
use crate::Error;

/// A client socket split in two.
///
/// Frames are read on the owning task. Replies go through a channel to a writer task, so any
/// task holding a sender can answer the client and replies stay in the order they were sent.
pub struct Connection {
    pub id: Uuid,
    reader: FramedRead<OwnedReadHalf, FrameCodec>,
    replies: UnboundedSender<Frame>,
}

impl Connection {
    pub fn new(stream: TcpStream) -> Connection {
        Connection::with_codec(stream, FrameCodec::default())
    }

    pub fn with_codec(stream: TcpStream, codec: FrameCodec) -> Connection {
        let id = Uuid::new_v4();
        let (read_half, write_half) = stream.into_split();
        let (replies, mut rx) = mpsc::unbounded_channel::<Frame>();

        tokio::spawn(async move {
            let mut writer = FramedWrite::new(write_half, FrameCodec::default());

            while let Some(frame) = rx.recv().await {
                if writer.feed(frame).await.is_err() {
                    break;
                }
                // Flush once per batch of queued replies.
                while let Ok(frame) = rx.try_recv() {
                    if writer.feed(frame).await.is_err() {
                        return;
                    }
                }
                if let Err(e) = writer.flush().await {
                    debug!(connection_id = %id, "failed to write replies: {}", e);
                    break;
                }
            }
        });

        Connection {
            id,
            reader: FramedRead::new(read_half, codec),
            replies,
        }
    }

    /// Reads the next frame. `Ok(None)` means the peer closed the connection.
    pub async fn read_frame(&mut self) -> Result<Option<Frame>, Error> {
        self.reader.next().await.transpose()
    }

    pub fn write_frame(&self, frame: Frame) -> Result<(), Error> {
        self.replies
            .send(frame)
            .map_err(|_| "connection writer is closed".into())
    }

    /// A sender feeding this connection's writer.
    pub fn replies(&self) -> UnboundedSender<Frame> {
        self.replies.clone()
    }
}
