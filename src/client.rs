use tokio::sync::mpsc::UnboundedSender;

use crate::frame::{Frame, Protocol};

/// Per connection state: the selected database and the negotiated protocol.
///
/// Replies are not written directly to the socket. They are pushed into the connection's reply
/// channel, which lets blocked commands be answered from whichever task unblocks them.
#[derive(Debug)]
pub struct Client {
    id: u64,
    db: usize,
    protocol: Protocol,
    replies: UnboundedSender<Frame>,
}

impl Client {
    pub fn new(id: u64, replies: UnboundedSender<Frame>) -> Client {
        Client {
            id,
            db: 0,
            protocol: Protocol::default(),
            replies,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn db(&self) -> usize {
        self.db
    }

    pub fn select(&mut self, db: usize) {
        self.db = db;
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn set_protocol(&mut self, protocol: Protocol) {
        self.protocol = protocol;
    }

    pub fn reply(&self, frame: Frame) {
        // The receiver only goes away with the connection, nobody is left to answer then.
        let _ = self.replies.send(frame.for_protocol(self.protocol));
    }

    /// A detached handle to answer this client later.
    pub fn handle(&self) -> ClientHandle {
        ClientHandle {
            id: self.id,
            protocol: self.protocol,
            replies: self.replies.clone(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ClientHandle {
    id: u64,
    protocol: Protocol,
    replies: UnboundedSender<Frame>,
}

impl ClientHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn reply(&self, frame: Frame) {
        let _ = self.replies.send(frame.for_protocol(self.protocol));
    }

    pub fn is_closed(&self) -> bool {
        self.replies.is_closed()
    }
}
