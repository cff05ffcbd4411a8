use bytes::Bytes;

use crate::client::Client;
use crate::commands::executable::ServerExecutable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::server::Redis;
use crate::Error;

/// Returns message.
///
/// Ref: <https://redis.io/docs/latest/commands/echo/>
#[derive(Debug, PartialEq)]
pub struct Echo {
    pub message: Bytes,
}

impl ServerExecutable for Echo {
    fn exec(self, _redis: &Redis, _client: &mut Client) -> Result<Frame, Error> {
        Ok(Frame::Bulk(self.message))
    }
}

impl TryFrom<&mut CommandParser> for Echo {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let message = parser.next_bytes()?;
        parser.finish()?;

        Ok(Self { message })
    }
}
