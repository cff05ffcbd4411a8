use crate::client::Client;
use crate::commands::executable::ServerExecutable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::server::Redis;
use crate::Error;

/// Marks the start of a transaction block. Transactions are not supported, commands keep running
/// as they arrive.
///
/// Ref: <https://redis.io/docs/latest/commands/multi/>
#[derive(Debug, PartialEq)]
pub struct Multi;

impl ServerExecutable for Multi {
    fn exec(self, _redis: &Redis, _client: &mut Client) -> Result<Frame, Error> {
        Ok(Frame::Simple("OK".to_string()))
    }
}

impl TryFrom<&mut CommandParser> for Multi {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        parser.finish()?;
        Ok(Self)
    }
}
