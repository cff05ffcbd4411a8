use crate::client::Client;
use crate::commands::executable::ServerExecutable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::server::Redis;
use crate::Error;

/// Flushes all previously queued commands in a transaction. Nothing is ever queued.
///
/// Ref: <https://redis.io/docs/latest/commands/discard/>
#[derive(Debug, PartialEq)]
pub struct Discard;

impl ServerExecutable for Discard {
    fn exec(self, _redis: &Redis, _client: &mut Client) -> Result<Frame, Error> {
        Ok(Frame::Simple("OK".to_string()))
    }
}

impl TryFrom<&mut CommandParser> for Discard {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        parser.finish()?;
        Ok(Self)
    }
}
