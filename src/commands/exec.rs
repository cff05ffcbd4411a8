use crate::client::Client;
use crate::commands::executable::ServerExecutable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::server::Redis;
use crate::Error;

/// Ends a transaction block. Commands were already run as they arrived, so there is nothing left
/// to execute.
///
/// Ref: <https://redis.io/docs/latest/commands/exec/>
#[derive(Debug, PartialEq)]
pub struct Exec;

impl ServerExecutable for Exec {
    fn exec(self, _redis: &Redis, _client: &mut Client) -> Result<Frame, Error> {
        Ok(Frame::Array(vec![]))
    }
}

impl TryFrom<&mut CommandParser> for Exec {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        parser.finish()?;
        Ok(Self)
    }
}
