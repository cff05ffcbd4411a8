use crate::client::Client;
use crate::commands::executable::ServerExecutable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::server::Redis;
use crate::Error;

/// Delete all the keys of all the existing databases. `ASYNC` and `SYNC` are accepted, flushing is
/// always synchronous.
///
/// Ref: <https://redis.io/docs/latest/commands/flushall/>
#[derive(Debug, PartialEq)]
pub struct Flushall;

impl ServerExecutable for Flushall {
    fn exec(self, redis: &Redis, _client: &mut Client) -> Result<Frame, Error> {
        redis.flush_all();
        Ok(Frame::Simple("OK".to_string()))
    }
}

impl TryFrom<&mut CommandParser> for Flushall {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        parse_flush_mode(parser)?;
        Ok(Self)
    }
}

/// Validates the optional `ASYNC | SYNC` argument of the flush commands.
pub(crate) fn parse_flush_mode(parser: &mut CommandParser) -> Result<(), CommandParserError> {
    if parser.has_next() {
        match parser.next_keyword()?.as_str() {
            "ASYNC" | "SYNC" => {}
            _ => return Err(CommandParserError::Syntax),
        }
    }
    parser.finish()
}
