use crate::commands::executable::Executable;
use crate::commands::flushall::parse_flush_mode;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Keyspace;
use crate::Error;

/// Delete all the keys of the currently selected database.
///
/// Ref: <https://redis.io/docs/latest/commands/flushdb/>
#[derive(Debug, PartialEq)]
pub struct Flushdb;

impl Executable for Flushdb {
    fn exec(self, db: &mut Keyspace) -> Result<Frame, Error> {
        db.clear();
        Ok(Frame::Simple("OK".to_string()))
    }
}

impl TryFrom<&mut CommandParser> for Flushdb {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        parse_flush_mode(parser)?;
        Ok(Self)
    }
}
