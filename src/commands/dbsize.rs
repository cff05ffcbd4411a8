use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Keyspace;
use crate::Error;

/// Return the number of keys in the currently-selected database.
///
/// Ref: <https://redis.io/docs/latest/commands/dbsize/>
#[derive(Debug, PartialEq)]
pub struct DBSize;

impl Executable for DBSize {
    fn exec(self, db: &mut Keyspace) -> Result<Frame, Error> {
        Ok(Frame::Integer(db.len() as i64))
    }
}

impl TryFrom<&mut CommandParser> for DBSize {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        parser.finish()?;
        Ok(Self)
    }
}
