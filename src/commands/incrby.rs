use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Keyspace;
use crate::Error;

/// Increments the number stored at key by increment. If the key does not exist, it is set to 0
/// before performing the operation.
///
/// Ref: <https://redis.io/docs/latest/commands/incrby/>
#[derive(Debug, PartialEq)]
pub struct IncrBy {
    pub key: String,
    pub increment: i64,
}

impl Executable for IncrBy {
    fn exec(self, db: &mut Keyspace) -> Result<Frame, Error> {
        let value = db.incr_by(&self.key, self.increment)?;
        Ok(Frame::Integer(value))
    }
}

impl TryFrom<&mut CommandParser> for IncrBy {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let increment = parser.next_integer()?;
        parser.finish()?;

        Ok(Self { key, increment })
    }
}
