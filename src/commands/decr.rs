use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Keyspace;
use crate::Error;

/// Decrements the number stored at key by one. If the key does not exist, it is set to 0
/// before performing the operation.
///
/// Ref: <https://redis.io/docs/latest/commands/decr/>
#[derive(Debug, PartialEq)]
pub struct Decr {
    pub key: String,
}

impl Executable for Decr {
    fn exec(self, db: &mut Keyspace) -> Result<Frame, Error> {
        let value = db.incr_by(&self.key, -1i64)?;
        Ok(Frame::Integer(value))
    }
}

impl TryFrom<&mut CommandParser> for Decr {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        parser.finish()?;

        Ok(Self { key })
    }
}
