use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Keyspace;
use crate::Error;

/// Returns all the members of the set value stored at key, in byte order.
///
/// Ref: <https://redis.io/docs/latest/commands/smembers/>
#[derive(Debug, PartialEq)]
pub struct Smembers {
    pub key: String,
}

impl Executable for Smembers {
    fn exec(self, db: &mut Keyspace) -> Result<Frame, Error> {
        let Some(value) = db.get(&self.key) else {
            return Ok(Frame::Array(vec![]));
        };

        let mut members: Vec<_> = value.as_set()?.iter().cloned().collect();
        members.sort();

        Ok(Frame::Array(members.into_iter().map(Frame::Bulk).collect()))
    }
}

impl TryFrom<&mut CommandParser> for Smembers {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        parser.finish()?;
        Ok(Self { key })
    }
}
