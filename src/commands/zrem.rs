use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Keyspace;
use crate::Error;

/// Removes the specified members from the sorted set stored at key. Non existing members are
/// ignored.
///
/// Ref: <https://redis.io/docs/latest/commands/zrem/>
#[derive(Debug, PartialEq)]
pub struct Zrem {
    pub key: String,
    pub members: Vec<String>,
}

impl Executable for Zrem {
    fn exec(self, db: &mut Keyspace) -> Result<Frame, Error> {
        let Some(value) = db.get_mut(&self.key) else {
            return Ok(Frame::Integer(0));
        };
        let zset = value.as_sorted_set_mut()?;

        let removed = self
            .members
            .iter()
            .filter(|member| zset.remove(member).is_some())
            .count();
        db.prune(&self.key);

        Ok(Frame::Integer(removed as i64))
    }
}

impl TryFrom<&mut CommandParser> for Zrem {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let members = parser.rest_strings()?;
        if members.is_empty() {
            return Err(CommandParserError::EndOfStream);
        }

        Ok(Self { key, members })
    }
}
