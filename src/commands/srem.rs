use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Keyspace;
use crate::Error;

/// Remove the specified members from the set stored at key. The set is deleted once it has no
/// members left.
///
/// Ref: <https://redis.io/docs/latest/commands/srem/>
#[derive(Debug, PartialEq)]
pub struct Srem {
    pub key: String,
    pub members: Vec<Bytes>,
}

impl Executable for Srem {
    fn exec(self, db: &mut Keyspace) -> Result<Frame, Error> {
        let Some(value) = db.get_mut(&self.key) else {
            return Ok(Frame::Integer(0));
        };
        let set = value.as_set_mut()?;

        let removed = self
            .members
            .iter()
            .filter(|member| set.remove(*member))
            .count();
        db.prune(&self.key);

        Ok(Frame::Integer(removed as i64))
    }
}

impl TryFrom<&mut CommandParser> for Srem {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let members = parser.rest_bytes()?;
        if members.is_empty() {
            return Err(CommandParserError::EndOfStream);
        }

        Ok(Self { key, members })
    }
}
