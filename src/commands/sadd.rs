use bytes::Bytes;
use std::collections::HashSet;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Keyspace;
use crate::value::Value;
use crate::Error;

/// Add the specified members to the set stored at key. Specified members that are already a
/// member of this set are ignored. If key does not exist, a new set is created before adding the
/// specified members.
///
/// Ref: <https://redis.io/docs/latest/commands/sadd/>
#[derive(Debug, PartialEq)]
pub struct Sadd {
    pub key: String,
    pub members: Vec<Bytes>,
}

impl Executable for Sadd {
    fn exec(self, db: &mut Keyspace) -> Result<Frame, Error> {
        let set = db
            .get_or_insert_with(&self.key, || Value::Set(HashSet::new()))
            .as_set_mut()?;

        let added = self
            .members
            .into_iter()
            .filter(|member| set.insert(member.clone()))
            .count();

        Ok(Frame::Integer(added as i64))
    }
}

impl TryFrom<&mut CommandParser> for Sadd {
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
