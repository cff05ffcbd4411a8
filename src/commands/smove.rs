use bytes::Bytes;
use std::collections::HashSet;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Keyspace;
use crate::value::Value;
use crate::Error;

/// Moves member from the set at source to the set at destination. This operation is atomic. In
/// every given moment the element will appear to be a member of source or destination for other
/// clients.
///
/// Ref: <https://redis.io/docs/latest/commands/smove/>
#[derive(Debug, PartialEq)]
pub struct Smove {
    pub source: String,
    pub destination: String,
    pub member: Bytes,
}

impl Executable for Smove {
    fn exec(self, db: &mut Keyspace) -> Result<Frame, Error> {
        let Some(source) = db.get(&self.source) else {
            return Ok(Frame::Integer(0));
        };
        let in_source = source.as_set()?.contains(&self.member);

        if let Some(destination) = db.get(&self.destination) {
            destination.as_set()?;
        }

        if !in_source {
            return Ok(Frame::Integer(0));
        }
        if self.source == self.destination {
            return Ok(Frame::Integer(1));
        }

        if let Some(source) = db.get_mut(&self.source) {
            source.as_set_mut()?.remove(&self.member);
        }
        db.prune(&self.source);

        db.get_or_insert_with(&self.destination, || Value::Set(HashSet::new()))
            .as_set_mut()?
            .insert(self.member);

        Ok(Frame::Integer(1))
    }
}

impl TryFrom<&mut CommandParser> for Smove {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let source = parser.next_string()?;
        let destination = parser.next_string()?;
        let member = parser.next_bytes()?;
        parser.finish()?;

        Ok(Self {
            source,
            destination,
            member,
        })
    }
}
