use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Keyspace;
use crate::Error;

/// Returns whether each member is a member of the set stored at key, in the order they were
/// given.
///
/// Ref: <https://redis.io/docs/latest/commands/smismember/>
#[derive(Debug, PartialEq)]
pub struct Smismember {
    pub key: String,
    pub members: Vec<Bytes>,
}

impl Executable for Smismember {
    fn exec(self, db: &mut Keyspace) -> Result<Frame, Error> {
        let set = match db.get(&self.key) {
            Some(value) => Some(value.as_set()?),
            None => None,
        };

        let replies = self
            .members
            .iter()
            .map(|member| set.is_some_and(|set| set.contains(member)))
            .map(|is_member| Frame::Integer(is_member as i64))
            .collect();

        Ok(Frame::Array(replies))
    }
}

impl TryFrom<&mut CommandParser> for Smismember {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::harness::Harness;

    #[test]
    fn membership_in_order() {
        let mut h = Harness::new();
        h.run(&["SADD", "set", "a", "c"]);

        assert_eq!(
            h.run(&["SMISMEMBER", "set", "a", "b", "c"]),
            Frame::Array(vec![
                Frame::Integer(1),
                Frame::Integer(0),
                Frame::Integer(1)
            ])
        );
        assert_eq!(
            h.run(&["SMISMEMBER", "missing", "a"]),
            Frame::Array(vec![Frame::Integer(0)])
        );
    }
}
