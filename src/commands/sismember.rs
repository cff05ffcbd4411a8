use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Keyspace;
use crate::Error;

/// Returns if member is a member of the set stored at key.
///
/// Ref: <https://redis.io/docs/latest/commands/sismember/>
#[derive(Debug, PartialEq)]
pub struct Sismember {
    pub key: String,
    pub member: Bytes,
}

impl Executable for Sismember {
    fn exec(self, db: &mut Keyspace) -> Result<Frame, Error> {
        let is_member = match db.get(&self.key) {
            Some(value) => value.as_set()?.contains(&self.member),
            None => false,
        };

        Ok(Frame::Integer(is_member as i64))
    }
}

impl TryFrom<&mut CommandParser> for Sismember {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let member = parser.next_bytes()?;
        parser.finish()?;

        Ok(Self { key, member })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::harness::Harness;

    #[test]
    fn membership() {
        let mut h = Harness::new();
        h.run(&["SADD", "set", "a"]);

        assert_eq!(h.run(&["SISMEMBER", "set", "a"]), Frame::Integer(1));
        assert_eq!(h.run(&["SISMEMBER", "set", "b"]), Frame::Integer(0));
        assert_eq!(h.run(&["SISMEMBER", "missing", "a"]), Frame::Integer(0));
    }
}
