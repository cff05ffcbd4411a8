use crate::commands::executable::Executable;
use crate::commands::{CommandError, CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Keyspace;
use crate::Error;

/// Decrements the number stored at key by decrement. If the key does not exist, it is set to 0
/// before performing the operation.
///
/// Ref: <https://redis.io/docs/latest/commands/decrby/>
#[derive(Debug, PartialEq)]
pub struct DecrBy {
    pub key: String,
    pub decrement: i64,
}

impl Executable for DecrBy {
    fn exec(self, db: &mut Keyspace) -> Result<Frame, Error> {
        let increment = self
            .decrement
            .checked_neg()
            .ok_or(CommandError::Overflow)?;
        let value = db.incr_by(&self.key, increment)?;
        Ok(Frame::Integer(value))
    }
}

impl TryFrom<&mut CommandParser> for DecrBy {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let decrement = parser.next_integer()?;
        parser.finish()?;

        Ok(Self { key, decrement })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::harness::{error, Harness};

    #[test]
    fn decrements() {
        let mut h = Harness::new();
        h.run(&["SET", "key1", "10"]);

        assert_eq!(h.run(&["DECRBY", "key1", "3"]), Frame::Integer(7));
        assert_eq!(h.run(&["DECRBY", "key1", "-3"]), Frame::Integer(10));
        assert_eq!(
            h.run(&["DECRBY", "key1", &i64::MIN.to_string()]),
            error("ERR increment or decrement would overflow")
        );
    }
}
