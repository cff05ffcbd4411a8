use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Keyspace;
use crate::Error;

/// Returns the length of the string value stored at key. An error is returned when key holds a
/// non-string value.
///
/// Ref: <https://redis.io/docs/latest/commands/strlen/>
#[derive(Debug, PartialEq)]
pub struct Strlen {
    pub key: String,
}

impl Executable for Strlen {
    fn exec(self, db: &mut Keyspace) -> Result<Frame, Error> {
        match db.get(&self.key) {
            Some(value) => Ok(Frame::Integer(value.as_string()?.len() as i64)),
            None => Ok(Frame::Integer(0)),
        }
    }
}

impl TryFrom<&mut CommandParser> for Strlen {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        parser.finish()?;
        Ok(Self { key })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::harness::{error, Harness};

    #[test]
    fn lengths() {
        let mut h = Harness::new();
        h.run(&["SET", "key1", "Hello world"]);
        h.run(&["SADD", "set", "a"]);

        assert_eq!(h.run(&["STRLEN", "key1"]), Frame::Integer(11));
        assert_eq!(h.run(&["STRLEN", "missing"]), Frame::Integer(0));
        assert_eq!(
            h.run(&["STRLEN", "set"]),
            error("WRONGTYPE Operation against a key holding the wrong kind of value")
        );
    }
}
