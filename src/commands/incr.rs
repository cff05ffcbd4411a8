use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Keyspace;
use crate::Error;

/// Increments the number stored at key by one. If the key does not exist, it is set to 0
/// before performing the operation.
///
/// Ref: <https://redis.io/docs/latest/commands/incr/>
#[derive(Debug, PartialEq)]
pub struct Incr {
    pub key: String,
}

impl Executable for Incr {
    fn exec(self, db: &mut Keyspace) -> Result<Frame, Error> {
        let value = db.incr_by(&self.key, 1i64)?;
        Ok(Frame::Integer(value))
    }
}

impl TryFrom<&mut CommandParser> for Incr {
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
    use crate::commands::harness::{bulk, error, Harness};
    use crate::commands::Command;
    use bytes::Bytes;

    #[test]
    fn existing_key() {
        let frame = Frame::Array(vec![
            Frame::Bulk(Bytes::from("INCR")),
            Frame::Bulk(Bytes::from("key1")),
        ]);
        let cmd = Command::try_from(frame).unwrap();

        assert_eq!(
            cmd,
            Command::Incr(Incr {
                key: "key1".to_string()
            })
        );

        let mut h = Harness::new();
        h.run(&["SET", "key1", "1"]);

        assert_eq!(h.run(&["INCR", "key1"]), Frame::Integer(2));
        assert_eq!(h.run(&["GET", "key1"]), bulk("2"));
    }

    #[test]
    fn non_existing_key() {
        let mut h = Harness::new();

        assert_eq!(h.run(&["INCR", "key1"]), Frame::Integer(1));
    }

    #[test]
    fn invalid_values() {
        let mut h = Harness::new();
        h.run(&["SET", "text", "value"]);
        h.run(&["SET", "max", &i64::MAX.to_string()]);

        assert_eq!(
            h.run(&["INCR", "text"]),
            error("ERR value is not an integer or out of range")
        );
        assert_eq!(
            h.run(&["INCR", "max"]),
            error("ERR increment or decrement would overflow")
        );
    }
}
