use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Keyspace;
use crate::Error;

/// Get the value of `key`. If the key does not exist the special value `nil` is returned.
///
/// Ref: <https://redis.io/docs/latest/commands/get/>
#[derive(Debug, PartialEq)]
pub struct Get {
    pub key: String,
}

impl Executable for Get {
    fn exec(self, db: &mut Keyspace) -> Result<Frame, Error> {
        match db.get(&self.key) {
            Some(value) => Ok(Frame::Bulk(value.as_string()?.clone())),
            None => Ok(Frame::NullBulkString),
        }
    }
}

impl TryFrom<&mut CommandParser> for Get {
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
            Frame::Bulk(Bytes::from("GET")),
            Frame::Bulk(Bytes::from("key1")),
        ]);
        let cmd = Command::try_from(frame).unwrap();

        assert_eq!(
            cmd,
            Command::Get(Get {
                key: String::from("key1")
            })
        );

        let mut db = Keyspace::new();
        db.set(String::from("key1"), "1".into(), None);

        let result = Get {
            key: String::from("key1"),
        }
        .exec(&mut db)
        .unwrap();

        assert_eq!(result, Frame::Bulk(Bytes::from("1")));
    }

    #[test]
    fn missing_key() {
        let mut db = Keyspace::new();

        let result = Get {
            key: String::from("key1"),
        }
        .exec(&mut db)
        .unwrap();

        assert_eq!(result, Frame::NullBulkString);
    }

    #[test]
    fn wrong_type() {
        let mut h = Harness::new();
        h.run(&["RPUSH", "list", "a"]);

        assert_eq!(
            h.run(&["GET", "list"]),
            error("WRONGTYPE Operation against a key holding the wrong kind of value")
        );

        h.run(&["SET", "s", "v"]);
        assert_eq!(h.run(&["GET", "s"]), bulk("v"));
    }
}
