use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Keyspace;
use crate::Error;

/// Get the value of key and delete the key. This command is similar to GET, except for the fact
/// that it also deletes the key on success (if and only if the key's value type is a string).
///
/// Ref: <https://redis.io/docs/latest/commands/getdel/>
#[derive(Debug, PartialEq)]
pub struct Getdel {
    pub key: String,
}

impl Executable for Getdel {
    fn exec(self, db: &mut Keyspace) -> Result<Frame, Error> {
        let value = match db.get(&self.key) {
            Some(value) => value.as_string()?.clone(),
            None => return Ok(Frame::NullBulkString),
        };

        db.remove(&self.key);
        Ok(Frame::Bulk(value))
    }
}

impl TryFrom<&mut CommandParser> for Getdel {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        parser.finish()?;
        Ok(Self { key })
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::commands::harness::{bulk, error, Harness};
    use crate::commands::Command;

    #[test]
    fn when_key_exists() {
        let frame = Frame::Array(vec![
            Frame::Bulk(Bytes::from("GETDEL")),
            Frame::Bulk(Bytes::from("foo")),
        ]);
        let cmd = Command::try_from(frame).unwrap();
        assert_eq!(
            cmd,
            Command::Getdel(Getdel {
                key: "foo".to_string()
            })
        );

        let mut db = Keyspace::new();
        db.set("foo".to_string(), "bar".into(), None);

        let res = Getdel {
            key: "foo".to_string(),
        }
        .exec(&mut db)
        .unwrap();

        assert_eq!(res, Frame::Bulk(Bytes::from("bar")));
        assert!(!db.exists("foo"));
    }

    #[test]
    fn when_key_does_not_exist_or_is_not_a_string() {
        let mut h = Harness::new();

        assert_eq!(h.run(&["GETDEL", "foo"]), Frame::NullBulkString);

        h.run(&["SADD", "set", "a"]);
        assert_eq!(
            h.run(&["GETDEL", "set"]),
            error("WRONGTYPE Operation against a key holding the wrong kind of value")
        );
        assert_eq!(h.run(&["SISMEMBER", "set", "a"]), Frame::Integer(1));

        h.run(&["SET", "foo", "1"]);
        assert_eq!(h.run(&["GETDEL", "foo"]), bulk("1"));
    }
}
