use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Keyspace;
use crate::Error;

/// Returns the sorted set cardinality (number of elements) of the sorted set stored at key.
///
/// Ref: <https://redis.io/docs/latest/commands/zcard/>
#[derive(Debug, PartialEq)]
pub struct Zcard {
    pub key: String,
}

impl Executable for Zcard {
    fn exec(self, db: &mut Keyspace) -> Result<Frame, Error> {
        match db.get(&self.key) {
            Some(value) => Ok(Frame::Integer(value.as_sorted_set()?.len() as i64)),
            None => Ok(Frame::Integer(0)),
        }
    }
}

impl TryFrom<&mut CommandParser> for Zcard {
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
    fn cardinality() {
        let mut h = Harness::new();
        h.set_zset("zset", &[("a", 1.0), ("b", 2.0)]);
        h.run(&["SET", "string", "1"]);

        assert_eq!(h.run(&["ZCARD", "zset"]), Frame::Integer(2));
        assert_eq!(h.run(&["ZCARD", "missing"]), Frame::Integer(0));
        assert_eq!(
            h.run(&["ZCARD", "string"]),
            error("WRONGTYPE Operation against a key holding the wrong kind of value")
        );
    }
}
