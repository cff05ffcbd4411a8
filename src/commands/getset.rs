use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Keyspace;
use crate::value::Value;
use crate::Error;

/// Atomically sets key to value and returns the old value stored at key. Any previous time to
/// live is discarded.
///
/// Ref: <https://redis.io/docs/latest/commands/getset/>
#[derive(Debug, PartialEq)]
pub struct Getset {
    pub key: String,
    pub value: Bytes,
}

impl Executable for Getset {
    fn exec(self, db: &mut Keyspace) -> Result<Frame, Error> {
        let previous = match db.get(&self.key) {
            Some(value) => Some(value.as_string()?.clone()),
            None => None,
        };

        db.set(self.key, Value::String(self.value), None);

        Ok(previous.map_or(Frame::NullBulkString, Frame::Bulk))
    }
}

impl TryFrom<&mut CommandParser> for Getset {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let value = parser.next_bytes()?;
        parser.finish()?;

        Ok(Self { key, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::harness::{bulk, Harness};

    #[tokio::test]
    async fn replaces_the_value_and_the_ttl() {
        tokio::time::pause();
        let mut h = Harness::new();

        assert_eq!(h.run(&["GETSET", "k", "1"]), Frame::NullBulkString);

        h.run(&["EXPIRE", "k", "100"]);
        assert_eq!(h.run(&["GETSET", "k", "2"]), bulk("1"));
        assert_eq!(h.run(&["GET", "k"]), bulk("2"));
        assert_eq!(h.run(&["TTL", "k"]), Frame::Integer(-1));
    }
}
