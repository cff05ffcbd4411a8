use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Keyspace;
use crate::Error;

/// Returns the score of member in the sorted set at key. If member does not exist in the sorted
/// set, or key does not exist, nil is returned.
///
/// Ref: <https://redis.io/docs/latest/commands/zscore/>
#[derive(Debug, PartialEq)]
pub struct Zscore {
    pub key: String,
    pub member: String,
}

impl Executable for Zscore {
    fn exec(self, db: &mut Keyspace) -> Result<Frame, Error> {
        let score = match db.get(&self.key) {
            Some(value) => value.as_sorted_set()?.score(&self.member),
            None => None,
        };

        Ok(score.map_or(Frame::NullBulkString, Frame::Double))
    }
}

impl TryFrom<&mut CommandParser> for Zscore {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let member = parser.next_string()?;
        parser.finish()?;

        Ok(Self { key, member })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::harness::{bulk, Harness};

    #[test]
    fn scores() {
        let mut h = Harness::new();
        h.set_zset("zset", &[("a", 1.5), ("b", f64::INFINITY)]);

        assert_eq!(h.run(&["ZSCORE", "zset", "a"]), bulk("1.5"));
        assert_eq!(h.run(&["ZSCORE", "zset", "b"]), bulk("inf"));
        assert_eq!(h.run(&["ZSCORE", "zset", "c"]), Frame::NullBulkString);
        assert_eq!(h.run(&["ZSCORE", "missing", "a"]), Frame::NullBulkString);
    }

    #[test]
    fn double_reply_under_resp3() {
        let mut h = Harness::new();
        h.set_zset("zset", &[("a", 1.5)]);
        h.run(&["HELLO", "3"]);

        assert_eq!(h.run(&["ZSCORE", "zset", "a"]), Frame::Double(1.5));
        assert_eq!(h.run(&["ZSCORE", "zset", "b"]), Frame::Null);
    }
}
