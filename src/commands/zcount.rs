use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::skiplist::ScoreBound;
use crate::store::Keyspace;
use crate::Error;

/// Returns the number of elements in the sorted set at key with a score between min and max.
///
/// Ref: <https://redis.io/docs/latest/commands/zcount/>
#[derive(Debug, PartialEq)]
pub struct Zcount {
    pub key: String,
    pub min: ScoreBound,
    pub max: ScoreBound,
}

impl Executable for Zcount {
    fn exec(self, db: &mut Keyspace) -> Result<Frame, Error> {
        let count = match db.get(&self.key) {
            Some(value) => value.as_sorted_set()?.count_by_score(self.min, self.max),
            None => 0,
        };

        Ok(Frame::Integer(count as i64))
    }
}

impl TryFrom<&mut CommandParser> for Zcount {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let min = parser.next_string()?.parse()?;
        let max = parser.next_string()?.parse()?;
        parser.finish()?;

        Ok(Self { key, min, max })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::harness::{error, Harness};

    #[test]
    fn counts() {
        let mut h = Harness::new();
        h.set_zset("zset", &[("a", 1.0), ("b", 2.0), ("c", 3.0)]);

        assert_eq!(h.run(&["ZCOUNT", "zset", "-inf", "+inf"]), Frame::Integer(3));
        assert_eq!(h.run(&["ZCOUNT", "zset", "(1", "3"]), Frame::Integer(2));
        assert_eq!(h.run(&["ZCOUNT", "zset", "3", "1"]), Frame::Integer(0));
        assert_eq!(h.run(&["ZCOUNT", "missing", "0", "1"]), Frame::Integer(0));
        assert_eq!(
            h.run(&["ZCOUNT", "zset", "one", "1"]),
            error("ERR min or max is not a float")
        );
    }
}
