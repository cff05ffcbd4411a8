use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::skiplist::RangeOptions;
use crate::store::Keyspace;
use crate::Error;

/// Removes all elements in the sorted set stored at key with rank between start and stop. Both
/// are 0-based and may be negative to count from the highest score.
///
/// Ref: <https://redis.io/docs/latest/commands/zremrangebyrank/>
#[derive(Debug, PartialEq)]
pub struct Zremrangebyrank {
    pub key: String,
    pub start: i64,
    pub stop: i64,
}

impl Executable for Zremrangebyrank {
    fn exec(self, db: &mut Keyspace) -> Result<Frame, Error> {
        let Some(value) = db.get_mut(&self.key) else {
            return Ok(Frame::Integer(0));
        };
        let zset = value.as_sorted_set_mut()?;

        let rank = |index: i64| if index >= 0 { index.saturating_add(1) } else { index };
        let members = zset.range_by_rank(
            rank(self.start),
            rank(self.stop),
            RangeOptions::default(),
        );
        for member in &members {
            zset.remove(&member.key);
        }
        db.prune(&self.key);

        Ok(Frame::Integer(members.len() as i64))
    }
}

impl TryFrom<&mut CommandParser> for Zremrangebyrank {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let start = parser.next_integer()?;
        let stop = parser.next_integer()?;
        parser.finish()?;

        Ok(Self { key, start, stop })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::harness::{bulks, Harness};

    #[test]
    fn removes_by_rank() {
        let mut h = Harness::new();
        h.set_zset("zset", &[("a", 1.0), ("b", 2.0), ("c", 3.0), ("d", 4.0)]);

        assert_eq!(
            h.run(&["ZREMRANGEBYRANK", "zset", "0", "1"]),
            Frame::Integer(2)
        );
        assert_eq!(h.run(&["ZRANGE", "zset", "0", "-1"]), bulks(&["c", "d"]));

        assert_eq!(
            h.run(&["ZREMRANGEBYRANK", "zset", "5", "10"]),
            Frame::Integer(0)
        );
        assert_eq!(
            h.run(&["ZREMRANGEBYRANK", "zset", "-2", "-1"]),
            Frame::Integer(2)
        );
        assert_eq!(h.run(&["EXISTS", "zset"]), Frame::Integer(0));
    }

    #[test]
    fn stop_at_the_largest_rank() {
        let mut h = Harness::new();
        h.set_zset("zset", &[("a", 1.0), ("b", 2.0), ("c", 3.0)]);

        assert_eq!(
            h.run(&["ZREMRANGEBYRANK", "zset", "0", "9223372036854775807"]),
            Frame::Integer(3)
        );
        assert_eq!(h.run(&["EXISTS", "zset"]), Frame::Integer(0));
    }
}
