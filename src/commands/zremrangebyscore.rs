use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::skiplist::{RangeOptions, ScoreBound};
use crate::store::Keyspace;
use crate::Error;

/// Removes all elements in the sorted set stored at key with a score between min and max.
///
/// Ref: <https://redis.io/docs/latest/commands/zremrangebyscore/>
#[derive(Debug, PartialEq)]
pub struct Zremrangebyscore {
    pub key: String,
    pub min: ScoreBound,
    pub max: ScoreBound,
}

impl Executable for Zremrangebyscore {
    fn exec(self, db: &mut Keyspace) -> Result<Frame, Error> {
        let Some(value) = db.get_mut(&self.key) else {
            return Ok(Frame::Integer(0));
        };
        let zset = value.as_sorted_set_mut()?;

        let members = zset.range_by_score(self.min, self.max, RangeOptions::default());
        for member in &members {
            zset.remove(&member.key);
        }
        db.prune(&self.key);

        Ok(Frame::Integer(members.len() as i64))
    }
}

impl TryFrom<&mut CommandParser> for Zremrangebyscore {
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
    use crate::commands::harness::{bulks, Harness};

    #[test]
    fn removes_by_score() {
        let mut h = Harness::new();
        h.set_zset("zset", &[("a", 1.0), ("b", 2.0), ("c", 3.0)]);

        assert_eq!(
            h.run(&["ZREMRANGEBYSCORE", "zset", "(1", "2"]),
            Frame::Integer(1)
        );
        assert_eq!(h.run(&["ZRANGE", "zset", "0", "-1"]), bulks(&["a", "c"]));
        assert_eq!(
            h.run(&["ZREMRANGEBYSCORE", "zset", "-inf", "+inf"]),
            Frame::Integer(2)
        );
        assert_eq!(h.run(&["EXISTS", "zset"]), Frame::Integer(0));
    }
}
