use crate::commands::executable::Executable;
use crate::commands::{CommandError, CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::skiplist::SkipList;
use crate::store::Keyspace;
use crate::value::Value;
use crate::Error;

/// Increments the score of member in the sorted set stored at key by increment. If member does not
/// exist in the sorted set, it is added with increment as its score.
///
/// Ref: <https://redis.io/docs/latest/commands/zincrby/>
#[derive(Debug, PartialEq)]
pub struct Zincrby {
    pub key: String,
    pub increment: f64,
    pub member: String,
}

impl Executable for Zincrby {
    fn exec(self, db: &mut Keyspace) -> Result<Frame, Error> {
        let zset = db
            .get_or_insert_with(&self.key, || Value::SortedSet(SkipList::new()))
            .as_sorted_set_mut()?;

        let score = zset.score(&self.member).unwrap_or(0.0) + self.increment;
        if score.is_nan() {
            db.prune(&self.key);
            return Err(CommandError::NanScore.into());
        }
        zset.insert(&self.member, score);

        Ok(Frame::Double(score))
    }
}

impl TryFrom<&mut CommandParser> for Zincrby {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let increment = parser.next_float()?;
        let member = parser.next_string()?;
        parser.finish()?;

        Ok(Self {
            key,
            increment,
            member,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::harness::{bulk, bulks, error, Harness};

    #[test]
    fn increments() {
        let mut h = Harness::new();
        h.set_zset("zset", &[("a", 1.0), ("b", 2.0)]);

        assert_eq!(h.run(&["ZINCRBY", "zset", "2", "a"]), bulk("3"));
        assert_eq!(h.run(&["ZINCRBY", "zset", "5", "c"]), bulk("5"));
        assert_eq!(h.run(&["ZRANGE", "zset", "0", "-1"]), bulks(&["b", "a", "c"]));
    }

    #[test]
    fn nan_result() {
        let mut h = Harness::new();
        h.set_zset("zset", &[("a", f64::INFINITY)]);

        assert_eq!(
            h.run(&["ZINCRBY", "zset", "-inf", "a"]),
            error("ERR resulting score is not a number (NaN)")
        );
        assert_eq!(h.run(&["ZSCORE", "zset", "a"]), bulk("inf"));
    }
}
