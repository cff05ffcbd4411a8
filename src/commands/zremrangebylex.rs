use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::skiplist::{LexBound, RangeOptions};
use crate::store::Keyspace;
use crate::Error;

/// When all the elements in a sorted set are inserted with the same score, this command removes
/// all elements in the sorted set stored at key between the lexicographical range specified by
/// min and max.
///
/// Ref: <https://redis.io/docs/latest/commands/zremrangebylex/>
#[derive(Debug, PartialEq)]
pub struct Zremrangebylex {
    pub key: String,
    pub min: LexBound,
    pub max: LexBound,
}

impl Executable for Zremrangebylex {
    fn exec(self, db: &mut Keyspace) -> Result<Frame, Error> {
        let Some(value) = db.get_mut(&self.key) else {
            return Ok(Frame::Integer(0));
        };
        let zset = value.as_sorted_set_mut()?;

        let members = zset.range_by_lex(&self.min, &self.max, RangeOptions::default());
        for member in &members {
            zset.remove(&member.key);
        }
        db.prune(&self.key);

        Ok(Frame::Integer(members.len() as i64))
    }
}

impl TryFrom<&mut CommandParser> for Zremrangebylex {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let min = parser.next_string()?.parse()?;
        let max = parser.next_string()?.parse()?;
        parser.finish()?;

        Ok(Self { key, min, max })
    }
}
