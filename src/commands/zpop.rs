use crate::commands::executable::Executable;
use crate::commands::zrange::members_reply;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::skiplist::{Member, SkipList};
use crate::store::Keyspace;
use crate::Error;

/// Which end of a sorted set a pop takes members from.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Side {
    Min,
    Max,
}

/// Removes up to `count` members from the `side` end of `zset`.
pub(crate) fn pop(zset: &mut SkipList, side: Side, count: usize) -> Vec<Member> {
    let mut members = Vec::with_capacity(count.min(zset.len()));

    while members.len() < count {
        let member = match side {
            Side::Min => zset.pop_min(),
            Side::Max => zset.pop_max(),
        };
        match member {
            Some(member) => members.push(member),
            None => break,
        }
    }

    members
}

/// Removes and returns up to count members with the lowest (`ZPOPMIN`) or highest (`ZPOPMAX`)
/// scores in the sorted set stored at key. The reply alternates members and scores.
///
/// Ref: <https://redis.io/docs/latest/commands/zpopmin/>
#[derive(Debug, PartialEq)]
pub struct Zpop {
    pub key: String,
    pub side: Side,
    pub count: usize,
}

impl Zpop {
    pub(crate) fn parse(parser: &mut CommandParser, side: Side) -> Result<Zpop, CommandParserError> {
        let key = parser.next_string()?;
        let count = if parser.has_next() {
            parser.next_count()?
        } else {
            1
        };
        parser.finish()?;

        Ok(Zpop { key, side, count })
    }
}

impl Executable for Zpop {
    fn exec(self, db: &mut Keyspace) -> Result<Frame, Error> {
        let Some(value) = db.get_mut(&self.key) else {
            return Ok(Frame::Array(vec![]));
        };

        let members = pop(value.as_sorted_set_mut()?, self.side, self.count);
        db.prune(&self.key);

        Ok(members_reply(members, true))
    }
}
