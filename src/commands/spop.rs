use rand::seq::IteratorRandom;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Keyspace;
use crate::Error;

/// Removes and returns one or more random members from the set value store at key.
///
/// Without a count the reply is a single member, or nil. With a count it is an array of up to
/// `count` distinct members.
///
/// Ref: <https://redis.io/docs/latest/commands/spop/>
#[derive(Debug, PartialEq)]
pub struct Spop {
    pub key: String,
    pub count: Option<usize>,
}

impl Executable for Spop {
    fn exec(self, db: &mut Keyspace) -> Result<Frame, Error> {
        let Some(value) = db.get_mut(&self.key) else {
            return Ok(match self.count {
                Some(_) => Frame::Array(vec![]),
                None => Frame::NullBulkString,
            });
        };
        let set = value.as_set_mut()?;

        let mut rng = rand::thread_rng();
        let popped = set
            .iter()
            .cloned()
            .choose_multiple(&mut rng, self.count.unwrap_or(1));
        for member in &popped {
            set.remove(member);
        }
        db.prune(&self.key);

        Ok(match self.count {
            Some(_) => Frame::Array(popped.into_iter().map(Frame::Bulk).collect()),
            None => popped
                .into_iter()
                .next()
                .map_or(Frame::NullBulkString, Frame::Bulk),
        })
    }
}

impl TryFrom<&mut CommandParser> for Spop {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let count = if parser.has_next() {
            Some(parser.next_count()?)
        } else {
            None
        };
        parser.finish()?;

        Ok(Self { key, count })
    }
}
