use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::skiplist::LexBound;
use crate::store::Keyspace;
use crate::Error;

/// When all the elements in a sorted set are inserted with the same score, this command returns
/// the number of elements in the sorted set at key with a value between min and max.
///
/// Ref: <https://redis.io/docs/latest/commands/zlexcount/>
#[derive(Debug, PartialEq)]
pub struct Zlexcount {
    pub key: String,
    pub min: LexBound,
    pub max: LexBound,
}

impl Executable for Zlexcount {
    fn exec(self, db: &mut Keyspace) -> Result<Frame, Error> {
        let count = match db.get(&self.key) {
            Some(value) => value.as_sorted_set()?.count_by_lex(&self.min, &self.max),
            None => 0,
        };

        Ok(Frame::Integer(count as i64))
    }
}

impl TryFrom<&mut CommandParser> for Zlexcount {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let min = parser.next_string()?.parse()?;
        let max = parser.next_string()?.parse()?;
        parser.finish()?;

        Ok(Self { key, min, max })
    }
}
