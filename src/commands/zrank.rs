use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Keyspace;
use crate::Error;

/// Returns the rank of member in the sorted set stored at key, with the scores ordered from low
/// to high (`ZRANK`) or from high to low (`ZREVRANK`). The rank is 0-based.
///
/// Ref: <https://redis.io/docs/latest/commands/zrank/>
#[derive(Debug, PartialEq)]
pub struct Zrank {
    pub key: String,
    pub member: String,
    pub reverse: bool,
    pub with_score: bool,
}

impl Zrank {
    pub(crate) fn parse(
        parser: &mut CommandParser,
        reverse: bool,
    ) -> Result<Zrank, CommandParserError> {
        let key = parser.next_string()?;
        let member = parser.next_string()?;
        let with_score = parser.has_next();
        if with_score && parser.next_keyword()? != "WITHSCORE" {
            return Err(CommandParserError::Syntax);
        }
        parser.finish()?;

        Ok(Zrank {
            key,
            member,
            reverse,
            with_score,
        })
    }
}

impl Executable for Zrank {
    fn exec(self, db: &mut Keyspace) -> Result<Frame, Error> {
        let nil = if self.with_score {
            Frame::NullArray
        } else {
            Frame::NullBulkString
        };

        let Some(value) = db.get(&self.key) else {
            return Ok(nil);
        };
        let zset = value.as_sorted_set()?;

        let (rank, score) = match (zset.rank(&self.member), zset.score(&self.member)) {
            (rank, Some(score)) if rank > 0 => (rank, score),
            _ => return Ok(nil),
        };

        let rank = if self.reverse {
            zset.len() - rank
        } else {
            rank - 1
        };

        if self.with_score {
            Ok(Frame::Array(vec![
                Frame::Integer(rank as i64),
                Frame::Double(score),
            ]))
        } else {
            Ok(Frame::Integer(rank as i64))
        }
    }
}
