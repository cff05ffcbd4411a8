use crate::commands::executable::Executable;
use crate::commands::setop::SetOp;
use crate::commands::sintercard::parse_card_args;
use crate::commands::zsetop::{combine, read_inputs, Aggregate};
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Keyspace;
use crate::Error;

/// This command is similar to ZINTER, but instead of returning the result set, it returns just
/// the cardinality of the result. A LIMIT of 0 means unlimited.
///
/// Ref: <https://redis.io/docs/latest/commands/zintercard/>
#[derive(Debug, PartialEq)]
pub struct Zintercard {
    pub keys: Vec<String>,
    pub limit: Option<usize>,
}

impl Executable for Zintercard {
    fn exec(self, db: &mut Keyspace) -> Result<Frame, Error> {
        let inputs = read_inputs(db, &self.keys)?;
        let len = combine(SetOp::Inter, inputs, |_| 1.0, Aggregate::Sum).len();
        let len = self.limit.map_or(len, |limit| len.min(limit));

        Ok(Frame::Integer(len as i64))
    }
}

impl TryFrom<&mut CommandParser> for Zintercard {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let (keys, limit) = parse_card_args(parser)?;
        Ok(Self { keys, limit })
    }
}
