use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Keyspace;
use crate::Error;

/// Returns the set cardinality (number of elements) of the set stored at key.
///
/// Ref: <https://redis.io/docs/latest/commands/scard/>
#[derive(Debug, PartialEq)]
pub struct Scard {
    pub key: String,
}

impl Executable for Scard {
    fn exec(self, db: &mut Keyspace) -> Result<Frame, Error> {
        match db.get(&self.key) {
            Some(value) => Ok(Frame::Integer(value.as_set()?.len() as i64)),
            None => Ok(Frame::Integer(0)),
        }
    }
}

impl TryFrom<&mut CommandParser> for Scard {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        parser.finish()?;
        Ok(Self { key })
    }
}
