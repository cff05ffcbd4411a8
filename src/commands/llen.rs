use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Keyspace;
use crate::Error;

/// Returns the length of the list stored at key. If key does not exist, it is interpreted as an
/// empty list and 0 is returned.
///
/// Ref: <https://redis.io/docs/latest/commands/llen/>
#[derive(Debug, PartialEq)]
pub struct Llen {
    pub key: String,
}

impl Executable for Llen {
    fn exec(self, db: &mut Keyspace) -> Result<Frame, Error> {
        match db.get(&self.key) {
            Some(value) => Ok(Frame::Integer(value.as_list()?.len() as i64)),
            None => Ok(Frame::Integer(0)),
        }
    }
}

impl TryFrom<&mut CommandParser> for Llen {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        parser.finish()?;
        Ok(Self { key })
    }
}
