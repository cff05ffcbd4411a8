use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Keyspace;
use crate::Error;

/// Remove the existing timeout on key, turning the key from volatile to persistent.
///
/// Ref: <https://redis.io/docs/latest/commands/persist/>
#[derive(Debug, PartialEq)]
pub struct Persist {
    pub key: String,
}

impl Executable for Persist {
    fn exec(self, db: &mut Keyspace) -> Result<Frame, Error> {
        let removed = db.persist(&self.key);
        Ok(Frame::Integer(removed as i64))
    }
}

impl TryFrom<&mut CommandParser> for Persist {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        parser.finish()?;
        Ok(Self { key })
    }
}
