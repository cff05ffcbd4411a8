use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Keyspace;
use crate::Error;

/// Returns how many of the given keys exist. A key mentioned multiple times is counted multiple
/// times.
///
/// Ref: <https://redis.io/docs/latest/commands/exists/>
#[derive(Debug, PartialEq)]
pub struct Exists {
    pub keys: Vec<String>,
}

impl Executable for Exists {
    fn exec(self, db: &mut Keyspace) -> Result<Frame, Error> {
        let count = self.keys.iter().filter(|key| db.exists(key)).count();
        Ok(Frame::Integer(count as i64))
    }
}

impl TryFrom<&mut CommandParser> for Exists {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let keys = parser.rest_strings()?;
        if keys.is_empty() {
            return Err(CommandParserError::EndOfStream);
        }

        Ok(Self { keys })
    }
}
