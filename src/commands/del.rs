use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Keyspace;
use crate::Error;

/// Removes the specified keys. A key is ignored if it does not exist.
///
/// Ref: <https://redis.io/docs/latest/commands/del/>
#[derive(Debug, PartialEq)]
pub struct Del {
    pub keys: Vec<String>,
}

impl Executable for Del {
    fn exec(self, db: &mut Keyspace) -> Result<Frame, Error> {
        let count = db.delete(&self.keys);
        Ok(Frame::Integer(count as i64))
    }
}

impl TryFrom<&mut CommandParser> for Del {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let mut keys = vec![];

        loop {
            match parser.next_string() {
                Ok(key) => keys.push(key),
                Err(CommandParserError::EndOfStream) if !keys.is_empty() => {
                    break;
                }
                Err(err) => return Err(err),
            }
        }

        Ok(Self { keys })
    }
}
