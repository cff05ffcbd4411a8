use bytes::Bytes;
use glob_match::glob_match;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Keyspace;
use crate::Error;

/// Returns all keys matching pattern. Keys are sorted so replies are stable.
///
/// Ref: <https://redis.io/docs/latest/commands/keys/>
#[derive(Debug, PartialEq)]
pub struct Keys {
    pub pattern: String,
}

impl Executable for Keys {
    fn exec(self, db: &mut Keyspace) -> Result<Frame, Error> {
        let mut keys: Vec<&String> = db
            .keys()
            .filter(|key| glob_match(&self.pattern, key))
            .collect();
        keys.sort();

        let keys = keys
            .into_iter()
            .map(|key| Frame::Bulk(Bytes::from(key.clone())))
            .collect();

        Ok(Frame::Array(keys))
    }
}

impl TryFrom<&mut CommandParser> for Keys {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let pattern = parser.next_string()?;
        parser.finish()?;
        Ok(Self { pattern })
    }
}
