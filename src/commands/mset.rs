use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Keyspace;
use crate::value::Value;
use crate::Error;

/// Sets the given keys to their respective values. Replaces existing values with new values.
///
/// Ref: <https://redis.io/docs/latest/commands/mset/>
#[derive(Debug, PartialEq)]
pub struct Mset {
    pub pairs: Vec<(String, Bytes)>,
}

impl Executable for Mset {
    fn exec(self, db: &mut Keyspace) -> Result<Frame, Error> {
        for (key, value) in self.pairs {
            db.set(key, Value::String(value), None);
        }

        Ok(Frame::Simple("OK".to_string()))
    }
}

impl TryFrom<&mut CommandParser> for Mset {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        if !parser.has_next() || parser.remaining() % 2 != 0 {
            return Err(CommandParserError::EndOfStream);
        }

        let mut pairs = vec![];
        while parser.has_next() {
            let key = parser.next_string()?;
            let value = parser.next_bytes()?;
            pairs.push((key, value));
        }

        Ok(Self { pairs })
    }
}
