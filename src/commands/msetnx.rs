use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Keyspace;
use crate::value::Value;
use crate::Error;

/// Sets the given keys to their respective values.
/// Will not perform any operation at all even if just a single key already exists.
///
/// Because of this semantic MSETNX can be used in order to set different keys representing
/// different fields of a unique logic object in a way that ensures that either all the
/// fields or none at all are set.
///
/// Ref: <https://redis.io/docs/latest/commands/msetnx/>
#[derive(Debug, PartialEq)]
pub struct Msetnx {
    pub pairs: Vec<(String, Bytes)>,
}

impl Executable for Msetnx {
    fn exec(self, db: &mut Keyspace) -> Result<Frame, Error> {
        // Nothing is written unless every key is free, and the whole check runs under the lock.
        if self.pairs.iter().any(|(key, _)| db.exists(key)) {
            return Ok(Frame::Integer(0));
        }

        for (key, value) in self.pairs {
            db.set(key, Value::String(value), None);
        }

        Ok(Frame::Integer(1))
    }
}

impl TryFrom<&mut CommandParser> for Msetnx {
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
