use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Keyspace;
use crate::value::Value;
use crate::Error;

/// Set key to hold string value if key does not exist. In that case, it is equal to SET. When key
/// already holds a value, no operation is performed. SETNX is short for "SET if Not eXists".
///
/// Ref: <https://redis.io/docs/latest/commands/setnx/>
#[derive(Debug, PartialEq)]
pub struct Setnx {
    pub key: String,
    pub value: Bytes,
}

impl Executable for Setnx {
    fn exec(self, db: &mut Keyspace) -> Result<Frame, Error> {
        if db.exists(&self.key) {
            return Ok(Frame::Integer(0));
        }

        db.set(self.key, Value::String(self.value), None);
        Ok(Frame::Integer(1))
    }
}

impl TryFrom<&mut CommandParser> for Setnx {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let value = parser.next_bytes()?;
        parser.finish()?;

        Ok(Self { key, value })
    }
}
