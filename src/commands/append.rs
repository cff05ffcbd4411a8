use bytes::{Bytes, BytesMut};

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Keyspace;
use crate::value::Value;
use crate::Error;

/// If key already exists and is a string, this command appends the value at the end of the string.
/// If key does not exist it is created and set as an empty string, so APPEND will be similar to
/// SET in this special case.
///
/// Ref: <https://redis.io/docs/latest/commands/append>
#[derive(Debug, PartialEq)]
pub struct Append {
    pub key: String,
    pub value: Bytes,
}

impl Executable for Append {
    fn exec(self, db: &mut Keyspace) -> Result<Frame, Error> {
        let value = match db.get(&self.key) {
            Some(value) => {
                let bytes = value.as_string()?;
                let mut new_value = BytesMut::with_capacity(bytes.len() + self.value.len());

                new_value.extend_from_slice(bytes);
                new_value.extend_from_slice(&self.value);
                new_value.freeze()
            }
            None => self.value,
        };

        let len = value.len();
        db.set_keep_ttl(self.key, Value::String(value));

        Ok(Frame::Integer(len as i64))
    }
}

impl TryFrom<&mut CommandParser> for Append {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let value = parser.next_bytes()?;
        parser.finish()?;

        Ok(Self { key, value })
    }
}
