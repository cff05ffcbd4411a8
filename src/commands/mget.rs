use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Keyspace;
use crate::value::Value;
use crate::Error;

/// Returns the values of all specified keys. For every key that does not hold a string value or
/// does not exist, the special value nil is returned. Because of this, the operation never fails.
///
/// Ref: <https://redis.io/docs/latest/commands/mget/>
#[derive(Debug, PartialEq)]
pub struct Mget {
    pub keys: Vec<String>,
}

impl Executable for Mget {
    fn exec(self, db: &mut Keyspace) -> Result<Frame, Error> {
        let values = self
            .keys
            .iter()
            .map(|key| match db.get(key) {
                Some(Value::String(value)) => Frame::Bulk(value.clone()),
                _ => Frame::NullBulkString,
            })
            .collect();

        Ok(Frame::Array(values))
    }
}

impl TryFrom<&mut CommandParser> for Mget {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let keys = parser.rest_strings()?;
        if keys.is_empty() {
            return Err(CommandParserError::EndOfStream);
        }

        Ok(Self { keys })
    }
}
