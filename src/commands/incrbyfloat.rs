use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{CommandError, CommandParser, CommandParserError};
use crate::frame::{format_double, Frame};
use crate::store::Keyspace;
use crate::value::Value;
use crate::Error;

/// Increment the string representing a floating point number stored at key by the specified
/// increment. By using a negative increment value, the result is that the value stored at the key
/// is decremented (by the obvious properties of addition). If the key does not exist, it is set to
/// 0 before performing the operation.
///
/// The result is stored in its shortest exact representation, so `10.5` plus `0.1` is `10.6`.
///
/// Ref: <https://redis.io/docs/latest/commands/incrbyfloat/>
#[derive(Debug, PartialEq)]
pub struct IncrByFloat {
    pub key: String,
    pub increment: f64,
}

impl Executable for IncrByFloat {
    fn exec(self, db: &mut Keyspace) -> Result<Frame, Error> {
        let current = match db.get(&self.key) {
            Some(value) => std::str::from_utf8(value.as_string()?)
                .ok()
                .and_then(|s| s.trim().parse::<f64>().ok())
                .filter(|value| !value.is_nan())
                .ok_or(CommandError::NotAFloat)?,
            None => 0.0,
        };

        let value = current + self.increment;
        if !value.is_finite() {
            return Err(CommandError::NanOrInfinity.into());
        }

        let formatted = Bytes::from(format_double(value));
        db.set_keep_ttl(self.key, Value::String(formatted.clone()));

        Ok(Frame::Bulk(formatted))
    }
}

impl TryFrom<&mut CommandParser> for IncrByFloat {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let increment = parser.next_float()?;
        parser.finish()?;

        Ok(Self { key, increment })
    }
}
