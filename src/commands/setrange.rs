use bytes::{Bytes, BytesMut};

use crate::commands::executable::Executable;
use crate::commands::{CommandError, CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Keyspace;
use crate::value::Value;
use crate::Error;

/// The same cap as Redis' default `proto-max-bulk-len`.
const MAX_STRING_LEN: usize = 512 * 1024 * 1024;

/// Setrange overwrites part of the string stored at key, starting at the specified offset, for the
/// entire length of value. If the offset is larger than the current length of the string at key,
/// the string is padded with zero-bytes to make offset fit. Non-existing keys are considered as
/// empty strings, so this command will make sure it holds a string large enough to be able to set
/// value at offset.
///
/// Ref: <https://redis.io/docs/latest/commands/setrange/>
#[derive(Debug, PartialEq)]
pub struct Setrange {
    pub key: String,
    pub offset: usize,
    pub value: Bytes,
}

impl Executable for Setrange {
    fn exec(self, db: &mut Keyspace) -> Result<Frame, Error> {
        let current = match db.get(&self.key) {
            Some(value) => value.as_string()?.clone(),
            None => Bytes::new(),
        };

        if self.value.is_empty() {
            return Ok(Frame::Integer(current.len() as i64));
        }

        let end = self.offset + self.value.len();
        if end > MAX_STRING_LEN {
            return Err(CommandError::StringTooLong.into());
        }

        let mut updated = BytesMut::from(&current[..]);
        if updated.len() < end {
            updated.resize(end, 0);
        }
        updated[self.offset..end].copy_from_slice(&self.value);

        let len = updated.len();
        db.set_keep_ttl(self.key, Value::String(updated.freeze()));

        Ok(Frame::Integer(len as i64))
    }
}

impl TryFrom<&mut CommandParser> for Setrange {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let offset = parser.next_integer()?;
        let value = parser.next_bytes()?;
        parser.finish()?;

        let offset = usize::try_from(offset)
            .map_err(|_| CommandParserError::InvalidArgument("offset is out of range".to_string()))?;

        Ok(Self { key, offset, value })
    }
}
