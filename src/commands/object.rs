use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Keyspace;
use crate::Error;

/// Inspects the internals of the value stored at a key.
///
/// Ref: <https://redis.io/docs/latest/commands/object/>
#[derive(Debug, PartialEq)]
pub enum Object {
    /// Internal encoding of the value, nil when the key is missing.
    Encoding(String),
    /// Values are never shared, so this is 1 for any existing key.
    Refcount(String),
}

impl Executable for Object {
    fn exec(self, db: &mut Keyspace) -> Result<Frame, Error> {
        let frame = match self {
            Self::Encoding(key) => db.get(&key).map_or(Frame::NullBulkString, |value| {
                Frame::Bulk(Bytes::from(value.encoding().to_string()))
            }),
            Self::Refcount(key) => {
                if db.exists(&key) {
                    Frame::Integer(1)
                } else {
                    Frame::NullBulkString
                }
            }
        };

        Ok(frame)
    }
}

impl TryFrom<&mut CommandParser> for Object {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let subcommand = parser.next_string()?;

        let object = match subcommand.to_lowercase().as_str() {
            "encoding" => Self::Encoding(parser.next_string()?),
            "refcount" => Self::Refcount(parser.next_string()?),
            _ => {
                return Err(CommandParserError::UnknownSubcommand {
                    command: parser.command().to_string(),
                    subcommand,
                })
            }
        };
        parser.finish()?;

        Ok(object)
    }
}
