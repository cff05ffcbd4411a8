use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::{Expiry, Keyspace};
use crate::Error;

/// Like TTL this command returns the remaining time to live of a key that has an expire set, with
/// the sole difference that TTL returns the amount of remaining time in seconds while PTTL returns
/// it in milliseconds.
///
/// Ref: <https://redis.io/docs/latest/commands/pttl/>
#[derive(Debug, PartialEq)]
pub struct Pttl {
    pub key: String,
}

impl Executable for Pttl {
    fn exec(self, db: &mut Keyspace) -> Result<Frame, Error> {
        let ttl = match db.expiry(&self.key) {
            Some(Expiry::In(remaining)) => remaining.as_millis() as i64,
            Some(Expiry::Never) => -1,
            None => -2,
        };
        Ok(Frame::Integer(ttl))
    }
}

impl TryFrom<&mut CommandParser> for Pttl {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        parser.finish()?;
        Ok(Self { key })
    }
}
