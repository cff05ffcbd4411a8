use crate::client::Client;
use crate::commands::executable::ServerExecutable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::server::Redis;
use crate::Error;

/// Marks the given keys to be watched for conditional execution of a transaction. Keys are not
/// tracked.
///
/// Ref: <https://redis.io/docs/latest/commands/watch/>
#[derive(Debug, PartialEq)]
pub struct Watch;

impl ServerExecutable for Watch {
    fn exec(self, _redis: &Redis, _client: &mut Client) -> Result<Frame, Error> {
        Ok(Frame::Simple("OK".to_string()))
    }
}

impl TryFrom<&mut CommandParser> for Watch {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        if !parser.has_next() {
            return Err(CommandParserError::EndOfStream);
        }
        parser.rest_strings()?;
        Ok(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::harness::{error, Harness};

    #[test]
    fn accepted() {
        let mut h = Harness::new();

        assert_eq!(h.run(&["WATCH", "a", "b"]), Frame::Simple("OK".to_string()));
        assert_eq!(
            h.run(&["WATCH"]),
            error("ERR wrong number of arguments for 'watch' command")
        );
    }
}
