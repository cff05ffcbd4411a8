use bytes::Bytes;

use crate::client::Client;
use crate::commands::executable::ServerExecutable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::server::Redis;
use crate::Error;

/// Returns PONG if no argument is provided, otherwise return a copy of the argument as a bulk.
///
/// Ref: <https://redis.io/docs/latest/commands/ping>
#[derive(Debug, PartialEq)]
pub struct Ping {
    pub payload: Option<Bytes>,
}

impl ServerExecutable for Ping {
    fn exec(self, _redis: &Redis, _client: &mut Client) -> Result<Frame, Error> {
        let res = self
            .payload
            .map_or(Frame::Simple("PONG".to_string()), Frame::Bulk);

        Ok(res)
    }
}

impl TryFrom<&mut CommandParser> for Ping {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let payload = match parser.next_bytes() {
            Ok(payload) => Some(payload),
            Err(CommandParserError::EndOfStream) => None,
            Err(e) => return Err(e),
        };
        parser.finish()?;

        Ok(Self { payload })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::harness::{bulk, error, Harness};
    use crate::commands::Command;

    #[test]
    fn parse_without_payload() {
        let cmd = Command::try_from(Harness::frame(&["PING"])).unwrap();
        assert_eq!(cmd, Command::Ping(Ping { payload: None }));
    }

    #[test]
    fn replies() {
        let mut h = Harness::new();

        assert_eq!(h.run(&["PING"]), Frame::Simple("PONG".to_string()));
        assert_eq!(h.run(&["PING", "hello"]), bulk("hello"));
        assert_eq!(
            h.run(&["PING", "a", "b"]),
            error("ERR wrong number of arguments for 'ping' command")
        );
    }
}
