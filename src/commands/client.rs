use crate::client::Client as Session;
use crate::commands::executable::ServerExecutable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::server::Redis;
use crate::Error;

/// Connection management. Clients send `CLIENT SETNAME`, `CLIENT SETINFO` and friends on connect,
/// they are all accepted and ignored.
///
/// Ref: <https://redis.io/docs/latest/commands/client/>
#[derive(Debug, PartialEq)]
pub struct Client {
    pub subcommand: String,
    pub args: Vec<String>,
}

impl ServerExecutable for Client {
    fn exec(self, _redis: &Redis, client: &mut Session) -> Result<Frame, Error> {
        match self.subcommand.as_str() {
            "ID" => Ok(Frame::Integer(client.id() as i64)),
            _ => Ok(Frame::Simple("OK".to_string())),
        }
    }
}

impl TryFrom<&mut CommandParser> for Client {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let subcommand = parser.next_keyword()?;
        let args = parser.rest_strings()?;

        Ok(Self { subcommand, args })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::harness::{error, ok, Harness};

    #[test]
    fn accepts_anything() {
        let mut h = Harness::new();

        assert_eq!(h.run(&["CLIENT", "SETNAME", "worker"]), ok());
        assert_eq!(h.run(&["CLIENT", "setinfo", "lib-name", "redis-rs"]), ok());
        assert_eq!(
            h.run(&["CLIENT", "ID"]),
            Frame::Integer(h.client.id() as i64)
        );
        assert_eq!(
            h.run(&["CLIENT"]),
            error("ERR wrong number of arguments for 'client' command")
        );
    }
}
