use crate::client::Client;
use crate::commands::executable::ServerExecutable;
use crate::commands::{CommandError, CommandParser, CommandParserError};
use crate::frame::{Frame, Protocol};
use crate::server::Redis;
use crate::Error;

/// Switches the connection to a different protocol version and returns the server properties.
/// Without a version the current protocol is kept.
///
/// Ref: <https://redis.io/docs/latest/commands/hello/>
#[derive(Debug, PartialEq)]
pub struct Hello {
    pub version: Option<i64>,
}

impl ServerExecutable for Hello {
    fn exec(self, _redis: &Redis, client: &mut Client) -> Result<Frame, Error> {
        if let Some(version) = self.version {
            let protocol =
                Protocol::try_from(version).map_err(|_| CommandError::UnsupportedProtocol)?;
            client.set_protocol(protocol);
        }

        let field = |name: &str| Frame::Bulk(name.to_string().into());

        Ok(Frame::Map(vec![
            (field("server"), field("redis")),
            (field("version"), field(env!("CARGO_PKG_VERSION"))),
            (field("proto"), Frame::Integer(client.protocol().into())),
            (field("id"), Frame::Integer(client.id() as i64)),
            (field("mode"), field("standalone")),
            (field("role"), field("master")),
            (field("modules"), Frame::Array(vec![])),
        ]))
    }
}

impl TryFrom<&mut CommandParser> for Hello {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let version = if parser.has_next() {
            Some(
                parser
                    .next_integer()
                    .map_err(|_| CommandParserError::InvalidArgument(
                        "Protocol version is not an integer or out of range".to_string(),
                    ))?,
            )
        } else {
            None
        };
        // AUTH and SETNAME options are accepted and ignored.
        parser.rest_strings()?;

        Ok(Self { version })
    }
}
