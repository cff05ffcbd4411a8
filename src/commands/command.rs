use crate::client::Client;
use crate::commands::executable::ServerExecutable;
use crate::commands::{CommandParser, CommandParserError, COMMAND_NAMES};
use crate::frame::Frame;
use crate::server::Redis;
use crate::Error;

/// Introspection of the command table, enough for clients that query it on connect.
///
/// Ref: <https://redis.io/docs/latest/commands/command/>
#[derive(Debug, PartialEq)]
pub enum Command {
    All,
    Count,
    List,
    Docs(Vec<String>),
}

impl ServerExecutable for Command {
    fn exec(self, _redis: &Redis, _client: &mut Client) -> Result<Frame, Error> {
        let names = COMMAND_NAMES.iter();

        let frame = match self {
            Command::All => Frame::Array(
                names
                    .map(|name| Frame::Array(vec![Frame::Bulk((*name).into())]))
                    .collect(),
            ),
            Command::Count => Frame::Integer(COMMAND_NAMES.len() as i64),
            Command::List => Frame::Array(names.map(|name| Frame::Bulk((*name).into())).collect()),
            Command::Docs(requested) => Frame::Map(
                names
                    .filter(|name| requested.is_empty() || requested.iter().any(|r| r == *name))
                    .map(|name| (Frame::Bulk((*name).into()), Frame::Map(vec![])))
                    .collect(),
            ),
        };

        Ok(frame)
    }
}

impl TryFrom<&mut CommandParser> for Command {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        if !parser.has_next() {
            return Ok(Command::All);
        }

        let subcommand = parser.next_string()?;
        let command = match subcommand.to_uppercase().as_str() {
            "COUNT" => Command::Count,
            "LIST" => Command::List,
            "DOCS" => {
                let names = parser.rest_strings()?;
                Command::Docs(names.into_iter().map(|name| name.to_lowercase()).collect())
            }
            _ => {
                return Err(CommandParserError::UnknownSubcommand {
                    command: parser.command().to_string(),
                    subcommand,
                })
            }
        };
        parser.finish()?;

        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::harness::{bulk, error, Harness};

    #[test]
    fn count_and_list() {
        let mut h = Harness::new();

        assert_eq!(
            h.run(&["COMMAND", "COUNT"]),
            Frame::Integer(COMMAND_NAMES.len() as i64)
        );

        let Frame::Array(names) = h.run(&["COMMAND", "LIST"]) else {
            panic!("expected an array");
        };
        assert!(names.contains(&bulk("zadd")));
        assert!(names.contains(&bulk("bzpopmin")));
    }

    #[test]
    fn docs_for_requested_commands() {
        let mut h = Harness::new();

        // RESP2 flattens the map.
        assert_eq!(
            h.run(&["COMMAND", "DOCS", "GET", "nope"]),
            Frame::Array(vec![bulk("get"), Frame::Array(vec![])])
        );
    }

    #[test]
    fn unknown_subcommand() {
        let mut h = Harness::new();

        assert_eq!(
            h.run(&["COMMAND", "frobnicate"]),
            error("ERR unknown subcommand 'frobnicate'. Try COMMAND HELP.")
        );
    }
}
