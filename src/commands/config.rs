use crate::client::Client;
use crate::commands::executable::ServerExecutable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::server::Redis;
use crate::Error;

/// `CONFIG GET parameter [parameter ...]` and `CONFIG SET parameter value [parameter value ...]`.
/// Parameters are stored but do not change how the server behaves.
///
/// Ref: <https://redis.io/docs/latest/commands/config-get/>
#[derive(Debug, PartialEq)]
pub enum Config {
    Get(Vec<String>),
    Set(Vec<(String, String)>),
}

impl ServerExecutable for Config {
    fn exec(self, redis: &Redis, _client: &mut Client) -> Result<Frame, Error> {
        match self {
            Config::Get(patterns) => {
                let mut pairs: Vec<(String, String)> = Vec::new();
                for pattern in &patterns {
                    for pair in redis.config_matching(pattern) {
                        if !pairs.contains(&pair) {
                            pairs.push(pair);
                        }
                    }
                }

                Ok(Frame::Map(
                    pairs
                        .into_iter()
                        .map(|(key, value)| (Frame::Bulk(key.into()), Frame::Bulk(value.into())))
                        .collect(),
                ))
            }
            Config::Set(pairs) => {
                for (key, value) in pairs {
                    redis.set_config_value(&key, value);
                }
                Ok(Frame::Simple("OK".to_string()))
            }
        }
    }
}

impl TryFrom<&mut CommandParser> for Config {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let subcommand = parser.next_string()?;

        match subcommand.to_uppercase().as_str() {
            "GET" => {
                let patterns = parser.rest_strings()?;
                if patterns.is_empty() {
                    return Err(CommandParserError::EndOfStream);
                }
                Ok(Config::Get(patterns))
            }
            "SET" => {
                let args = parser.rest_strings()?;
                if args.is_empty() || args.len() % 2 != 0 {
                    return Err(CommandParserError::EndOfStream);
                }
                let mut args = args.into_iter();
                let mut pairs = Vec::new();
                while let (Some(key), Some(value)) = (args.next(), args.next()) {
                    pairs.push((key, value));
                }
                Ok(Config::Set(pairs))
            }
            _ => Err(CommandParserError::UnknownSubcommand {
                command: parser.command().to_string(),
                subcommand,
            }),
        }
    }
}
