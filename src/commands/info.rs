use std::fmt::Write;

use crate::client::Client;
use crate::commands::executable::ServerExecutable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::server::Redis;
use crate::Error;

const SECTIONS: &[&str] = &["server", "clients", "replication", "keyspace"];

/// Information and statistics about the server, as `# Section` headers followed by `field:value`
/// lines.
///
/// Ref: <https://redis.io/docs/latest/commands/info/>
#[derive(Debug, PartialEq)]
pub struct Info {
    pub sections: Vec<String>,
}

impl ServerExecutable for Info {
    fn exec(self, redis: &Redis, _client: &mut Client) -> Result<Frame, Error> {
        let everything = self.sections.is_empty()
            || self
                .sections
                .iter()
                .any(|section| matches!(section.as_str(), "all" | "everything" | "default"));

        let mut info = String::new();
        for section in SECTIONS {
            if !everything && !self.sections.iter().any(|s| s == section) {
                continue;
            }
            if !info.is_empty() {
                info.push_str("\r\n");
            }
            write_section(&mut info, section, redis)?;
        }

        Ok(Frame::Bulk(info.into()))
    }
}

fn write_section(info: &mut String, section: &str, redis: &Redis) -> std::fmt::Result {
    match section {
        "server" => {
            writeln!(info, "# Server\r")?;
            writeln!(info, "redis_version:{}\r", env!("CARGO_PKG_VERSION"))?;
            writeln!(info, "redis_mode:standalone\r")?;
            writeln!(info, "process_id:{}\r", std::process::id())?;
            writeln!(info, "uptime_in_seconds:{}\r", redis.uptime().as_secs())?;
            if let Some(port) = redis.get_config_value("port") {
                writeln!(info, "tcp_port:{}\r", port)?;
            }
        }
        "clients" => {
            writeln!(info, "# Clients\r")?;
            writeln!(info, "connected_clients:{}\r", redis.connected_clients())?;
            writeln!(info, "blocked_clients:{}\r", redis.blocked_clients())?;
        }
        "replication" => {
            writeln!(info, "# Replication\r")?;
            writeln!(info, "role:master\r")?;
            writeln!(info, "connected_slaves:0\r")?;
        }
        "keyspace" => {
            writeln!(info, "# Keyspace\r")?;
            for db in redis.databases().created() {
                let state = db.lock();
                let keys = state.keyspace.len();
                if keys > 0 {
                    writeln!(
                        info,
                        "db{}:keys={},expires={},avg_ttl=0\r",
                        db.index(),
                        keys,
                        state.keyspace.expires()
                    )?;
                }
            }
        }
        _ => {}
    }
    Ok(())
}

impl TryFrom<&mut CommandParser> for Info {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let sections = parser
            .rest_strings()?
            .into_iter()
            .map(|section| section.to_lowercase())
            .collect();

        Ok(Self { sections })
    }
}
