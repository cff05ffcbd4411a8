use glob_match::glob_match;
use std::collections::HashMap;
use tokio::time::Duration;

use crate::codec::DEFAULT_MAX_FRAME_SIZE;

pub const DEFAULT_PORT: u16 = 6379;
pub const DEFAULT_DATABASES: usize = 16;

/// Startup configuration of a server.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind: String,
    pub port: u16,
    /// Number of logical databases, `SELECT` accepts `0..databases`.
    pub databases: usize,
    pub max_frame_size: usize,
    /// How often expired keys nobody reads are reclaimed.
    pub sweep_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            databases: DEFAULT_DATABASES,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            sweep_interval: Duration::from_millis(100),
        }
    }
}

// Parameters clients commonly ask for on connect. None of them change the server's behavior.
const STATIC_PARAMETERS: &[(&str, &str)] = &[
    ("appendonly", "no"),
    ("appendfsync", "everysec"),
    ("cluster-enabled", "no"),
    ("daemonize", "no"),
    ("dbfilename", "dump.rdb"),
    ("maxclients", "10000"),
    ("maxmemory", "0"),
    ("maxmemory-policy", "noeviction"),
    ("protected-mode", "yes"),
    ("save", ""),
    ("slowlog-log-slower-than", "10000"),
    ("slowlog-max-len", "128"),
    ("timeout", "0"),
];

/// The flat parameter table behind `CONFIG GET` and `CONFIG SET`.
#[derive(Debug)]
pub struct ConfigTable {
    values: HashMap<String, String>,
}

impl ConfigTable {
    pub fn new(config: &Config) -> ConfigTable {
        let mut values: HashMap<String, String> = STATIC_PARAMETERS
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();

        values.insert("bind".to_string(), config.bind.clone());
        values.insert("port".to_string(), config.port.to_string());
        values.insert("databases".to_string(), config.databases.to_string());
        values.insert(
            "proto-max-bulk-len".to_string(),
            config.max_frame_size.to_string(),
        );
        values.insert(
            "hz".to_string(),
            (1000 / config.sweep_interval.as_millis().max(1)).to_string(),
        );

        ConfigTable { values }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(&key.to_lowercase()).map(String::as_str)
    }

    pub fn set(&mut self, key: &str, value: String) {
        self.values.insert(key.to_lowercase(), value);
    }

    /// Every parameter whose name matches the glob `pattern`, sorted by name.
    pub fn matching(&self, pattern: &str) -> Vec<(String, String)> {
        let pattern = pattern.to_lowercase();
        let mut matches: Vec<(String, String)> = self
            .values
            .iter()
            .filter(|(key, _)| glob_match(&pattern, key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        matches.sort();
        matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_from_the_startup_config() {
        let config = Config {
            port: 7000,
            databases: 4,
            ..Default::default()
        };
        let table = ConfigTable::new(&config);

        assert_eq!(table.get("port"), Some("7000"));
        assert_eq!(table.get("DATABASES"), Some("4"));
        assert_eq!(table.get("hz"), Some("10"));
        assert_eq!(table.get("nope"), None);
    }

    #[test]
    fn set_and_match() {
        let mut table = ConfigTable::new(&Config::default());
        table.set("maxmemory", "100mb".to_string());

        assert_eq!(
            table.matching("maxmemory*"),
            vec![
                ("maxmemory".to_string(), "100mb".to_string()),
                ("maxmemory-policy".to_string(), "noeviction".to_string()),
            ]
        );
        assert!(table.matching("*").len() > STATIC_PARAMETERS.len());
    }
}
