use bytes::Bytes;
use tokio::time::{Duration, Instant};

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::{instant_from_unix_millis, Keyspace};
use crate::value::Value;
use crate::Error;

/// Set key to hold the string value. If key already holds a value, it is overwritten, regardless
/// of its type. Any previous time to live associated with the key is discarded on successful SET
/// operation.
///
/// Options:
/// * EX seconds -- Set the specified expire time, in seconds (a positive integer).
/// * PX milliseconds -- Set the specified expire time, in milliseconds (a positive integer).
/// * EXAT timestamp-seconds -- Set the specified Unix time at which the key will expire.
/// * PXAT timestamp-milliseconds -- Set the specified Unix time at which the key will expire, in
///   milliseconds.
/// * NX -- Only set the key if it does not already exist.
/// * XX -- Only set the key if it already exists.
/// * KEEPTTL -- Retain the time to live associated with the key.
/// * GET -- Return the old string stored at key, or nil if key did not exist.
///
/// Ref: <https://redis.io/docs/latest/commands/set/>
#[derive(Debug, PartialEq)]
pub struct Set {
    pub key: String,
    pub value: Bytes,
    pub condition: Option<Condition>,
    pub expiration: Option<Expiration>,
    pub get: bool,
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Condition {
    Nx,
    Xx,
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Expiration {
    /// Relative to the time the command runs.
    In(Duration),
    /// Unix time in milliseconds.
    At(u64),
    KeepTtl,
}

impl Expiration {
    /// Deadline on the monotonic clock. `None` for `KeepTtl`.
    pub fn deadline(&self) -> Option<Instant> {
        match self {
            Expiration::In(duration) => Some(Instant::now() + *duration),
            Expiration::At(millis) => Some(instant_from_unix_millis(*millis)),
            Expiration::KeepTtl => None,
        }
    }

    /// Parses the argument of `EX`, `PX`, `EXAT` or `PXAT`.
    pub(crate) fn parse(
        parser: &mut CommandParser,
        option: &str,
    ) -> Result<Expiration, CommandParserError> {
        let (unit, absolute) = match option {
            "EX" => (1000, false),
            "PX" => (1, false),
            "EXAT" => (1000, true),
            "PXAT" => (1, true),
            _ => return Err(CommandParserError::Syntax),
        };

        let millis = parse_expire_time(parser, unit)?;
        if absolute {
            Ok(Expiration::At(millis))
        } else {
            Ok(Expiration::In(Duration::from_millis(millis)))
        }
    }
}

/// Reads a strictly positive expire time and converts it to milliseconds.
pub(crate) fn parse_expire_time(
    parser: &mut CommandParser,
    unit_millis: u64,
) -> Result<u64, CommandParserError> {
    let value = parser.next_integer()?;

    u64::try_from(value)
        .ok()
        .filter(|value| *value > 0)
        .and_then(|value| value.checked_mul(unit_millis))
        .ok_or_else(|| CommandParserError::InvalidExpireTime {
            command: parser.command().to_string(),
        })
}

impl Executable for Set {
    fn exec(self, db: &mut Keyspace) -> Result<Frame, Error> {
        let (exists, previous) = match db.get(&self.key) {
            Some(value) if self.get => (true, Some(value.as_string()?.clone())),
            Some(_) => (true, None),
            None => (false, None),
        };

        let allowed = match self.condition {
            Some(Condition::Nx) => !exists,
            Some(Condition::Xx) => exists,
            None => true,
        };

        if allowed {
            let value = Value::String(self.value);
            match self.expiration {
                Some(Expiration::KeepTtl) => db.set_keep_ttl(self.key, value),
                Some(expiration) => db.set(self.key, value, expiration.deadline()),
                None => db.set(self.key, value, None),
            };
        }

        if self.get {
            return Ok(previous.map_or(Frame::NullBulkString, Frame::Bulk));
        }

        if allowed {
            Ok(Frame::Simple("OK".to_string()))
        } else {
            Ok(Frame::NullBulkString)
        }
    }
}

impl Set {
    /// `SETEX key seconds value` and `PSETEX key milliseconds value`, a plain SET with a
    /// relative expiration.
    pub(crate) fn setex(
        parser: &mut CommandParser,
        unit_millis: u64,
    ) -> Result<Self, CommandParserError> {
        let key = parser.next_string()?;
        let millis = parse_expire_time(parser, unit_millis)?;
        let value = parser.next_bytes()?;
        parser.finish()?;

        Ok(Self {
            key,
            value,
            condition: None,
            expiration: Some(Expiration::In(Duration::from_millis(millis))),
            get: false,
        })
    }
}

impl TryFrom<&mut CommandParser> for Set {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let value = parser.next_bytes()?;

        let mut condition = None;
        let mut expiration = None;
        let mut get = false;

        while parser.has_next() {
            let option = parser.next_keyword()?;

            match option.as_str() {
                "NX" if condition.is_none() => condition = Some(Condition::Nx),
                "XX" if condition.is_none() => condition = Some(Condition::Xx),
                "GET" if !get => get = true,
                "KEEPTTL" if expiration.is_none() => expiration = Some(Expiration::KeepTtl),
                "EX" | "PX" | "EXAT" | "PXAT" if expiration.is_none() => {
                    expiration = Some(Expiration::parse(parser, &option)?);
                }
                _ => return Err(CommandParserError::Syntax),
            }
        }

        Ok(Self {
            key,
            value,
            condition,
            expiration,
            get,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::harness::{bulk, error, ok, Harness};
    use crate::commands::Command;
    use tokio::time;

    #[test]
    fn parse_options() {
        let cmd = Command::try_from(Harness::frame(&[
            "SET", "key", "value", "nx", "PX", "1500", "GET",
        ]))
        .unwrap();

        assert_eq!(
            cmd,
            Command::Set(Set {
                key: "key".to_string(),
                value: Bytes::from("value"),
                condition: Some(Condition::Nx),
                expiration: Some(Expiration::In(Duration::from_millis(1500))),
                get: true,
            })
        );
    }

    #[test]
    fn conflicting_options() {
        let cases: [&[&str]; 4] = [
            &["SET", "k", "v", "NX", "XX"],
            &["SET", "k", "v", "EX", "1", "PX", "1"],
            &["SET", "k", "v", "KEEPTTL", "EX", "1"],
            &["SET", "k", "v", "BOGUS"],
        ];

        for args in cases {
            assert_eq!(
                Command::try_from(Harness::frame(args)),
                Err(CommandParserError::Syntax)
            );
        }
    }

    #[test]
    fn invalid_expire_time() {
        let err = Command::try_from(Harness::frame(&["SET", "k", "v", "EX", "0"])).unwrap_err();
        assert_eq!(err.to_string(), "ERR invalid expire time in 'set' command");

        let err = Command::try_from(Harness::frame(&["SET", "k", "v", "PX", "-5"])).unwrap_err();
        assert_eq!(err.to_string(), "ERR invalid expire time in 'set' command");
    }

    #[test]
    fn parse_setex() {
        let cmd = Command::try_from(Harness::frame(&["SETEX", "key", "10", "value"])).unwrap();

        assert_eq!(
            cmd,
            Command::Set(Set {
                key: "key".to_string(),
                value: Bytes::from("value"),
                condition: None,
                expiration: Some(Expiration::In(Duration::from_secs(10))),
                get: false,
            })
        );

        let cmd = Command::try_from(Harness::frame(&["PSETEX", "key", "250", "value"])).unwrap();
        assert!(matches!(
            cmd,
            Command::Set(Set {
                expiration: Some(Expiration::In(duration)),
                ..
            }) if duration == Duration::from_millis(250)
        ));

        let err = Command::try_from(Harness::frame(&["SETEX", "key", "0", "v"])).unwrap_err();
        assert_eq!(err.to_string(), "ERR invalid expire time in 'setex' command");

        let err = Command::try_from(Harness::frame(&["SETEX", "key", "1"])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "ERR wrong number of arguments for 'setex' command"
        );
    }

    #[tokio::test]
    async fn setex_overwrites_with_a_ttl() {
        time::pause();
        let mut h = Harness::new();
        h.run(&["SADD", "key", "a"]);

        assert_eq!(h.run(&["SETEX", "key", "5", "v"]), ok());
        assert_eq!(h.run(&["GET", "key"]), bulk("v"));
        assert_eq!(h.run(&["TTL", "key"]), Frame::Integer(5));

        time::advance(Duration::from_secs(6)).await;
        assert_eq!(h.run(&["GET", "key"]), Frame::NullBulkString);
    }

    #[test]
    fn conditions() {
        let mut h = Harness::new();

        assert_eq!(h.run(&["SET", "k", "1", "XX"]), Frame::NullBulkString);
        assert_eq!(h.run(&["SET", "k", "1", "NX"]), ok());
        assert_eq!(h.run(&["SET", "k", "2", "NX"]), Frame::NullBulkString);
        assert_eq!(h.run(&["SET", "k", "3", "XX"]), ok());
        assert_eq!(h.run(&["GET", "k"]), bulk("3"));
    }

    #[test]
    fn get_returns_the_previous_value() {
        let mut h = Harness::new();

        assert_eq!(h.run(&["SET", "k", "1", "GET"]), Frame::NullBulkString);
        assert_eq!(h.run(&["SET", "k", "2", "GET"]), bulk("1"));
        assert_eq!(h.run(&["SET", "k", "3", "NX", "GET"]), bulk("2"));
        assert_eq!(h.run(&["GET", "k"]), bulk("2"));

        h.run(&["SADD", "set", "a"]);
        assert_eq!(
            h.run(&["SET", "set", "x", "GET"]),
            error("WRONGTYPE Operation against a key holding the wrong kind of value")
        );
        assert_eq!(h.run(&["SET", "set", "x"]), ok());
    }

    #[tokio::test]
    async fn expiration() {
        time::pause();
        let mut h = Harness::new();

        assert_eq!(h.run(&["SET", "k", "v", "EX", "10"]), ok());
        assert_eq!(h.run(&["TTL", "k"]), Frame::Integer(10));

        assert_eq!(h.run(&["SET", "k", "w", "KEEPTTL"]), ok());
        assert_eq!(h.run(&["TTL", "k"]), Frame::Integer(10));

        assert_eq!(h.run(&["SET", "k", "x"]), ok());
        assert_eq!(h.run(&["TTL", "k"]), Frame::Integer(-1));

        h.run(&["SET", "k", "y", "PX", "100"]);
        time::advance(Duration::from_millis(100)).await;
        assert_eq!(h.run(&["GET", "k"]), Frame::NullBulkString);
    }
}
