use crate::commands::executable::Executable;
use crate::commands::set::Expiration;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Keyspace;
use crate::Error;

/// Get the value of key and optionally set its expiration.
///
/// Ref: <https://redis.io/docs/latest/commands/getex/>
#[derive(Debug, PartialEq)]
pub struct Getex {
    pub key: String,

    pub ttl: Option<Ttl>,
}

#[derive(Debug, PartialEq)]
pub enum Ttl {
    Expire(Expiration),
    Persist, // Remove the expiration.
}

impl Executable for Getex {
    fn exec(self, db: &mut Keyspace) -> Result<Frame, Error> {
        let value = match db.get(&self.key) {
            Some(value) => value.as_string()?.clone(),
            None => return Ok(Frame::NullBulkString),
        };

        match self.ttl {
            Some(Ttl::Persist) => {
                db.persist(&self.key);
            }
            Some(Ttl::Expire(expiration)) => {
                if let Some(deadline) = expiration.deadline() {
                    db.set_expiry(&self.key, deadline);
                }
            }
            None => {}
        }

        Ok(Frame::Bulk(value))
    }
}

impl TryFrom<&mut CommandParser> for Getex {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;

        let mut ttl = None;

        while parser.has_next() {
            let option = parser.next_keyword()?;

            match option.as_str() {
                "EX" | "PX" | "EXAT" | "PXAT" if ttl.is_none() => {
                    ttl = Some(Ttl::Expire(Expiration::parse(parser, &option)?));
                }
                "PERSIST" if ttl.is_none() => {
                    ttl = Some(Ttl::Persist);
                }
                _ => return Err(CommandParserError::Syntax),
            }
        }

        Ok(Self { key, ttl })
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use std::time::{SystemTime, UNIX_EPOCH};
    use tokio::time::{self, Duration};

    use super::*;
    use crate::commands::harness::{bulk, Harness};
    use crate::commands::Command;

    #[test]
    fn parse() {
        let frame = Frame::Array(vec![
            Frame::Bulk(Bytes::from("GETEX")),
            Frame::Bulk(Bytes::from("key1")),
            Frame::Bulk(Bytes::from("PERSIST")),
        ]);
        let cmd = Command::try_from(frame).unwrap();

        assert_eq!(
            cmd,
            Command::Getex(Getex {
                key: String::from("key1"),
                ttl: Some(Ttl::Persist),
            })
        );

        let frame = Frame::Array(vec![
            Frame::Bulk(Bytes::from("GETEX")),
            Frame::Bulk(Bytes::from("key1")),
            Frame::Bulk(Bytes::from("EX")),
            Frame::Integer(10),
        ]);
        let cmd = Command::try_from(frame).unwrap();

        assert_eq!(
            cmd,
            Command::Getex(Getex {
                key: String::from("key1"),
                ttl: Some(Ttl::Expire(Expiration::In(Duration::from_secs(10)))),
            })
        );
    }

    #[tokio::test]
    async fn sets_and_removes_the_expiration() {
        time::pause();
        let mut h = Harness::new();

        assert_eq!(h.run(&["GETEX", "missing", "EX", "5"]), Frame::NullBulkString);

        h.run(&["SET", "key1", "1"]);
        assert_eq!(h.run(&["GETEX", "key1", "EX", "5"]), bulk("1"));
        assert_eq!(h.run(&["TTL", "key1"]), Frame::Integer(5));

        assert_eq!(h.run(&["GETEX", "key1", "PERSIST"]), bulk("1"));
        assert_eq!(h.run(&["TTL", "key1"]), Frame::Integer(-1));
    }

    #[tokio::test]
    async fn absolute_expiration() {
        let mut h = Harness::new();
        h.run(&["SET", "key1", "1"]);

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();
        let at = (now + 100).to_string();

        assert_eq!(h.run(&["GETEX", "key1", "EXAT", &at]), bulk("1"));
        let Frame::Integer(ttl) = h.run(&["TTL", "key1"]) else {
            panic!("TTL must reply with an integer");
        };
        assert!((98..=100).contains(&ttl), "unexpected ttl {}", ttl);

        // A timestamp in the past deletes the key.
        assert_eq!(h.run(&["GETEX", "key1", "PXAT", "1"]), bulk("1"));
        assert_eq!(h.run(&["EXISTS", "key1"]), Frame::Integer(0));
    }
}
