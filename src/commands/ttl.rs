use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::{Expiry, Keyspace};
use crate::Error;

/// TTL returns the remaining time to live of a key that has a timeout. This introspection
/// capability allows a Redis client to check how many seconds a given key will continue to be part
/// of the dataset.
///
/// Returns -2 if the key does not exist and -1 if it has no associated expire.
///
/// Ref: <https://redis.io/docs/latest/commands/ttl>
#[derive(Debug, PartialEq)]
pub struct Ttl {
    pub key: String,
}

impl Executable for Ttl {
    fn exec(self, db: &mut Keyspace) -> Result<Frame, Error> {
        let ttl = match db.expiry(&self.key) {
            Some(Expiry::In(remaining)) => ((remaining.as_millis() + 500) / 1000) as i64,
            Some(Expiry::Never) => -1,
            None => -2,
        };
        Ok(Frame::Integer(ttl))
    }
}

impl TryFrom<&mut CommandParser> for Ttl {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        parser.finish()?;
        Ok(Self { key })
    }
}

#[cfg(test)]
mod tests {
    use tokio::time::{self, Duration, Instant};

    use super::*;

    #[tokio::test]
    async fn remaining_seconds() {
        time::pause();

        let mut db = Keyspace::new();
        db.set(
            "key".to_string(),
            "value".into(),
            Some(Instant::now() + Duration::from_secs(10)),
        );
        db.set("forever".to_string(), "value".into(), None);

        time::advance(Duration::from_millis(2600)).await;

        let ttl = |db: &mut Keyspace, key: &str| {
            Ttl {
                key: key.to_string(),
            }
            .exec(db)
            .unwrap()
        };

        assert_eq!(ttl(&mut db, "key"), Frame::Integer(7));
        assert_eq!(ttl(&mut db, "forever"), Frame::Integer(-1));
        assert_eq!(ttl(&mut db, "missing"), Frame::Integer(-2));
    }
}
