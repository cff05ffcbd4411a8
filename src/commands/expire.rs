use tokio::time::{Duration, Instant};

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Keyspace;
use crate::Error;

/// Set a timeout on key. After the timeout has expired, the key will automatically be deleted.
/// A timeout that is not positive deletes the key right away. `PEXPIRE` is the same command with
/// the timeout given in milliseconds.
///
/// Options:
/// * NX -- Set expiry only when the key has no expiry.
/// * XX -- Set expiry only when the key has an existing expiry.
/// * GT -- Set expiry only when the new expiry is greater than the current one.
/// * LT -- Set expiry only when the new expiry is less than the current one.
///
/// A key without expiry is treated as having an infinite TTL by GT and LT.
///
/// Ref: <https://redis.io/docs/latest/commands/expire/>
#[derive(Debug, PartialEq)]
pub struct Expire {
    pub key: String,
    pub millis: i64,
    pub condition: Option<ExpireCondition>,
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum ExpireCondition {
    Nx,
    Xx,
    Gt,
    Lt,
}

impl Expire {
    /// Parses `EXPIRE` or `PEXPIRE`, depending on the `unit` of the timeout.
    pub(crate) fn parse(
        parser: &mut CommandParser,
        unit: Duration,
    ) -> Result<Expire, CommandParserError> {
        let key = parser.next_string()?;
        let timeout = parser.next_integer()?;
        let millis = timeout
            .checked_mul(unit.as_millis() as i64)
            .ok_or_else(|| CommandParserError::InvalidExpireTime {
                command: parser.command().to_string(),
            })?;

        let mut condition = None;
        while parser.has_next() {
            let option = match parser.next_keyword()?.as_str() {
                "NX" => ExpireCondition::Nx,
                "XX" => ExpireCondition::Xx,
                "GT" => ExpireCondition::Gt,
                "LT" => ExpireCondition::Lt,
                option => {
                    return Err(CommandParserError::InvalidArgument(format!(
                        "Unsupported option {}",
                        option
                    )))
                }
            };

            condition = match (condition, option) {
                (None, option) => Some(option),
                (Some(current), option) if current == option => Some(option),
                (Some(ExpireCondition::Gt), ExpireCondition::Lt)
                | (Some(ExpireCondition::Lt), ExpireCondition::Gt) => {
                    return Err(CommandParserError::InvalidArgument(
                        "GT and LT options at the same time are not compatible".to_string(),
                    ))
                }
                _ => {
                    return Err(CommandParserError::InvalidArgument(
                        "NX and XX, GT or LT options at the same time are not compatible"
                            .to_string(),
                    ))
                }
            };
        }

        Ok(Expire {
            key,
            millis,
            condition,
        })
    }
}

impl Executable for Expire {
    fn exec(self, db: &mut Keyspace) -> Result<Frame, Error> {
        if !db.exists(&self.key) {
            return Ok(Frame::Integer(0));
        }

        let now = Instant::now();
        let deadline = match u64::try_from(self.millis) {
            Ok(millis) if millis > 0 => now + Duration::from_millis(millis),
            _ => now,
        };

        let current = db.expires_at(&self.key);
        let allowed = match self.condition {
            None => true,
            Some(ExpireCondition::Nx) => current.is_none(),
            Some(ExpireCondition::Xx) => current.is_some(),
            Some(ExpireCondition::Gt) => current.is_some_and(|current| deadline > current),
            Some(ExpireCondition::Lt) => current.map_or(true, |current| deadline < current),
        };

        if !allowed {
            return Ok(Frame::Integer(0));
        }

        db.set_expiry(&self.key, deadline);
        Ok(Frame::Integer(1))
    }
}
