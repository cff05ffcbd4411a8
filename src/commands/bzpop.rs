use tokio::time::Duration;

use crate::commands::executable::BlockingExecutable;
use crate::commands::zpop::{pop, Side};
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Keyspace;
use crate::Error;

/// The blocking variant of `ZPOPMIN` and `ZPOPMAX`. Pops a single member from the first non-empty
/// sorted set, waiting up to `timeout` for one of the keys to get a member.
///
/// Ref: <https://redis.io/docs/latest/commands/bzpopmin/>
#[derive(Debug, PartialEq)]
pub struct Bzpop {
    pub keys: Vec<String>,
    pub side: Side,
    pub timeout: Option<Duration>,
}

impl Bzpop {
    pub(crate) fn parse(parser: &mut CommandParser, side: Side) -> Result<Bzpop, CommandParserError> {
        if parser.remaining() < 2 {
            return Err(CommandParserError::EndOfStream);
        }

        let keys = (1..parser.remaining())
            .map(|_| parser.next_string())
            .collect::<Result<Vec<_>, _>>()?;
        let timeout = parser.next_timeout()?;

        Ok(Bzpop {
            keys,
            side,
            timeout,
        })
    }
}

impl BlockingExecutable for Bzpop {
    fn try_exec(&self, db: &mut Keyspace) -> Result<Option<Frame>, Error> {
        for key in &self.keys {
            let Some(value) = db.get_mut(key) else {
                continue;
            };

            let member = pop(value.as_sorted_set_mut()?, self.side, 1).pop();
            db.prune(key);

            if let Some(member) = member {
                return Ok(Some(Frame::Array(vec![
                    Frame::Bulk(key.clone().into()),
                    Frame::Bulk(member.key.into()),
                    Frame::Double(member.score),
                ])));
            }
        }

        Ok(None)
    }

    fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}
