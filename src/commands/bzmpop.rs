use tokio::time::Duration;

use crate::commands::executable::BlockingExecutable;
use crate::commands::zmpop::{parse_pop_args, pop_first};
use crate::commands::zpop::Side;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Keyspace;
use crate::Error;

/// The blocking variant of `ZMPOP`.
///
/// Ref: <https://redis.io/docs/latest/commands/bzmpop/>
#[derive(Debug, PartialEq)]
pub struct Bzmpop {
    pub timeout: Option<Duration>,
    pub keys: Vec<String>,
    pub side: Side,
    pub count: usize,
}

impl BlockingExecutable for Bzmpop {
    fn try_exec(&self, db: &mut Keyspace) -> Result<Option<Frame>, Error> {
        pop_first(db, &self.keys, self.side, self.count)
    }

    fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl TryFrom<&mut CommandParser> for Bzmpop {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let timeout = parser.next_timeout()?;
        let (keys, side, count) = parse_pop_args(parser)?;

        Ok(Self {
            timeout,
            keys,
            side,
            count,
        })
    }
}
