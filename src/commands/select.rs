use crate::client::Client;
use crate::commands::executable::ServerExecutable;
use crate::commands::{CommandError, CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::server::Redis;
use crate::Error;

/// Select the Redis logical database having the specified zero-based numeric index. New
/// connections always use the database 0.
///
/// Ref: <https://redis.io/docs/latest/commands/select>
#[derive(Debug, PartialEq)]
pub struct Select {
    pub index: i64,
}

impl ServerExecutable for Select {
    fn exec(self, redis: &Redis, client: &mut Client) -> Result<Frame, Error> {
        let index = usize::try_from(self.index)
            .ok()
            .filter(|index| *index < redis.databases().len())
            .ok_or(CommandError::DbIndexOutOfRange)?;

        client.select(index);
        Ok(Frame::Simple("OK".to_string()))
    }
}

impl TryFrom<&mut CommandParser> for Select {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let index = parser.next_integer()?;
        parser.finish()?;

        Ok(Self { index })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::harness::{bulk, error, ok, Harness};

    #[test]
    fn databases_are_separate() {
        let mut h = Harness::new();

        assert_eq!(h.run(&["SET", "key", "zero"]), ok());
        assert_eq!(h.run(&["SELECT", "1"]), ok());
        assert_eq!(h.client.db(), 1);
        assert_eq!(h.run(&["GET", "key"]), Frame::NullBulkString);

        assert_eq!(h.run(&["SET", "key", "one"]), ok());
        assert_eq!(h.run(&["SELECT", "0"]), ok());
        assert_eq!(h.run(&["GET", "key"]), bulk("zero"));
    }

    #[test]
    fn out_of_range() {
        let mut h = Harness::new();

        assert_eq!(h.run(&["SELECT", "16"]), error("ERR DB index is out of range"));
        assert_eq!(h.run(&["SELECT", "-1"]), error("ERR DB index is out of range"));
        assert_eq!(
            h.run(&["SELECT", "one"]),
            error("ERR value is not an integer or out of range")
        );
        assert_eq!(h.client.db(), 0);
    }
}
