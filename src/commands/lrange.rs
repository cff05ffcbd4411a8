use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Keyspace;
use crate::Error;

/// Returns the specified elements of the list stored at key. The offsets start and stop are
/// zero-based indexes, negative offsets count from the end of the list. Both ends are inclusive.
///
/// Ref: <https://redis.io/docs/latest/commands/lrange/>
#[derive(Debug, PartialEq)]
pub struct Lrange {
    pub key: String,
    pub start: i64,
    pub stop: i64,
}

impl Executable for Lrange {
    fn exec(self, db: &mut Keyspace) -> Result<Frame, Error> {
        let Some(value) = db.get(&self.key) else {
            return Ok(Frame::Array(vec![]));
        };
        let list = value.as_list()?;

        let len = list.len() as i64;
        let start = if self.start < 0 {
            (len + self.start).max(0)
        } else {
            self.start
        };
        let stop = if self.stop < 0 {
            len + self.stop
        } else {
            self.stop.min(len - 1)
        };

        if start > stop || start >= len {
            return Ok(Frame::Array(vec![]));
        }

        let elements = list
            .iter()
            .skip(start as usize)
            .take((stop - start + 1) as usize)
            .cloned()
            .map(Frame::Bulk)
            .collect();

        Ok(Frame::Array(elements))
    }
}

impl TryFrom<&mut CommandParser> for Lrange {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let start = parser.next_integer()?;
        let stop = parser.next_integer()?;
        parser.finish()?;

        Ok(Self { key, start, stop })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::harness::{bulks, Harness};

    #[test]
    fn ranges() {
        let mut h = Harness::new();
        h.run(&["RPUSH", "list", "one", "two", "three"]);

        assert_eq!(h.run(&["LRANGE", "list", "0", "0"]), bulks(&["one"]));
        assert_eq!(
            h.run(&["LRANGE", "list", "-3", "2"]),
            bulks(&["one", "two", "three"])
        );
        assert_eq!(
            h.run(&["LRANGE", "list", "-100", "100"]),
            bulks(&["one", "two", "three"])
        );
        assert_eq!(h.run(&["LRANGE", "list", "5", "10"]), bulks(&[]));
        assert_eq!(h.run(&["LRANGE", "list", "2", "1"]), bulks(&[]));
        assert_eq!(h.run(&["LRANGE", "missing", "0", "-1"]), bulks(&[]));
    }
}
