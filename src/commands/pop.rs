use crate::commands::executable::Executable;
use crate::commands::push::End;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Keyspace;
use crate::Error;

/// Removes and returns the first (`LPOP`) or last (`RPOP`) elements of the list stored at key.
///
/// By default, the command pops a single element. When provided with the optional count argument,
/// the reply will consist of up to count elements, depending on the list's length.
///
/// Ref: <https://redis.io/docs/latest/commands/lpop/>
#[derive(Debug, PartialEq)]
pub struct Pop {
    pub key: String,
    pub count: Option<usize>,
    pub end: End,
}

impl Pop {
    pub(crate) fn parse(parser: &mut CommandParser, end: End) -> Result<Pop, CommandParserError> {
        let key = parser.next_string()?;
        let count = if parser.has_next() {
            Some(parser.next_count()?)
        } else {
            None
        };
        parser.finish()?;

        Ok(Pop { key, count, end })
    }
}

impl Executable for Pop {
    fn exec(self, db: &mut Keyspace) -> Result<Frame, Error> {
        let Some(value) = db.get_mut(&self.key) else {
            return Ok(match self.count {
                Some(_) => Frame::NullArray,
                None => Frame::NullBulkString,
            });
        };
        let list = value.as_list_mut()?;

        let mut popped = Vec::new();
        for _ in 0..self.count.unwrap_or(1) {
            let value = match self.end {
                End::Front => list.pop_front(),
                End::Back => list.pop_back(),
            };
            match value {
                Some(value) => popped.push(Frame::Bulk(value)),
                None => break,
            }
        }
        db.prune(&self.key);

        match self.count {
            Some(_) => Ok(Frame::Array(popped)),
            None => Ok(popped.pop().unwrap_or(Frame::NullBulkString)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::harness::{bulk, bulks, Harness};

    #[test]
    fn single_element() {
        let mut h = Harness::new();
        h.run(&["RPUSH", "list", "a", "b", "c"]);

        assert_eq!(h.run(&["LPOP", "list"]), bulk("a"));
        assert_eq!(h.run(&["RPOP", "list"]), bulk("c"));
        assert_eq!(h.run(&["LPOP", "missing"]), Frame::NullBulkString);
    }

    #[test]
    fn with_count() {
        let mut h = Harness::new();
        h.run(&["RPUSH", "list", "a", "b", "c"]);

        assert_eq!(h.run(&["RPOP", "list", "2"]), bulks(&["c", "b"]));
        assert_eq!(h.run(&["LPOP", "list", "5"]), bulks(&["a"]));
        assert_eq!(h.run(&["LPOP", "list", "1"]), Frame::NullArray);
    }

    #[test]
    fn emptied_list_is_removed() {
        let mut h = Harness::new();
        h.run(&["RPUSH", "list", "a"]);
        h.run(&["LPOP", "list"]);

        assert_eq!(h.run(&["EXISTS", "list"]), Frame::Integer(0));
        assert_eq!(h.run(&["TYPE", "list"]), Frame::Simple("none".to_string()));
    }
}
