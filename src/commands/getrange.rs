use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Keyspace;
use crate::Error;

/// Returns the substring of the string value stored at key, determined by the offsets start and
/// end (both are inclusive). Negative offsets can be used in order to provide an offset starting
/// from the end of the string. So -1 means the last character, -2 the penultimate and so forth.
/// The function handles out of range requests by limiting the resulting range to the actual length
/// of the string.
///
/// Ref: <https://redis.io/docs/latest/commands/getrange/>
#[derive(Debug, PartialEq)]
pub struct Getrange {
    pub key: String,
    pub start: i64,
    pub end: i64,
}

impl Executable for Getrange {
    fn exec(self, db: &mut Keyspace) -> Result<Frame, Error> {
        let Some(value) = db.get(&self.key) else {
            return Ok(Frame::Bulk(Bytes::new()));
        };
        let bytes = value.as_string()?;

        let range = byte_range(bytes.len(), self.start, self.end);
        Ok(Frame::Bulk(range.map_or_else(Bytes::new, |(from, to)| {
            bytes.slice(from..=to)
        })))
    }
}

/// Resolves an inclusive pair of possibly negative offsets against a string of `len` bytes.
/// `None` when the range selects nothing.
fn byte_range(len: usize, start: i64, end: i64) -> Option<(usize, usize)> {
    if len == 0 || (start < 0 && end < 0 && start > end) {
        return None;
    }

    let len = len as i64;
    let resolve = |index: i64| if index < 0 { (len + index).max(0) } else { index };
    let start = resolve(start);
    let end = resolve(end).min(len - 1);

    if start > end {
        return None;
    }
    Some((start as usize, end as usize))
}

impl TryFrom<&mut CommandParser> for Getrange {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let start = parser.next_integer()?;
        let end = parser.next_integer()?;
        parser.finish()?;

        Ok(Self { key, start, end })
    }
}
