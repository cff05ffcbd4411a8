use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{CommandError, CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Keyspace;
use crate::Error;

/// Bytes the dynamic programming table may take, the same cap as a single string.
const MAX_TABLE_SIZE: u64 = 512 * 1024 * 1024;

/// The LCS command implements the longest common subsequence algorithm.
///
/// Note that this is different than the longest common string algorithm,
/// since matching characters in the string does not need to be contiguous.
///
/// Options:
/// * LEN -- Reply with the length of the match instead of the match itself.
/// * IDX -- Reply with the matching ranges in both strings, last match first.
/// * MINMATCHLEN len -- With IDX, skip ranges shorter than `len`.
/// * WITHMATCHLEN -- With IDX, add the length of each range.
///
/// Ref: <https://redis.io/docs/latest/commands/lcs>
#[derive(Debug, PartialEq, Default)]
pub struct Lcs {
    pub key1: String,
    pub key2: String,
    pub len: bool,
    pub idx: bool,
    pub min_match_len: usize,
    pub with_match_len: bool,
}

/// A run of bytes common to both strings, as inclusive offsets into each.
#[derive(Debug, PartialEq)]
struct Match {
    a: (usize, usize),
    b: (usize, usize),
}

impl Match {
    fn len(&self) -> usize {
        self.a.1 - self.a.0 + 1
    }
}

impl Executable for Lcs {
    fn exec(self, db: &mut Keyspace) -> Result<Frame, Error> {
        let a = string_or_empty(db, &self.key1)?;
        let b = string_or_empty(db, &self.key2)?;

        let cells = (a.len() as u64 + 1).saturating_mul(b.len() as u64 + 1);
        if cells.saturating_mul(4) > MAX_TABLE_SIZE {
            return Err(CommandError::LcsTooLarge.into());
        }

        let table = Table::build(&a, &b);

        if self.len {
            return Ok(Frame::Integer(table.len() as i64));
        }
        if !self.idx {
            return Ok(Frame::Bulk(Bytes::from(table.sequence(&a, &b))));
        }

        let matches = table
            .matches(&a, &b)
            .into_iter()
            .filter(|m| m.len() >= self.min_match_len)
            .map(|m| {
                let mut frames = vec![
                    Frame::Array(vec![Frame::Integer(m.a.0 as i64), Frame::Integer(m.a.1 as i64)]),
                    Frame::Array(vec![Frame::Integer(m.b.0 as i64), Frame::Integer(m.b.1 as i64)]),
                ];
                if self.with_match_len {
                    frames.push(Frame::Integer(m.len() as i64));
                }
                Frame::Array(frames)
            })
            .collect();

        Ok(Frame::Map(vec![
            (Frame::Bulk(Bytes::from("matches")), Frame::Array(matches)),
            (Frame::Bulk(Bytes::from("len")), Frame::Integer(table.len() as i64)),
        ]))
    }
}

fn string_or_empty(db: &mut Keyspace, key: &str) -> Result<Bytes, CommandError> {
    match db.get(key) {
        Some(value) => value.as_string().cloned(),
        None => Ok(Bytes::new()),
    }
}

/// `cell(i, j)` is the length of the longest common subsequence of `a[..i]` and `b[..j]`.
struct Table {
    width: usize,
    cells: Vec<u32>,
}

impl Table {
    fn build(a: &[u8], b: &[u8]) -> Table {
        let width = b.len() + 1;
        let mut cells = vec![0u32; (a.len() + 1) * width];

        for i in 1..=a.len() {
            for j in 1..=b.len() {
                cells[i * width + j] = if a[i - 1] == b[j - 1] {
                    cells[(i - 1) * width + j - 1] + 1
                } else {
                    cells[(i - 1) * width + j].max(cells[i * width + j - 1])
                };
            }
        }

        Table { width, cells }
    }

    fn cell(&self, i: usize, j: usize) -> u32 {
        self.cells[i * self.width + j]
    }

    fn len(&self) -> usize {
        self.cells.last().copied().unwrap_or_default() as usize
    }

    fn sequence(&self, a: &[u8], b: &[u8]) -> Vec<u8> {
        let mut sequence = Vec::with_capacity(self.len());
        let (mut i, mut j) = (a.len(), b.len());

        while i > 0 && j > 0 {
            if a[i - 1] == b[j - 1] {
                sequence.push(a[i - 1]);
                i -= 1;
                j -= 1;
            } else if self.cell(i - 1, j) > self.cell(i, j - 1) {
                i -= 1;
            } else {
                j -= 1;
            }
        }

        sequence.reverse();
        sequence
    }

    /// Walks the same path as [`Table::sequence`], grouping contiguous matches into ranges.
    fn matches(&self, a: &[u8], b: &[u8]) -> Vec<Match> {
        let mut matches = vec![];
        let mut current: Option<Match> = None;
        let (mut i, mut j) = (a.len(), b.len());

        while i > 0 && j > 0 {
            if a[i - 1] == b[j - 1] {
                match current.as_mut() {
                    Some(m) if m.a.0 == i && m.b.0 == j => {
                        m.a.0 -= 1;
                        m.b.0 -= 1;
                    }
                    _ => {
                        matches.extend(current.take());
                        current = Some(Match {
                            a: (i - 1, i - 1),
                            b: (j - 1, j - 1),
                        });
                    }
                }
                i -= 1;
                j -= 1;
            } else {
                matches.extend(current.take());
                if self.cell(i - 1, j) > self.cell(i, j - 1) {
                    i -= 1;
                } else {
                    j -= 1;
                }
            }
        }

        matches.extend(current);
        matches
    }
}

impl TryFrom<&mut CommandParser> for Lcs {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let mut lcs = Lcs {
            key1: parser.next_string()?,
            key2: parser.next_string()?,
            ..Default::default()
        };

        while parser.has_next() {
            match parser.next_keyword()?.as_str() {
                "LEN" => lcs.len = true,
                "IDX" => lcs.idx = true,
                "WITHMATCHLEN" => lcs.with_match_len = true,
                "MINMATCHLEN" => {
                    // Negative lengths filter nothing, like zero.
                    lcs.min_match_len = usize::try_from(parser.next_integer()?).unwrap_or(0);
                }
                _ => return Err(CommandParserError::Syntax),
            }
        }

        if lcs.len && lcs.idx {
            return Err(CommandParserError::InvalidArgument(
                "If you want both the length and indexes, please just use IDX.".to_string(),
            ));
        }

        Ok(lcs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::harness::{bulk, error, Harness};
    use crate::commands::Command;

    fn range(from: i64, to: i64) -> Frame {
        Frame::Array(vec![Frame::Integer(from), Frame::Integer(to)])
    }

    #[test]
    fn parse_options() {
        let cmd = Command::try_from(Harness::frame(&[
            "LCS",
            "foo",
            "bar",
            "idx",
            "MINMATCHLEN",
            "4",
            "WITHMATCHLEN",
        ]))
        .unwrap();

        assert_eq!(
            cmd,
            Command::Lcs(Lcs {
                key1: String::from("foo"),
                key2: String::from("bar"),
                len: false,
                idx: true,
                min_match_len: 4,
                with_match_len: true,
            })
        );

        let err = Command::try_from(Harness::frame(&["LCS", "a", "b", "LEN", "IDX"])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "ERR If you want both the length and indexes, please just use IDX."
        );
        assert_eq!(
            Command::try_from(Harness::frame(&["LCS", "a", "b", "NOPE"])),
            Err(CommandParserError::Syntax)
        );
    }

    #[test]
    fn sequences() {
        let mut h = Harness::new();
        h.run(&["MSET", "key1", "ohmytext", "key2", "mynewtext"]);

        assert_eq!(h.run(&["LCS", "key1", "key2"]), bulk("mytext"));
        assert_eq!(h.run(&["LCS", "key1", "key2", "LEN"]), Frame::Integer(6));
        assert_eq!(h.run(&["LCS", "key1", "missing"]), bulk(""));

        h.run(&["MSET", "foo", "1", "bar", "2"]);
        assert_eq!(h.run(&["LCS", "foo", "bar"]), bulk(""));
    }

    #[test]
    fn match_ranges() {
        let mut h = Harness::new();
        h.run(&["MSET", "key1", "ohmytext", "key2", "mynewtext"]);

        assert_eq!(
            h.run(&["LCS", "key1", "key2", "IDX"]),
            Frame::Map(vec![
                (
                    bulk("matches"),
                    Frame::Array(vec![
                        Frame::Array(vec![range(4, 7), range(5, 8)]),
                        Frame::Array(vec![range(2, 3), range(0, 1)]),
                    ])
                ),
                (bulk("len"), Frame::Integer(6)),
            ])
        );

        assert_eq!(
            h.run(&["LCS", "key1", "key2", "IDX", "MINMATCHLEN", "4", "WITHMATCHLEN"]),
            Frame::Map(vec![
                (
                    bulk("matches"),
                    Frame::Array(vec![Frame::Array(vec![
                        range(4, 7),
                        range(5, 8),
                        Frame::Integer(4)
                    ])])
                ),
                (bulk("len"), Frame::Integer(6)),
            ])
        );
    }

    #[test]
    fn wrong_type() {
        let mut h = Harness::new();
        h.run(&["SET", "key1", "abc"]);
        h.run(&["SADD", "set", "abc"]);

        assert_eq!(
            h.run(&["LCS", "key1", "set"]),
            error("WRONGTYPE Operation against a key holding the wrong kind of value")
        );
    }
}
