use crate::commands::executable::Executable;
use crate::commands::setop::{combine, read_sets, SetOp};
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Keyspace;
use crate::Error;

/// Returns the cardinality of the intersection of the given sets. With `LIMIT`, counting stops
/// once the limit is reached. A limit of 0 means unlimited.
///
/// Ref: <https://redis.io/docs/latest/commands/sintercard/>
#[derive(Debug, PartialEq)]
pub struct Sintercard {
    pub keys: Vec<String>,
    pub limit: Option<usize>,
}

impl Executable for Sintercard {
    fn exec(self, db: &mut Keyspace) -> Result<Frame, Error> {
        let len = combine(SetOp::Inter, read_sets(db, &self.keys)?).len();
        let len = self.limit.map_or(len, |limit| len.min(limit));

        Ok(Frame::Integer(len as i64))
    }
}

/// Parses `numkeys key [key ...] [LIMIT limit]`, shared with ZINTERCARD.
pub(crate) fn parse_card_args(
    parser: &mut CommandParser,
) -> Result<(Vec<String>, Option<usize>), CommandParserError> {
    let numkeys = parser.next_integer()?;
    let numkeys = usize::try_from(numkeys).unwrap_or(0);
    if numkeys > parser.remaining() {
        return Err(CommandParserError::InvalidArgument(
            "Number of keys can't be greater than number of args".to_string(),
        ));
    }
    let keys = parser.next_keys(numkeys)?;

    let mut limit = None;
    while parser.has_next() {
        match parser.next_keyword()?.as_str() {
            "LIMIT" => {
                let value = usize::try_from(parser.next_integer()?).map_err(|_| {
                    CommandParserError::InvalidArgument("LIMIT can't be negative".to_string())
                })?;
                limit = (value > 0).then_some(value);
            }
            _ => return Err(CommandParserError::Syntax),
        }
    }

    Ok((keys, limit))
}

impl TryFrom<&mut CommandParser> for Sintercard {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let (keys, limit) = parse_card_args(parser)?;
        Ok(Self { keys, limit })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::harness::{error, Harness};
    use crate::commands::Command;

    #[test]
    fn parse() {
        let cmd = Command::try_from(Harness::frame(&["SINTERCARD", "2", "a", "b", "LIMIT", "3"]))
            .unwrap();
        assert_eq!(
            cmd,
            Command::Sintercard(Sintercard {
                keys: vec!["a".to_string(), "b".to_string()],
                limit: Some(3),
            })
        );

        let cases = [
            (&["SINTERCARD", "0", "a"][..], "ERR numkeys should be greater than 0"),
            (
                &["SINTERCARD", "3", "a", "b"][..],
                "ERR Number of keys can't be greater than number of args",
            ),
            (
                &["SINTERCARD", "1", "a", "LIMIT", "-1"][..],
                "ERR LIMIT can't be negative",
            ),
            (&["SINTERCARD", "1", "a", "b"][..], "ERR syntax error"),
        ];
        for (args, message) in cases {
            let err = Command::try_from(Harness::frame(args)).unwrap_err();
            assert_eq!(err.to_string(), message, "{:?}", args);
        }
    }

    #[test]
    fn counts() {
        let mut h = Harness::new();
        h.run(&["SADD", "key1", "a", "b", "c", "d"]);
        h.run(&["SADD", "key2", "c", "d", "e"]);

        assert_eq!(h.run(&["SINTERCARD", "2", "key1", "key2"]), Frame::Integer(2));
        assert_eq!(
            h.run(&["SINTERCARD", "2", "key1", "key2", "LIMIT", "1"]),
            Frame::Integer(1)
        );
        assert_eq!(
            h.run(&["SINTERCARD", "2", "key1", "key2", "LIMIT", "0"]),
            Frame::Integer(2)
        );
        assert_eq!(h.run(&["SINTERCARD", "1", "missing"]), Frame::Integer(0));

        h.run(&["SET", "string", "x"]);
        assert_eq!(
            h.run(&["SINTERCARD", "2", "key1", "string"]),
            error("WRONGTYPE Operation against a key holding the wrong kind of value")
        );
    }
}
