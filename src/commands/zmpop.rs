use crate::commands::executable::Executable;
use crate::commands::zpop::{pop, Side};
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Keyspace;
use crate::Error;

/// Pops one or more elements from the first non-empty sorted set in the provided list of keys.
///
/// Ref: <https://redis.io/docs/latest/commands/zmpop/>
#[derive(Debug, PartialEq)]
pub struct Zmpop {
    pub keys: Vec<String>,
    pub side: Side,
    pub count: usize,
}

/// Parses the `numkeys key [key ...] MIN|MAX [COUNT count]` tail shared with `BZMPOP`.
pub(crate) fn parse_pop_args(
    parser: &mut CommandParser,
) -> Result<(Vec<String>, Side, usize), CommandParserError> {
    let numkeys = parser.next_integer()?;
    if numkeys <= 0 {
        return Err(CommandParserError::InvalidArgument(
            "numkeys should be greater than 0".to_string(),
        ));
    }
    let keys = parser.next_keys(numkeys as usize)?;

    let side = match parser.next_keyword()?.as_str() {
        "MIN" => Side::Min,
        "MAX" => Side::Max,
        _ => return Err(CommandParserError::Syntax),
    };

    let mut count = 1;
    if parser.has_next() {
        if parser.next_keyword()? != "COUNT" {
            return Err(CommandParserError::Syntax);
        }
        let n = parser.next_integer()?;
        if n <= 0 {
            return Err(CommandParserError::InvalidArgument(
                "count should be greater than 0".to_string(),
            ));
        }
        count = n as usize;
    }
    if parser.has_next() {
        return Err(CommandParserError::Syntax);
    }

    Ok((keys, side, count))
}

/// Pops from the first key holding a sorted set. Replies `[key, [[member, score] ...]]`, or
/// `None` when every key is empty.
pub(crate) fn pop_first(
    db: &mut Keyspace,
    keys: &[String],
    side: Side,
    count: usize,
) -> Result<Option<Frame>, Error> {
    for key in keys {
        let Some(value) = db.get_mut(key) else {
            continue;
        };

        let members = pop(value.as_sorted_set_mut()?, side, count);
        db.prune(key);

        let members = members
            .into_iter()
            .map(|member| {
                Frame::Array(vec![
                    Frame::Bulk(member.key.into()),
                    Frame::Double(member.score),
                ])
            })
            .collect();

        return Ok(Some(Frame::Array(vec![
            Frame::Bulk(key.clone().into()),
            Frame::Array(members),
        ])));
    }

    Ok(None)
}

impl Executable for Zmpop {
    fn exec(self, db: &mut Keyspace) -> Result<Frame, Error> {
        let reply = pop_first(db, &self.keys, self.side, self.count)?;
        Ok(reply.unwrap_or(Frame::NullArray))
    }
}

impl TryFrom<&mut CommandParser> for Zmpop {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let (keys, side, count) = parse_pop_args(parser)?;
        Ok(Self { keys, side, count })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::harness::{bulk, error, Harness};
    use crate::commands::Command;

    #[test]
    fn parse() {
        let cmd = Command::try_from(Harness::frame(&["ZMPOP", "2", "a", "b", "max", "count", "3"]))
            .unwrap();
        assert_eq!(
            cmd,
            Command::Zmpop(Zmpop {
                keys: vec!["a".to_string(), "b".to_string()],
                side: Side::Max,
                count: 3,
            })
        );
    }

    #[test]
    fn parse_errors() {
        let mut h = Harness::new();

        assert_eq!(
            h.run(&["ZMPOP", "0", "a", "MIN"]),
            error("ERR numkeys should be greater than 0")
        );
        assert_eq!(
            h.run(&["ZMPOP", "1", "a", "MIN", "COUNT", "0"]),
            error("ERR count should be greater than 0")
        );
        assert_eq!(h.run(&["ZMPOP", "1", "a", "UP"]), error("ERR syntax error"));
        assert_eq!(
            h.run(&["ZMPOP", "2", "a"]),
            error("ERR wrong number of arguments for 'zmpop' command")
        );
    }

    #[test]
    fn pops_from_first_non_empty_key() {
        let mut h = Harness::new();
        h.set_zset("second", &[("a", 1.0), ("b", 2.0), ("c", 3.0)]);

        assert_eq!(
            h.run(&["ZMPOP", "2", "first", "second", "MIN", "COUNT", "2"]),
            Frame::Array(vec![
                bulk("second"),
                Frame::Array(vec![
                    Frame::Array(vec![bulk("a"), bulk("1")]),
                    Frame::Array(vec![bulk("b"), bulk("2")]),
                ]),
            ])
        );
        assert_eq!(
            h.run(&["ZMPOP", "1", "second", "MAX", "COUNT", "10"]),
            Frame::Array(vec![
                bulk("second"),
                Frame::Array(vec![Frame::Array(vec![bulk("c"), bulk("3")])]),
            ])
        );
        assert_eq!(h.run(&["ZMPOP", "1", "second", "MIN"]), Frame::NullArray);
    }

    #[test]
    fn wrong_type_key_fails() {
        let mut h = Harness::new();
        h.run(&["SET", "string", "1"]);
        h.set_zset("zset", &[("a", 1.0)]);

        assert_eq!(
            h.run(&["ZMPOP", "2", "string", "zset", "MIN"]),
            error("WRONGTYPE Operation against a key holding the wrong kind of value")
        );
    }
}
