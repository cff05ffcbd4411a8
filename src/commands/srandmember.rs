use rand::seq::{IteratorRandom, SliceRandom};

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Keyspace;
use crate::Error;

/// Returns random members of the set stored at key, without removing them.
///
/// A positive count returns up to `count` distinct members. A negative count returns exactly
/// `-count` members, possibly repeated.
///
/// Ref: <https://redis.io/docs/latest/commands/srandmember/>
#[derive(Debug, PartialEq)]
pub struct Srandmember {
    pub key: String,
    pub count: Option<i64>,
}

impl Executable for Srandmember {
    fn exec(self, db: &mut Keyspace) -> Result<Frame, Error> {
        let Some(value) = db.get(&self.key) else {
            return Ok(match self.count {
                Some(_) => Frame::Array(vec![]),
                None => Frame::NullBulkString,
            });
        };
        let set = value.as_set()?;
        let mut rng = rand::thread_rng();

        let Some(count) = self.count else {
            return Ok(set
                .iter()
                .choose(&mut rng)
                .map_or(Frame::NullBulkString, |member| Frame::Bulk(member.clone())));
        };

        let members = if count >= 0 {
            set.iter().cloned().choose_multiple(&mut rng, count as usize)
        } else {
            let all: Vec<_> = set.iter().collect();
            (0..count.unsigned_abs())
                .filter_map(|_| all.choose(&mut rng).map(|member| (*member).clone()))
                .collect()
        };

        Ok(Frame::Array(members.into_iter().map(Frame::Bulk).collect()))
    }
}

impl TryFrom<&mut CommandParser> for Srandmember {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let count = if parser.has_next() {
            let count = parser.next_integer()?;
            // Repeated picks are materialized, so keep them within what can be allocated.
            if !(-i64::MAX / 2..=i64::MAX / 2).contains(&count) {
                return Err(CommandParserError::InvalidArgument(
                    "value is out of range".to_string(),
                ));
            }
            Some(count)
        } else {
            None
        };
        parser.finish()?;

        Ok(Self { key, count })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::harness::{bulk, Harness};
    use crate::commands::Command;

    fn members(frame: Frame) -> Vec<Frame> {
        match frame {
            Frame::Array(members) => members,
            frame => panic!("expected an array, got {:?}", frame),
        }
    }

    #[test]
    fn parse() {
        let cmd = Command::try_from(Harness::frame(&["SRANDMEMBER", "set", "-5"])).unwrap();
        assert_eq!(
            cmd,
            Command::Srandmember(Srandmember {
                key: "set".to_string(),
                count: Some(-5),
            })
        );

        let err = Command::try_from(Harness::frame(&[
            "SRANDMEMBER",
            "set",
            "-9223372036854775808",
        ]))
        .unwrap_err();
        assert_eq!(err.to_string(), "ERR value is out of range");
    }

    #[test]
    fn distinct_members() {
        let mut h = Harness::new();
        h.run(&["SADD", "set", "a", "b", "c"]);

        let picked = members(h.run(&["SRANDMEMBER", "set", "2"]));
        assert_eq!(picked.len(), 2);
        assert_ne!(picked[0], picked[1]);

        let mut all = members(h.run(&["SRANDMEMBER", "set", "10"]));
        all.sort_by_key(|frame| frame.to_string());
        assert_eq!(all, vec![bulk("a"), bulk("b"), bulk("c")]);

        assert_eq!(h.run(&["SCARD", "set"]), Frame::Integer(3));
    }

    #[test]
    fn repeated_members() {
        let mut h = Harness::new();
        h.run(&["SADD", "set", "only"]);

        assert_eq!(
            h.run(&["SRANDMEMBER", "set", "-3"]),
            Frame::Array(vec![bulk("only"), bulk("only"), bulk("only")])
        );
        assert_eq!(h.run(&["SRANDMEMBER", "set"]), bulk("only"));
    }

    #[test]
    fn missing_key() {
        let mut h = Harness::new();

        assert_eq!(h.run(&["SRANDMEMBER", "set"]), Frame::NullBulkString);
        assert_eq!(h.run(&["SRANDMEMBER", "set", "-2"]), Frame::Array(vec![]));
    }
}
