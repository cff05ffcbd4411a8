use crate::commands::executable::Executable;
use crate::commands::set::Condition;
use crate::commands::{CommandError, CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::skiplist::SkipList;
use crate::store::Keyspace;
use crate::value::Value;
use crate::Error;

/// Adds all the specified members with the specified scores to the sorted set stored at key. If a
/// specified member is already a member of the sorted set, the score is updated and the element
/// reinserted at the right position to ensure the correct ordering.
///
/// Options:
/// * XX -- Only update elements that already exist. Don't add new elements.
/// * NX -- Only add new elements. Don't update already existing elements.
/// * LT -- Only update existing elements if the new score is less than the current score.
/// * GT -- Only update existing elements if the new score is greater than the current score.
/// * CH -- Count changed elements (new ones and updated scores) instead of only new ones.
/// * INCR -- Act like ZINCRBY. Only one score-element pair can be specified.
///
/// Ref: <https://redis.io/docs/latest/commands/zadd/>
#[derive(Debug, PartialEq)]
pub struct Zadd {
    pub key: String,
    pub condition: Option<Condition>,
    pub comparison: Option<Comparison>,
    pub ch: bool,
    pub incr: bool,
    pub members: Vec<(f64, String)>,
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Comparison {
    Gt,
    Lt,
}

impl Comparison {
    fn admits(self, new: f64, current: f64) -> bool {
        match self {
            Comparison::Gt => new > current,
            Comparison::Lt => new < current,
        }
    }
}

#[derive(Default)]
struct Changes {
    added: usize,
    updated: usize,
    // Score of the member after an INCR, if it was applied.
    score: Option<f64>,
}

impl Zadd {
    fn apply(&self, zset: &mut SkipList) -> Result<Changes, CommandError> {
        let mut changes = Changes::default();

        for (score, member) in &self.members {
            let score = match zset.score(member) {
                None if self.condition == Some(Condition::Xx) => continue,
                None => *score,
                Some(_) if self.condition == Some(Condition::Nx) => continue,
                Some(current) => {
                    let score = if self.incr { current + score } else { *score };
                    if score.is_nan() {
                        return Err(CommandError::NanScore);
                    }
                    if self
                        .comparison
                        .is_some_and(|comparison| !comparison.admits(score, current))
                    {
                        continue;
                    }
                    if score != current {
                        changes.updated += 1;
                    }
                    score
                }
            };

            if zset.insert(member, score) {
                changes.added += 1;
            }
            changes.score = Some(score);
        }

        Ok(changes)
    }
}

impl Executable for Zadd {
    fn exec(self, db: &mut Keyspace) -> Result<Frame, Error> {
        let skipped = if self.incr {
            Frame::NullBulkString
        } else {
            Frame::Integer(0)
        };

        if self.condition == Some(Condition::Xx) && !db.exists(&self.key) {
            return Ok(skipped);
        }

        let zset = db
            .get_or_insert_with(&self.key, || Value::SortedSet(SkipList::new()))
            .as_sorted_set_mut()?;
        let changes = self.apply(zset);
        db.prune(&self.key);
        let changes = changes?;

        if self.incr {
            return Ok(changes.score.map_or(skipped, Frame::Double));
        }

        let count = if self.ch {
            changes.added + changes.updated
        } else {
            changes.added
        };
        Ok(Frame::Integer(count as i64))
    }
}

impl TryFrom<&mut CommandParser> for Zadd {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;

        let mut condition = None;
        let mut comparison = None;
        let mut ch = false;
        let mut incr = false;

        // Flags come first. The first argument that is not a flag starts the score-member pairs.
        let mut first_score = None;
        while parser.has_next() {
            let argument = parser.next_string()?;
            match argument.to_uppercase().as_str() {
                "NX" => condition = Some(merge_condition(condition, Condition::Nx)?),
                "XX" => condition = Some(merge_condition(condition, Condition::Xx)?),
                "GT" => comparison = Some(merge_comparison(comparison, Comparison::Gt)?),
                "LT" => comparison = Some(merge_comparison(comparison, Comparison::Lt)?),
                "CH" => ch = true,
                "INCR" => incr = true,
                _ => {
                    first_score = Some(argument);
                    break;
                }
            }
        }

        let first_score = first_score.ok_or(CommandParserError::EndOfStream)?;
        if !parser.has_next() {
            return Err(CommandParserError::EndOfStream);
        }
        if parser.remaining() % 2 == 0 {
            return Err(CommandParserError::Syntax);
        }

        let mut members = vec![(parse_score(&first_score)?, parser.next_string()?)];
        while parser.has_next() {
            let score = parser.next_float()?;
            let member = parser.next_string()?;
            members.push((score, member));
        }

        Ok(Self {
            key,
            condition,
            comparison,
            ch,
            incr,
            members,
        })
        .and_then(Zadd::validate)
    }
}

impl Zadd {
    fn validate(self) -> Result<Zadd, CommandParserError> {
        if self.condition == Some(Condition::Nx) && self.comparison.is_some() {
            return Err(CommandParserError::InvalidArgument(
                "GT, LT, and/or NX options at the same time are not compatible".to_string(),
            ));
        }
        if self.incr && self.members.len() > 1 {
            return Err(CommandParserError::InvalidArgument(
                "INCR option supports a single increment-element pair".to_string(),
            ));
        }
        Ok(self)
    }
}

fn merge_condition(
    current: Option<Condition>,
    new: Condition,
) -> Result<Condition, CommandParserError> {
    match current {
        Some(current) if current != new => Err(CommandParserError::InvalidArgument(
            "XX and NX options at the same time are not compatible".to_string(),
        )),
        _ => Ok(new),
    }
}

fn merge_comparison(
    current: Option<Comparison>,
    new: Comparison,
) -> Result<Comparison, CommandParserError> {
    match current {
        Some(current) if current != new => Err(CommandParserError::InvalidArgument(
            "GT, LT, and/or NX options at the same time are not compatible".to_string(),
        )),
        _ => Ok(new),
    }
}

fn parse_score(score: &str) -> Result<f64, CommandParserError> {
    match score.parse::<f64>() {
        Ok(score) if !score.is_nan() => Ok(score),
        _ => Err(CommandParserError::NotAFloat),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::harness::{bulk, bulks, error, Harness};
    use crate::commands::Command;

    #[test]
    fn parse() {
        let cmd = Command::try_from(Harness::frame(&[
            "ZADD", "zset", "xx", "CH", "1", "one", "2.5", "two",
        ]))
        .unwrap();

        assert_eq!(
            cmd,
            Command::Zadd(Zadd {
                key: "zset".to_string(),
                condition: Some(Condition::Xx),
                comparison: None,
                ch: true,
                incr: false,
                members: vec![(1.0, "one".to_string()), (2.5, "two".to_string())],
            })
        );
    }

    #[test]
    fn invalid_arguments() {
        let mut h = Harness::new();

        assert_eq!(
            h.run(&["ZADD", "zset", "1", "one", "2"]),
            error("ERR syntax error")
        );
        assert_eq!(
            h.run(&["ZADD", "zset", "abc", "one"]),
            error("ERR value is not a valid float")
        );
        assert_eq!(
            h.run(&["ZADD", "zset", "NX", "XX", "1", "one"]),
            error("ERR XX and NX options at the same time are not compatible")
        );
        assert_eq!(
            h.run(&["ZADD", "zset", "NX", "GT", "1", "one"]),
            error("ERR GT, LT, and/or NX options at the same time are not compatible")
        );
        assert_eq!(
            h.run(&["ZADD", "zset", "INCR", "1", "one", "2", "two"]),
            error("ERR INCR option supports a single increment-element pair")
        );
        assert_eq!(
            h.run(&["ZADD", "zset"]),
            error("ERR wrong number of arguments for 'zadd' command")
        );
    }

    #[test]
    fn adds_and_updates() {
        let mut h = Harness::new();

        assert_eq!(
            h.run(&["ZADD", "zset", "1", "one", "2", "two"]),
            Frame::Integer(2)
        );
        assert_eq!(
            h.run(&["ZADD", "zset", "3", "one", "4", "three"]),
            Frame::Integer(1)
        );
        assert_eq!(
            h.run(&["ZADD", "zset", "CH", "5", "one", "2", "two"]),
            Frame::Integer(1)
        );
        assert_eq!(
            h.run(&["ZRANGE", "zset", "0", "-1"]),
            bulks(&["two", "three", "one"])
        );
    }

    #[test]
    fn conditions_and_comparisons() {
        let mut h = Harness::new();
        h.run(&["ZADD", "zset", "10", "a"]);

        assert_eq!(h.run(&["ZADD", "zset", "XX", "1", "b"]), Frame::Integer(0));
        assert_eq!(h.run(&["ZADD", "missing", "XX", "1", "b"]), Frame::Integer(0));
        assert_eq!(h.run(&["EXISTS", "missing"]), Frame::Integer(0));

        assert_eq!(h.run(&["ZADD", "zset", "NX", "1", "a"]), Frame::Integer(0));
        assert_eq!(h.run(&["ZSCORE", "zset", "a"]), bulk("10"));

        assert_eq!(h.run(&["ZADD", "zset", "GT", "CH", "5", "a"]), Frame::Integer(0));
        assert_eq!(h.run(&["ZADD", "zset", "GT", "CH", "15", "a"]), Frame::Integer(1));
        assert_eq!(h.run(&["ZADD", "zset", "LT", "CH", "20", "a"]), Frame::Integer(0));
        assert_eq!(h.run(&["ZSCORE", "zset", "a"]), bulk("15"));

        // GT and LT only restrict updates, new members are still added.
        assert_eq!(h.run(&["ZADD", "zset", "GT", "1", "b"]), Frame::Integer(1));
    }

    #[test]
    fn incr() {
        let mut h = Harness::new();

        assert_eq!(h.run(&["ZADD", "zset", "INCR", "2", "a"]), bulk("2"));
        assert_eq!(h.run(&["ZADD", "zset", "INCR", "1.5", "a"]), bulk("3.5"));
        assert_eq!(
            h.run(&["ZADD", "zset", "NX", "INCR", "1", "a"]),
            Frame::NullBulkString
        );

        h.run(&["ZADD", "inf", "+inf", "a"]);
        assert_eq!(
            h.run(&["ZADD", "inf", "INCR", "-inf", "a"]),
            error("ERR resulting score is not a number (NaN)")
        );
    }

    #[test]
    fn wrong_type() {
        let mut h = Harness::new();
        h.run(&["SET", "string", "1"]);

        assert_eq!(
            h.run(&["ZADD", "string", "1", "a"]),
            error("WRONGTYPE Operation against a key holding the wrong kind of value")
        );
    }
}
