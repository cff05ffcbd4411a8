use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::skiplist::{LexBound, Member, RangeOptions, ScoreBound};
use crate::store::Keyspace;
use crate::Error;

/// Returns the specified range of elements in the sorted set stored at key.
///
/// The range is given by index (the default), by score (`BYSCORE`) or lexicographically
/// (`BYLEX`). `REV` reverses the ordering, and when combined with `BYSCORE` or `BYLEX` the first
/// bound is the highest one. `LIMIT offset count` is only valid with `BYSCORE` or `BYLEX`, a
/// negative count returns everything from offset.
///
/// The older `ZREVRANGE`, `ZRANGEBYSCORE`, `ZREVRANGEBYSCORE`, `ZRANGEBYLEX` and
/// `ZREVRANGEBYLEX` commands all parse into this one.
///
/// Ref: <https://redis.io/docs/latest/commands/zrange/>
#[derive(Debug, PartialEq)]
pub struct Zrange {
    pub key: String,
    pub range: Range,
    pub reverse: bool,
    pub limit: Option<Limit>,
    pub with_scores: bool,
}

/// The bounds of a range, always in ascending terms.
#[derive(Debug, PartialEq)]
pub enum Range {
    /// 0-based indexes, negative ones count from the end.
    Rank(i64, i64),
    Score(ScoreBound, ScoreBound),
    Lex(LexBound, LexBound),
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub struct Limit {
    pub offset: i64,
    pub count: i64,
}

#[derive(PartialEq)]
enum By {
    Score,
    Lex,
}

impl Zrange {
    /// `ZRANGEBYSCORE key min max` and `ZREVRANGEBYSCORE key max min`.
    pub(crate) fn by_score(
        parser: &mut CommandParser,
        reverse: bool,
    ) -> Result<Zrange, CommandParserError> {
        let key = parser.next_string()?;
        let (min, max) = bounds(parser, reverse)?;
        let (limit, with_scores) = trailing_options(parser, true)?;

        Ok(Zrange {
            key,
            range: Range::Score(min.parse()?, max.parse()?),
            reverse,
            limit,
            with_scores,
        })
    }

    /// `ZRANGEBYLEX key min max` and `ZREVRANGEBYLEX key max min`.
    pub(crate) fn by_lex(
        parser: &mut CommandParser,
        reverse: bool,
    ) -> Result<Zrange, CommandParserError> {
        let key = parser.next_string()?;
        let (min, max) = bounds(parser, reverse)?;
        let (limit, _) = trailing_options(parser, false)?;

        Ok(Zrange {
            key,
            range: Range::Lex(min.parse()?, max.parse()?),
            reverse,
            limit,
            with_scores: false,
        })
    }

    /// `ZREVRANGE key start stop [WITHSCORES]`.
    pub(crate) fn by_rank_reversed(parser: &mut CommandParser) -> Result<Zrange, CommandParserError> {
        let key = parser.next_string()?;
        let start = parser.next_integer()?;
        let stop = parser.next_integer()?;

        let with_scores = parser.has_next();
        if with_scores && parser.next_keyword()? != "WITHSCORES" {
            return Err(CommandParserError::Syntax);
        }
        parser.finish()?;

        Ok(Zrange {
            key,
            range: Range::Rank(start, stop),
            reverse: true,
            limit: None,
            with_scores,
        })
    }
}

fn bounds(
    parser: &mut CommandParser,
    reverse: bool,
) -> Result<(String, String), CommandParserError> {
    let first = parser.next_string()?;
    let second = parser.next_string()?;

    if reverse {
        Ok((second, first))
    } else {
        Ok((first, second))
    }
}

fn parse_limit(parser: &mut CommandParser) -> Result<Limit, CommandParserError> {
    let offset = parser.next_integer()?;
    let count = parser.next_integer()?;
    Ok(Limit { offset, count })
}

// `[WITHSCORES] [LIMIT offset count]` in any order.
fn trailing_options(
    parser: &mut CommandParser,
    allow_with_scores: bool,
) -> Result<(Option<Limit>, bool), CommandParserError> {
    let mut limit = None;
    let mut with_scores = false;

    while parser.has_next() {
        match parser.next_keyword()?.as_str() {
            "LIMIT" => limit = Some(parse_limit(parser)?),
            "WITHSCORES" if allow_with_scores => with_scores = true,
            _ => return Err(CommandParserError::Syntax),
        }
    }

    Ok((limit, with_scores))
}

fn parse_rank(rank: &str) -> Result<i64, CommandParserError> {
    rank.parse::<i64>()
        .map_err(|_| CommandParserError::NotAnInteger)
}

/// Members as a flat array, each one followed by its score when `with_scores` is set.
pub(crate) fn members_reply(members: Vec<Member>, with_scores: bool) -> Frame {
    let mut frames = Vec::with_capacity(members.len() * if with_scores { 2 } else { 1 });

    for member in members {
        frames.push(Frame::Bulk(Bytes::from(member.key)));
        if with_scores {
            frames.push(Frame::Double(member.score));
        }
    }

    Frame::Array(frames)
}

impl Executable for Zrange {
    fn exec(self, db: &mut Keyspace) -> Result<Frame, Error> {
        let Some(value) = db.get(&self.key) else {
            return Ok(Frame::Array(vec![]));
        };
        let zset = value.as_sorted_set()?;

        let mut options = RangeOptions {
            reverse: self.reverse,
            ..Default::default()
        };
        if let Some(limit) = self.limit {
            let Ok(offset) = usize::try_from(limit.offset) else {
                return Ok(Frame::Array(vec![]));
            };
            options.offset = offset;
            options.limit = usize::try_from(limit.count).ok();
        }

        let members = match &self.range {
            // The skip list ranks are 1-based.
            Range::Rank(start, stop) => {
                let rank = |index: i64| if index >= 0 { index.saturating_add(1) } else { index };
                zset.range_by_rank(rank(*start), rank(*stop), options)
            }
            Range::Score(min, max) => zset.range_by_score(*min, *max, options),
            Range::Lex(min, max) => zset.range_by_lex(min, max, options),
        };

        Ok(members_reply(members, self.with_scores))
    }
}

impl TryFrom<&mut CommandParser> for Zrange {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let start = parser.next_string()?;
        let stop = parser.next_string()?;

        let mut by = None;
        let mut reverse = false;
        let mut limit = None;
        let mut with_scores = false;

        while parser.has_next() {
            match parser.next_keyword()?.as_str() {
                "BYSCORE" if by.is_none() => by = Some(By::Score),
                "BYLEX" if by.is_none() => by = Some(By::Lex),
                "REV" => reverse = true,
                "LIMIT" => limit = Some(parse_limit(parser)?),
                "WITHSCORES" => with_scores = true,
                _ => return Err(CommandParserError::Syntax),
            }
        }

        if limit.is_some() && by.is_none() {
            return Err(CommandParserError::InvalidArgument(
                "syntax error, LIMIT is only supported in combination with either BYSCORE or BYLEX"
                    .to_string(),
            ));
        }
        if with_scores && by == Some(By::Lex) {
            return Err(CommandParserError::InvalidArgument(
                "syntax error, WITHSCORES not supported in combination with BYLEX".to_string(),
            ));
        }

        // With REV the score and lex ranges are given from the highest bound.
        let (min, max) = if reverse && by.is_some() {
            (stop, start)
        } else {
            (start, stop)
        };

        let range = match by {
            None => Range::Rank(parse_rank(&min)?, parse_rank(&max)?),
            Some(By::Score) => Range::Score(min.parse()?, max.parse()?),
            Some(By::Lex) => Range::Lex(min.parse()?, max.parse()?),
        };

        Ok(Self {
            key,
            range,
            reverse,
            limit,
            with_scores,
        })
    }
}
