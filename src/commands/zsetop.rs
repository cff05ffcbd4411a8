use std::collections::HashMap;

use crate::commands::executable::Executable;
use crate::commands::setop::SetOp;
use crate::commands::zrange::members_reply;
use crate::commands::{CommandError, CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::skiplist::{RangeOptions, SkipList};
use crate::store::Keyspace;
use crate::value::Value;
use crate::Error;

/// How the scores of a member found in several inputs are combined.
#[derive(Debug, PartialEq, Clone, Copy, Default)]
pub enum Aggregate {
    #[default]
    Sum,
    Min,
    Max,
}

impl Aggregate {
    fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            // inf + -inf
            Aggregate::Sum => zero_if_nan(a + b),
            Aggregate::Min => a.min(b),
            Aggregate::Max => a.max(b),
        }
    }
}

fn zero_if_nan(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score
    }
}

/// ZUNION, ZINTER and ZDIFF, plus their STORE variants when `destination` is set.
///
/// Inputs may be sorted sets or plain sets, whose members all score 1. Missing keys count as
/// empty. Each input's scores are multiplied by its weight before they are aggregated. The
/// result is ordered like any sorted set.
///
/// Options:
/// * WEIGHTS weight [weight ...] -- One multiplication factor per input. Not for ZDIFF.
/// * AGGREGATE SUM|MIN|MAX -- Defaults to SUM. Not for ZDIFF.
/// * WITHSCORES -- Reply with the scores too. Not for the STORE variants.
///
/// Ref: <https://redis.io/docs/latest/commands/zunion/>
#[derive(Debug, PartialEq)]
pub struct Zsetop {
    pub op: SetOp,
    pub destination: Option<String>,
    pub keys: Vec<String>,
    pub weights: Option<Vec<f64>>,
    pub aggregate: Aggregate,
    pub with_scores: bool,
}

impl Zsetop {
    pub(crate) fn parse(
        parser: &mut CommandParser,
        op: SetOp,
        store: bool,
    ) -> Result<Self, CommandParserError> {
        let destination = if store {
            Some(parser.next_string()?)
        } else {
            None
        };

        let numkeys = usize::try_from(parser.next_integer()?).unwrap_or(0);
        if numkeys == 0 {
            return Err(CommandParserError::InvalidArgument(format!(
                "at least 1 input key is needed for '{}' command",
                parser.command()
            )));
        }
        if numkeys > parser.remaining() {
            return Err(CommandParserError::Syntax);
        }
        let keys = parser.next_keys(numkeys)?;

        let mut zsetop = Zsetop {
            op,
            destination,
            keys,
            weights: None,
            aggregate: Aggregate::default(),
            with_scores: false,
        };

        while parser.has_next() {
            match parser.next_keyword()?.as_str() {
                "WEIGHTS" if op != SetOp::Diff && zsetop.weights.is_none() => {
                    zsetop.weights = Some(parse_weights(parser, numkeys)?);
                }
                "AGGREGATE" if op != SetOp::Diff => {
                    zsetop.aggregate = match parser.next_keyword()?.as_str() {
                        "SUM" => Aggregate::Sum,
                        "MIN" => Aggregate::Min,
                        "MAX" => Aggregate::Max,
                        _ => return Err(CommandParserError::Syntax),
                    };
                }
                "WITHSCORES" if !store => zsetop.with_scores = true,
                _ => return Err(CommandParserError::Syntax),
            }
        }

        Ok(zsetop)
    }

    fn weight(&self, index: usize) -> f64 {
        self.weights
            .as_ref()
            .and_then(|weights| weights.get(index).copied())
            .unwrap_or(1.0)
    }
}

fn parse_weights(
    parser: &mut CommandParser,
    count: usize,
) -> Result<Vec<f64>, CommandParserError> {
    (0..count)
        .map(|_| {
            parser.next_float().map_err(|err| match err {
                CommandParserError::EndOfStream => CommandParserError::Syntax,
                _ => CommandParserError::InvalidArgument("weight value is not a float".to_string()),
            })
        })
        .collect()
}

type Scores = HashMap<String, f64>;

/// Reads every input up front, so a wrong type fails the command before anything is combined.
pub(crate) fn read_inputs(db: &mut Keyspace, keys: &[String]) -> Result<Vec<Scores>, CommandError> {
    keys.iter()
        .map(|key| match db.get(key) {
            None => Ok(Scores::new()),
            Some(Value::SortedSet(zset)) => Ok(zset
                .iter()
                .map(|(member, score)| (member.to_string(), score))
                .collect()),
            Some(Value::Set(set)) => Ok(set
                .iter()
                .map(|member| (String::from_utf8_lossy(member).into_owned(), 1.0))
                .collect()),
            Some(_) => Err(CommandError::WrongType),
        })
        .collect()
}

pub(crate) fn combine(
    op: SetOp,
    inputs: Vec<Scores>,
    weight: impl Fn(usize) -> f64,
    aggregate: Aggregate,
) -> Scores {
    let mut inputs = inputs.into_iter().enumerate().map(|(index, input)| {
        let weight = weight(index);
        input
            .into_iter()
            .map(move |(member, score)| (member, zero_if_nan(score * weight)))
            .collect::<Scores>()
    });
    let first = inputs.next().unwrap_or_default();

    match op {
        SetOp::Union => inputs.fold(first, |mut acc, input| {
            for (member, score) in input {
                acc.entry(member)
                    .and_modify(|current| *current = aggregate.apply(*current, score))
                    .or_insert(score);
            }
            acc
        }),
        SetOp::Inter => inputs.fold(first, |acc, input| {
            acc.into_iter()
                .filter_map(|(member, score)| {
                    let other = input.get(&member)?;
                    let score = aggregate.apply(score, *other);
                    Some((member, score))
                })
                .collect()
        }),
        SetOp::Diff => inputs.fold(first, |mut acc, input| {
            acc.retain(|member, _| !input.contains_key(member));
            acc
        }),
    }
}

impl Executable for Zsetop {
    fn exec(self, db: &mut Keyspace) -> Result<Frame, Error> {
        let inputs = read_inputs(db, &self.keys)?;
        let scores = combine(self.op, inputs, |index| self.weight(index), self.aggregate);

        let mut zset = SkipList::new();
        for (member, score) in &scores {
            zset.insert(member, *score);
        }

        if let Some(destination) = self.destination {
            let len = zset.len();
            // An empty result deletes the destination.
            db.set(destination, Value::SortedSet(zset), None);
            return Ok(Frame::Integer(len as i64));
        }

        let members = zset.range_by_rank(1, -1, RangeOptions::default());
        Ok(members_reply(members, self.with_scores))
    }
}
