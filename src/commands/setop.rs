use bytes::Bytes;
use std::collections::HashSet;

use crate::commands::executable::Executable;
use crate::commands::{CommandError, CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Keyspace;
use crate::value::Value;
use crate::Error;

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum SetOp {
    Union,
    Inter,
    Diff,
}

/// SUNION, SINTER and SDIFF, plus their STORE variants when `destination` is set. Missing keys
/// count as empty sets. SDIFF subtracts every other set from the first one.
///
/// Ref: <https://redis.io/docs/latest/commands/sinter/>
#[derive(Debug, PartialEq)]
pub struct Setop {
    pub op: SetOp,
    pub destination: Option<String>,
    pub keys: Vec<String>,
}

impl Setop {
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
        let keys = parser.rest_strings()?;
        if keys.is_empty() {
            return Err(CommandParserError::EndOfStream);
        }

        Ok(Self {
            op,
            destination,
            keys,
        })
    }
}

/// Clones the set stored at each key, checking every type before anything is combined.
pub(crate) fn read_sets(
    db: &mut Keyspace,
    keys: &[String],
) -> Result<Vec<Option<HashSet<Bytes>>>, CommandError> {
    keys.iter()
        .map(|key| db.get(key).map(|value| value.as_set().cloned()).transpose())
        .collect()
}

pub(crate) fn combine(op: SetOp, sets: Vec<Option<HashSet<Bytes>>>) -> HashSet<Bytes> {
    let mut sets = sets.into_iter().map(Option::unwrap_or_default);
    let first = sets.next().unwrap_or_default();

    match op {
        SetOp::Union => sets.fold(first, |mut acc, set| {
            acc.extend(set);
            acc
        }),
        SetOp::Inter => sets.fold(first, |mut acc, set| {
            acc.retain(|member| set.contains(member));
            acc
        }),
        SetOp::Diff => sets.fold(first, |mut acc, set| {
            acc.retain(|member| !set.contains(member));
            acc
        }),
    }
}

impl Executable for Setop {
    fn exec(self, db: &mut Keyspace) -> Result<Frame, Error> {
        let result = combine(self.op, read_sets(db, &self.keys)?);

        if let Some(destination) = self.destination {
            let len = result.len();
            // An empty result deletes the destination.
            db.set(destination, Value::Set(result), None);
            return Ok(Frame::Integer(len as i64));
        }

        let mut members: Vec<_> = result.into_iter().collect();
        members.sort();
        Ok(Frame::Array(members.into_iter().map(Frame::Bulk).collect()))
    }
}
