use bytes::Bytes;
use std::collections::VecDeque;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Keyspace;
use crate::value::Value;
use crate::Error;

/// Which end of a list a command works on.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum End {
    Front,
    Back,
}

/// Insert all the specified values at the head (`LPUSH`) or at the tail (`RPUSH`) of the list
/// stored at key. If key does not exist, it is created as empty list before performing the push
/// operation. Elements are inserted one after the other, so `LPUSH mylist a b c` results in a list
/// containing `c` as first element, `b` as second element and `a` as third element.
///
/// Ref: <https://redis.io/docs/latest/commands/lpush/>
#[derive(Debug, PartialEq)]
pub struct Push {
    pub key: String,
    pub values: Vec<Bytes>,
    pub end: End,
}

impl Push {
    pub(crate) fn parse(parser: &mut CommandParser, end: End) -> Result<Push, CommandParserError> {
        let key = parser.next_string()?;
        let values = parser.rest_bytes()?;
        if values.is_empty() {
            return Err(CommandParserError::EndOfStream);
        }

        Ok(Push { key, values, end })
    }
}

impl Executable for Push {
    fn exec(self, db: &mut Keyspace) -> Result<Frame, Error> {
        let list = db
            .get_or_insert_with(&self.key, || Value::List(VecDeque::new()))
            .as_list_mut()?;

        for value in self.values {
            match self.end {
                End::Front => list.push_front(value),
                End::Back => list.push_back(value),
            }
        }

        Ok(Frame::Integer(list.len() as i64))
    }
}
