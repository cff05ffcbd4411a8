use bytes::Bytes;
use std::collections::{HashSet, VecDeque};
use strum::{AsRefStr, Display};

use crate::commands::CommandError;
use crate::skiplist::SkipList;

/// A value stored under a key.
#[derive(Clone, Debug)]
pub enum Value {
    String(Bytes),
    List(VecDeque<Bytes>),
    Set(HashSet<Bytes>),
    SortedSet(SkipList),
}

/// The type tag reported by `TYPE`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, AsRefStr, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Kind {
    String,
    List,
    Set,
    #[strum(serialize = "zset")]
    SortedSet,
}

/// Internal representation reported by `OBJECT ENCODING`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, AsRefStr, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Encoding {
    Int,
    Embstr,
    Raw,
    Quicklist,
    Hashtable,
    Skiplist,
}

/// Longest string Redis keeps embedded in its object header.
const EMBSTR_MAX_LEN: usize = 44;

impl Value {
    pub fn kind(&self) -> Kind {
        match self {
            Value::String(_) => Kind::String,
            Value::List(_) => Kind::List,
            Value::Set(_) => Kind::Set,
            Value::SortedSet(_) => Kind::SortedSet,
        }
    }

    pub fn encoding(&self) -> Encoding {
        match self {
            Value::String(bytes) => {
                let is_int = bytes.len() <= 20
                    && std::str::from_utf8(bytes).is_ok_and(|s| s.parse::<i64>().is_ok());
                if is_int {
                    Encoding::Int
                } else if bytes.len() <= EMBSTR_MAX_LEN {
                    Encoding::Embstr
                } else {
                    Encoding::Raw
                }
            }
            Value::List(_) => Encoding::Quicklist,
            Value::Set(_) => Encoding::Hashtable,
            Value::SortedSet(_) => Encoding::Skiplist,
        }
    }

    /// Collections with no elements must not be kept in the keyspace.
    pub fn is_empty_collection(&self) -> bool {
        match self {
            Value::String(_) => false,
            Value::List(list) => list.is_empty(),
            Value::Set(set) => set.is_empty(),
            Value::SortedSet(zset) => zset.is_empty(),
        }
    }

    pub fn as_string(&self) -> Result<&Bytes, CommandError> {
        match self {
            Value::String(bytes) => Ok(bytes),
            _ => Err(CommandError::WrongType),
        }
    }

    pub fn as_list(&self) -> Result<&VecDeque<Bytes>, CommandError> {
        match self {
            Value::List(list) => Ok(list),
            _ => Err(CommandError::WrongType),
        }
    }

    pub fn as_list_mut(&mut self) -> Result<&mut VecDeque<Bytes>, CommandError> {
        match self {
            Value::List(list) => Ok(list),
            _ => Err(CommandError::WrongType),
        }
    }

    pub fn as_set(&self) -> Result<&HashSet<Bytes>, CommandError> {
        match self {
            Value::Set(set) => Ok(set),
            _ => Err(CommandError::WrongType),
        }
    }

    pub fn as_set_mut(&mut self) -> Result<&mut HashSet<Bytes>, CommandError> {
        match self {
            Value::Set(set) => Ok(set),
            _ => Err(CommandError::WrongType),
        }
    }

    pub fn as_sorted_set(&self) -> Result<&SkipList, CommandError> {
        match self {
            Value::SortedSet(zset) => Ok(zset),
            _ => Err(CommandError::WrongType),
        }
    }

    pub fn as_sorted_set_mut(&mut self) -> Result<&mut SkipList, CommandError> {
        match self {
            Value::SortedSet(zset) => Ok(zset),
            _ => Err(CommandError::WrongType),
        }
    }
}

impl From<Bytes> for Value {
    fn from(bytes: Bytes) -> Self {
        Value::String(bytes)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(Bytes::copy_from_slice(s.as_bytes()))
    }
}
