use bytes::Bytes;
use num_traits::{CheckedAdd, Zero};
use std::collections::{BTreeSet, HashMap};
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::time::{Duration, Instant};

use crate::commands::CommandError;
use crate::value::Value;

type Key = String;

struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

/// Remaining lifetime of a key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Expiry {
    Never,
    In(Duration),
}

/// The keyspace of one logical database.
///
/// Every key maps to a value and an optional expiration. Keys with an expiration are also kept in
/// an index ordered by expiration time, so expired keys can be swept without scanning the whole
/// keyspace. An expired key is treated as absent by every accessor, whether or not the sweep
/// already removed it.
#[derive(Default)]
pub struct Keyspace {
    entries: HashMap<Key, Entry>,
    expirations: BTreeSet<(Instant, Key)>,
}

impl Keyspace {
    pub fn new() -> Keyspace {
        Keyspace::default()
    }

    pub fn get(&mut self, key: &str) -> Option<&Value> {
        self.expire_if_needed(key);
        self.entries.get(key).map(|entry| &entry.value)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.expire_if_needed(key);
        self.entries.get_mut(key).map(|entry| &mut entry.value)
    }

    /// Returns the value under `key`, inserting `default()` without expiration when absent.
    ///
    /// Callers that may leave a collection empty must call [`Keyspace::prune`] afterwards.
    pub fn get_or_insert_with(&mut self, key: &str, default: impl FnOnce() -> Value) -> &mut Value {
        self.expire_if_needed(key);
        &mut self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Entry {
                value: default(),
                expires_at: None,
            })
            .value
    }

    /// Replaces the value and expiration of `key`, returning the previous value. Storing an
    /// empty collection deletes the key instead.
    pub fn set(&mut self, key: Key, value: Value, expires_at: Option<Instant>) -> Option<Value> {
        self.expire_if_needed(&key);

        if value.is_empty_collection() {
            return self.remove(&key);
        }

        if let Some(expires_at) = expires_at {
            self.expirations.insert((expires_at, key.clone()));
        }

        let previous = self.entries.insert(key.clone(), Entry { value, expires_at })?;
        if let Some(when) = previous.expires_at {
            if Some(when) != expires_at {
                self.expirations.remove(&(when, key));
            }
        }

        Some(previous.value)
    }

    /// Like [`Keyspace::set`] but keeps the current expiration of `key`, if any.
    pub fn set_keep_ttl(&mut self, key: Key, value: Value) -> Option<Value> {
        self.expire_if_needed(&key);

        let expires_at = self.entries.get(&key).and_then(|entry| entry.expires_at);
        self.set(key, value, expires_at)
    }

    /// Removes every key in `keys`, returning how many existed.
    pub fn delete<K: AsRef<str>>(&mut self, keys: &[K]) -> usize {
        keys.iter()
            .filter(|key| {
                let key = key.as_ref();
                !self.expire_if_needed(key) && self.remove(key).is_some()
            })
            .count()
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let entry = self.entries.remove(key)?;
        if let Some(when) = entry.expires_at {
            self.expirations.remove(&(when, key.to_string()));
        }
        Some(entry.value)
    }

    pub fn exists(&mut self, key: &str) -> bool {
        self.expire_if_needed(key);
        self.entries.contains_key(key)
    }

    /// Sets the expiration of an existing key. An expiration in the past deletes the key. Returns
    /// false when the key does not exist.
    pub fn set_expiry(&mut self, key: &str, expires_at: Instant) -> bool {
        if !self.exists(key) {
            return false;
        }

        if expires_at <= Instant::now() {
            self.remove(key);
            return true;
        }

        if let Some(entry) = self.entries.get_mut(key) {
            if let Some(when) = entry.expires_at.replace(expires_at) {
                self.expirations.remove(&(when, key.to_string()));
            }
            self.expirations.insert((expires_at, key.to_string()));
        }

        true
    }

    /// Removes the expiration of `key`. Returns true if it had one.
    pub fn persist(&mut self, key: &str) -> bool {
        self.expire_if_needed(key);

        let Some(when) = self
            .entries
            .get_mut(key)
            .and_then(|entry| entry.expires_at.take())
        else {
            return false;
        };

        self.expirations.remove(&(when, key.to_string()));
        true
    }

    pub fn expiry(&mut self, key: &str) -> Option<Expiry> {
        self.expire_if_needed(key);

        let entry = self.entries.get(key)?;
        Some(match entry.expires_at {
            Some(when) => Expiry::In(when.saturating_duration_since(Instant::now())),
            None => Expiry::Never,
        })
    }

    pub fn expires_at(&mut self, key: &str) -> Option<Instant> {
        self.expire_if_needed(key);
        self.entries.get(key).and_then(|entry| entry.expires_at)
    }

    /// Deletes `key` if it holds a collection left empty by an in place mutation.
    pub fn prune(&mut self, key: &str) {
        let empty = self
            .entries
            .get(key)
            .is_some_and(|entry| entry.value.is_empty_collection());

        if empty {
            self.remove(key);
        }
    }

    /// Deletes every key whose expiration has passed, returning how many were removed.
    pub fn sweep_expired(&mut self) -> usize {
        let now = Instant::now();

        let expired: Vec<(Instant, Key)> = self
            .expirations
            .iter()
            .take_while(|(expires_at, _)| *expires_at <= now)
            .cloned()
            .collect();

        for (when, key) in &expired {
            self.entries.remove(key);
            self.expirations.remove(&(*when, key.clone()));
        }

        expired.len()
    }

    /// Earliest pending expiration, if any key has one.
    pub fn next_expiration(&self) -> Option<Instant> {
        self.expirations.iter().next().map(|(when, _)| *when)
    }

    /// Number of keys, including expired keys the sweep has not reclaimed yet.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of keys with an expiration.
    pub fn expires(&self) -> usize {
        self.expirations.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.expirations.clear();
    }

    /// Keys that have not expired.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        let now = Instant::now();
        self.entries
            .iter()
            .filter(move |(_, entry)| entry.expires_at.map_or(true, |when| when > now))
            .map(|(key, _)| key)
    }

    /// Adds `increment` to the integer stored at `key`, treating a missing key as zero. The
    /// expiration of the key is kept.
    pub fn incr_by<T>(&mut self, key: &str, increment: T) -> Result<T, CommandError>
    where
        T: FromStr + ToString + CheckedAdd + Zero,
    {
        let current = match self.get(key) {
            Some(value) => std::str::from_utf8(value.as_string()?)
                .ok()
                .and_then(|s| s.parse::<T>().ok())
                .ok_or(CommandError::NotAnInteger)?,
            None => T::zero(),
        };

        let value = current
            .checked_add(&increment)
            .ok_or(CommandError::Overflow)?;
        self.set_keep_ttl(key.to_string(), Value::String(Bytes::from(value.to_string())));

        Ok(value)
    }

    // Returns true if `key` was expired and has been removed.
    fn expire_if_needed(&mut self, key: &str) -> bool {
        let expired = self
            .entries
            .get(key)
            .and_then(|entry| entry.expires_at)
            .is_some_and(|when| when <= Instant::now());

        if expired {
            self.remove(key);
        }

        expired
    }
}

/// Converts a Unix timestamp in milliseconds into a deadline on the monotonic clock. Timestamps
/// in the past map to now.
pub fn instant_from_unix_millis(millis: u64) -> Instant {
    let now_millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_millis() as u64);

    Instant::now() + Duration::from_millis(millis.saturating_sub(now_millis))
}

#[cfg(test)]
mod tests {
    use std::collections::{HashSet, VecDeque};

    use super::*;
    use tokio::time;

    fn string(value: &str) -> Value {
        Value::from(value)
    }

    fn get_string(keyspace: &mut Keyspace, key: &str) -> Option<Bytes> {
        keyspace
            .get(key)
            .and_then(|value| value.as_string().ok().cloned())
    }

    #[tokio::test]
    async fn ttl() {
        time::pause();

        let mut keyspace = Keyspace::new();
        let now = Instant::now();

        keyspace.set(
            "key1".to_string(),
            string("value1"),
            Some(now + Duration::from_secs(10)),
        );
        keyspace.set(
            "key2".to_string(),
            string("value2"),
            Some(now + Duration::from_secs(20)),
        );

        assert_eq!(keyspace.keys().count(), 2);

        time::advance(Duration::from_secs(10)).await;

        assert_eq!(keyspace.keys().count(), 1);
        assert!(!keyspace.exists("key1"));
        assert!(keyspace.exists("key2"));
        assert_eq!(
            keyspace.expiry("key2"),
            Some(Expiry::In(Duration::from_secs(10)))
        );

        time::advance(Duration::from_secs(10)).await;

        assert_eq!(get_string(&mut keyspace, "key2"), None);
        assert!(keyspace.is_empty());
        assert_eq!(keyspace.expires(), 0);
    }

    #[tokio::test]
    async fn short_ttl_expires_lazily() {
        time::pause();

        let mut keyspace = Keyspace::new();
        keyspace.set(
            "x".to_string(),
            string("1"),
            Some(Instant::now() + Duration::from_millis(50)),
        );

        assert_eq!(get_string(&mut keyspace, "x"), Some(Bytes::from("1")));

        time::sleep(Duration::from_millis(100)).await;

        assert_eq!(get_string(&mut keyspace, "x"), None);
        assert!(!keyspace.exists("x"));
    }

    #[tokio::test]
    async fn sweep_removes_unread_keys() {
        time::pause();

        let mut keyspace = Keyspace::new();
        let now = Instant::now();
        keyspace.set("a".to_string(), string("1"), Some(now + Duration::from_secs(1)));
        keyspace.set("b".to_string(), string("2"), Some(now + Duration::from_secs(5)));
        keyspace.set("c".to_string(), string("3"), None);

        time::advance(Duration::from_secs(2)).await;

        assert_eq!(keyspace.len(), 3);
        assert_eq!(keyspace.sweep_expired(), 1);
        assert_eq!(keyspace.len(), 2);
        assert_eq!(keyspace.next_expiration(), Some(now + Duration::from_secs(5)));
    }

    #[tokio::test]
    async fn set_replaces_the_expiration() {
        time::pause();

        let mut keyspace = Keyspace::new();
        let now = Instant::now();
        keyspace.set("a".to_string(), string("1"), Some(now + Duration::from_secs(1)));

        let previous = keyspace.set("a".to_string(), string("2"), None);

        assert_eq!(
            previous.as_ref().and_then(|v| v.as_string().ok()),
            Some(&Bytes::from("1"))
        );
        assert_eq!(keyspace.expires(), 0);

        time::advance(Duration::from_secs(2)).await;
        assert_eq!(get_string(&mut keyspace, "a"), Some(Bytes::from("2")));
    }

    #[test]
    fn empty_collections_are_not_stored() {
        let mut keyspace = Keyspace::new();
        keyspace.set("list".to_string(), string("x"), None);

        keyspace.set("list".to_string(), Value::List(VecDeque::new()), None);
        keyspace.set("set".to_string(), Value::Set(HashSet::new()), None);

        assert!(!keyspace.exists("list"));
        assert!(!keyspace.exists("set"));
    }

    #[test]
    fn prune_deletes_emptied_collections() {
        let mut keyspace = Keyspace::new();
        keyspace.set(
            "list".to_string(),
            Value::List(VecDeque::from([Bytes::from("a")])),
            None,
        );

        if let Some(Value::List(list)) = keyspace.get_mut("list") {
            list.pop_front();
        }
        keyspace.prune("list");

        assert!(!keyspace.exists("list"));
    }

    #[test]
    fn delete_counts_existing_keys() {
        let mut keyspace = Keyspace::new();
        keyspace.set("a".to_string(), string("1"), None);
        keyspace.set("b".to_string(), string("2"), None);

        assert_eq!(keyspace.delete(&["a", "b", "c"]), 2);
        assert_eq!(keyspace.delete(&["a"]), 0);
    }

    #[tokio::test]
    async fn expiry_and_persist() {
        time::pause();

        let mut keyspace = Keyspace::new();
        keyspace.set("a".to_string(), string("1"), None);

        assert_eq!(keyspace.expiry("a"), Some(Expiry::Never));
        assert_eq!(keyspace.expiry("missing"), None);
        assert!(!keyspace.set_expiry("missing", Instant::now()));

        assert!(keyspace.set_expiry("a", Instant::now() + Duration::from_secs(3)));
        assert_eq!(keyspace.expires(), 1);
        assert!(keyspace.persist("a"));
        assert!(!keyspace.persist("a"));
        assert_eq!(keyspace.expires(), 0);

        assert!(keyspace.set_expiry("a", Instant::now()));
        assert!(!keyspace.exists("a"));
    }

    #[tokio::test]
    async fn incr_keeps_the_expiration() {
        time::pause();

        let mut keyspace = Keyspace::new();
        let deadline = Instant::now() + Duration::from_secs(10);
        keyspace.set("n".to_string(), string("41"), Some(deadline));

        assert_eq!(keyspace.incr_by("n", 1i64), Ok(42));
        assert_eq!(keyspace.expires_at("n"), Some(deadline));
        assert_eq!(keyspace.incr_by("fresh", -3i64), Ok(-3));

        keyspace.set("n".to_string(), string(&i64::MAX.to_string()), None);
        assert_eq!(keyspace.incr_by("n", 1i64), Err(CommandError::Overflow));

        keyspace.set("s".to_string(), string("abc"), None);
        assert_eq!(keyspace.incr_by("s", 1i64), Err(CommandError::NotAnInteger));

        keyspace.set("l".to_string(), Value::List(VecDeque::from([Bytes::from("a")])), None);
        assert_eq!(keyspace.incr_by("l", 1i64), Err(CommandError::WrongType));
    }
}
