use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::debug;

use crate::client::ClientHandle;
use crate::commands::executable::BlockingExecutable;
use crate::commands::BlockingCommand;
use crate::frame::Frame;
use crate::store::Keyspace;

/// A logical database: a keyspace plus the commands blocked on it, behind one lock.
#[derive(Debug)]
pub struct Db {
    index: usize,
    state: Mutex<DbState>,
}

#[derive(Default)]
pub struct DbState {
    pub keyspace: Keyspace,
    blocked: Vec<Blocked>,
}

/// A blocking command waiting for data.
pub(crate) struct Blocked {
    pub id: u64,
    pub client: ClientHandle,
    pub command: BlockingCommand,
    pub deadline: Option<Instant>,
    /// Fires once the client got its reply, be it data or a timeout.
    pub done: oneshot::Sender<()>,
}

impl Db {
    pub fn new(index: usize) -> Db {
        Db {
            index,
            state: Mutex::new(DbState::default()),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn lock(&self) -> MutexGuard<'_, DbState> {
        // Handlers never leave the state half updated on panic, so a poisoned lock is still
        // usable.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Answers a blocked command with the "no data" reply once its deadline passes. Does nothing
    /// if it was already served.
    pub(crate) fn expire_blocked(&self, id: u64) {
        let mut state = self.lock();
        if let Some(blocked) = state.take_blocked(id) {
            debug!(db = self.index, id, "blocked command timed out");
            blocked.client.reply(Frame::NullArray);
            // The waiter may be gone already.
            blocked.done.send(()).ok();
        }
    }

    /// Drops a blocked command whose client went away.
    pub(crate) fn unblock(&self, id: u64) {
        self.lock().take_blocked(id);
    }
}

impl DbState {
    pub(crate) fn block(&mut self, blocked: Blocked) {
        self.blocked.push(blocked);
    }

    pub fn blocked_len(&self) -> usize {
        self.blocked.len()
    }

    fn take_blocked(&mut self, id: u64) -> Option<Blocked> {
        let position = self.blocked.iter().position(|blocked| blocked.id == id)?;
        Some(self.blocked.remove(position))
    }

    /// Runs every blocked command again, in the order they blocked. The ones that can now be
    /// served reply and leave the list, the rest keep waiting with their original deadline.
    pub(crate) fn retry_blocked(&mut self) {
        let now = Instant::now();
        let mut index = 0;

        while index < self.blocked.len() {
            let blocked = &self.blocked[index];

            if blocked.client.is_closed() {
                self.blocked.remove(index);
                continue;
            }

            // About to be answered by its timer.
            if blocked.deadline.is_some_and(|deadline| deadline <= now) {
                index += 1;
                continue;
            }

            let reply = match blocked.command.try_exec(&mut self.keyspace) {
                Ok(None) => {
                    index += 1;
                    continue;
                }
                Ok(Some(reply)) => reply,
                Err(err) => Frame::Error(err.to_string()),
            };

            let blocked = self.blocked.remove(index);
            debug!(id = blocked.id, client = blocked.client.id(), "blocked command served");
            blocked.client.reply(reply);
            // The waiter may be gone already.
            blocked.done.send(()).ok();
        }
    }
}

impl std::fmt::Debug for DbState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbState")
            .field("keys", &self.keyspace.len())
            .field("blocked", &self.blocked.len())
            .finish()
    }
}

/// The fixed set of logical databases. Each one is allocated on first use.
pub struct Databases {
    dbs: Vec<OnceLock<Arc<Db>>>,
}

impl Databases {
    pub fn new(count: usize) -> Databases {
        Databases {
            dbs: (0..count).map(|_| OnceLock::new()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.dbs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dbs.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Arc<Db>> {
        self.dbs
            .get(index)
            .map(|cell| cell.get_or_init(|| Arc::new(Db::new(index))).clone())
    }

    /// The databases that have been used so far.
    pub fn created(&self) -> impl Iterator<Item = &Arc<Db>> {
        self.dbs.iter().filter_map(OnceLock::get)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn databases_are_created_lazily() {
        let databases = Databases::new(16);

        assert_eq!(databases.len(), 16);
        assert_eq!(databases.created().count(), 0);

        let db = databases.get(3).unwrap();
        assert_eq!(db.index(), 3);
        assert!(Arc::ptr_eq(&db, &databases.get(3).unwrap()));
        assert_eq!(databases.created().count(), 1);

        assert!(databases.get(16).is_none());
    }

    #[test]
    fn databases_are_independent() {
        let databases = Databases::new(2);
        let first = databases.get(0).unwrap();
        let second = databases.get(1).unwrap();

        first
            .lock()
            .keyspace
            .set("key".to_string(), "value".into(), None);

        assert!(first.lock().keyspace.exists("key"));
        assert!(!second.lock().keyspace.exists("key"));
    }
}
