use tokio::time::Duration;

use crate::client::Client;
use crate::frame::Frame;
use crate::server::Redis;
use crate::store::Keyspace;
use crate::Error;

/// A command that runs against the keyspace of the client's selected database, under that
/// database's lock.
pub trait Executable {
    fn exec(self, db: &mut Keyspace) -> Result<Frame, Error>;
}

/// A command that waits for data when none of its keys has any.
pub trait BlockingExecutable {
    /// Serves the command if possible. `Ok(None)` means it has to keep waiting.
    fn try_exec(&self, db: &mut Keyspace) -> Result<Option<Frame>, Error>;

    /// How long to wait for data. `None` waits forever.
    fn timeout(&self) -> Option<Duration>;
}

/// A command that acts on the server or on the connection instead of a single keyspace.
pub trait ServerExecutable {
    fn exec(self, redis: &Redis, client: &mut Client) -> Result<Frame, Error>;
}
