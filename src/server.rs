use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc::UnboundedSender, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Duration, Instant};
use tracing::{debug, error, info, instrument};

use crate::client::Client;
use crate::codec::FrameCodec;
use crate::commands::executable::{BlockingExecutable, Executable, ServerExecutable};
use crate::commands::{BlockingCommand, Command, CommandError};
use crate::config::{Config, ConfigTable};
use crate::connection::Connection;
use crate::db::{Blocked, Databases, Db};
use crate::frame::Frame;
use crate::Error;

/// The state shared by every connection of a server: the databases, the `CONFIG` table and the
/// id counters.
pub struct Redis {
    databases: Databases,
    config: Mutex<ConfigTable>,
    next_client_id: AtomicU64,
    next_blocked_id: AtomicU64,
    connected_clients: AtomicUsize,
    started_at: Instant,
}

/// What happened to a request once dispatched.
pub enum Outcome {
    /// The reply was sent.
    Done,
    /// A blocking command is waiting for data. The connection must not run further requests
    /// until it resolves.
    Blocked(Pending),
}

/// A blocked command, seen from the connection that issued it.
pub struct Pending {
    db: Arc<Db>,
    id: u64,
    done: oneshot::Receiver<()>,
    timer: Option<JoinHandle<()>>,
}

impl Pending {
    /// Resolves once the command got its reply.
    pub async fn wait(&mut self) {
        let _ = (&mut self.done).await;
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }

    /// Withdraws the command, its client went away.
    pub fn cancel(mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        self.db.unblock(self.id);
    }
}

impl Redis {
    pub fn new(config: &Config) -> Redis {
        Redis {
            databases: Databases::new(config.databases),
            config: Mutex::new(ConfigTable::new(config)),
            next_client_id: AtomicU64::new(1),
            next_blocked_id: AtomicU64::new(1),
            connected_clients: AtomicUsize::new(0),
            started_at: Instant::now(),
        }
    }

    pub fn databases(&self) -> &Databases {
        &self.databases
    }

    pub fn new_client(&self, replies: UnboundedSender<Frame>) -> Client {
        let id = self.next_client_id.fetch_add(1, Ordering::Relaxed);
        Client::new(id, replies)
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    pub fn connected_clients(&self) -> usize {
        self.connected_clients.load(Ordering::Relaxed)
    }

    pub fn blocked_clients(&self) -> usize {
        self.databases
            .created()
            .map(|db| db.lock().blocked_len())
            .sum()
    }

    pub fn get_config_value(&self, key: &str) -> Option<String> {
        self.config_table().get(key).map(str::to_string)
    }

    pub fn set_config_value(&self, key: &str, value: String) {
        self.config_table().set(key, value);
    }

    pub fn config_matching(&self, pattern: &str) -> Vec<(String, String)> {
        self.config_table().matching(pattern)
    }

    fn config_table(&self) -> std::sync::MutexGuard<'_, ConfigTable> {
        self.config.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Parses and runs one request. Every reply, including errors, goes through the client.
    pub fn dispatch(&self, client: &mut Client, frame: Frame) -> Outcome {
        // Empty requests are ignored, like an empty line in telnet.
        if matches!(&frame, Frame::Array(parts) if parts.is_empty()) {
            return Outcome::Done;
        }

        match Command::try_from(frame) {
            Ok(command) => command.dispatch(self, client),
            Err(err) => {
                client.reply(Frame::Error(err.to_string()));
                Outcome::Done
            }
        }
    }

    fn selected_db(&self, client: &Client) -> Option<Arc<Db>> {
        let db = self.databases.get(client.db());
        if db.is_none() {
            client.reply(Frame::Error(CommandError::DbIndexOutOfRange.to_string()));
        }
        db
    }

    pub(crate) fn exec<C: Executable>(&self, client: &mut Client, cmd: C, write: bool) -> Outcome {
        let Some(db) = self.selected_db(client) else {
            return Outcome::Done;
        };
        let mut state = db.lock();

        let reply = cmd
            .exec(&mut state.keyspace)
            .unwrap_or_else(|err| Frame::Error(err.to_string()));
        client.reply(reply);

        if write {
            state.retry_blocked();
        }
        Outcome::Done
    }

    pub(crate) fn exec_server<C: ServerExecutable>(&self, client: &mut Client, cmd: C) -> Outcome {
        let reply = cmd
            .exec(self, client)
            .unwrap_or_else(|err| Frame::Error(err.to_string()));
        client.reply(reply);
        Outcome::Done
    }

    /// Runs a blocking command, parking it on the client's database when it has to wait.
    pub(crate) fn block(&self, client: &mut Client, cmd: BlockingCommand) -> Outcome {
        let Some(db) = self.selected_db(client) else {
            return Outcome::Done;
        };
        let mut state = db.lock();

        match cmd.try_exec(&mut state.keyspace) {
            Ok(Some(reply)) => {
                client.reply(reply);
                state.retry_blocked();
                return Outcome::Done;
            }
            Err(err) => {
                client.reply(Frame::Error(err.to_string()));
                return Outcome::Done;
            }
            Ok(None) => {}
        }

        let id = self.next_blocked_id.fetch_add(1, Ordering::Relaxed);
        // A timeout too far away to represent waits forever.
        let deadline = cmd
            .timeout()
            .and_then(|timeout| Instant::now().checked_add(timeout));
        let (done, rx) = oneshot::channel();

        state.block(Blocked {
            id,
            client: client.handle(),
            command: cmd,
            deadline,
            done,
        });
        drop(state);
        debug!(db = db.index(), id, client = client.id(), "command blocked");

        let timer = deadline.map(|deadline| {
            let db = Arc::clone(&db);
            tokio::spawn(async move {
                time::sleep_until(deadline).await;
                db.expire_blocked(id);
            })
        });

        Outcome::Blocked(Pending {
            db,
            id,
            done: rx,
            timer,
        })
    }

    pub fn flush_all(&self) {
        for db in self.databases.created() {
            db.lock().keyspace.clear();
        }
    }

    /// Reclaims expired keys nobody accessed since they expired.
    pub fn sweep_expired(&self) {
        for db in self.databases.created() {
            let removed = db.lock().keyspace.sweep_expired();
            if removed > 0 {
                debug!(db = db.index(), removed, "expired keys swept");
            }
        }
    }
}

/// Stops a running [`Server`].
#[derive(Clone)]
pub struct ShutdownHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        let _ = self.tx.send(true);
    }
}

pub struct Server {
    listener: TcpListener,
    redis: Arc<Redis>,
    config: Config,
    shutdown: Arc<watch::Sender<bool>>,
}

impl Server {
    pub async fn bind(config: Config) -> Result<Server, Error> {
        let listener = TcpListener::bind((config.bind.as_str(), config.port)).await?;
        let (shutdown, _) = watch::channel(false);

        Ok(Server {
            listener,
            redis: Arc::new(Redis::new(&config)),
            config,
            shutdown: Arc::new(shutdown),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, Error> {
        Ok(self.listener.local_addr()?)
    }

    pub fn redis(&self) -> Arc<Redis> {
        Arc::clone(&self.redis)
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            tx: Arc::clone(&self.shutdown),
        }
    }

    /// Accepts connections until shut down.
    pub async fn run(self) -> Result<(), Error> {
        info!("Redis server listening on {}", self.listener.local_addr()?);

        let sweeper = tokio::spawn(sweep(
            Arc::clone(&self.redis),
            self.config.sweep_interval,
            self.shutdown.subscribe(),
        ));

        let mut shutdown = self.shutdown.subscribe();
        let result = loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    let (socket, client_address) = match accepted {
                        Ok(accepted) => accepted,
                        Err(e) => break Err(e.into()),
                    };
                    info!("Accepted connection from {:?}", client_address);

                    let redis = Arc::clone(&self.redis);
                    let max_frame_size = self.config.max_frame_size;
                    tokio::spawn(async move {
                        if let Err(e) =
                            handle_connection(socket, client_address, redis, max_frame_size).await
                        {
                            error!(error = %e, "connection failed");
                        }
                    });
                }
                _ = shutdown.changed() => break Ok(()),
            }
        };

        sweeper.abort();
        info!("Redis server stopped");
        result
    }
}

/// Binds a server with `config` and runs it.
pub async fn run(config: Config) -> Result<(), Error> {
    Server::bind(config).await?.run().await
}

async fn sweep(redis: Arc<Redis>, period: Duration, mut shutdown: watch::Receiver<bool>) {
    let mut interval = time::interval(period);
    interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = interval.tick() => redis.sweep_expired(),
            _ = shutdown.changed() => return,
        }
    }
}

#[instrument(
    name = "connection",
    skip(stream, redis, max_frame_size),
    fields(connection_id, client_address)
)]
async fn handle_connection(
    stream: TcpStream,
    client_address: SocketAddr,
    redis: Arc<Redis>,
    max_frame_size: usize,
) -> Result<(), Error> {
    let mut conn = Connection::with_codec(stream, FrameCodec::new(max_frame_size));

    tracing::Span::current()
        .record("connection_id", conn.id.to_string())
        .record("client_address", client_address.to_string());

    let mut client = redis.new_client(conn.replies());
    redis.connected_clients.fetch_add(1, Ordering::Relaxed);
    let result = serve(&mut conn, &redis, &mut client).await;
    redis.connected_clients.fetch_sub(1, Ordering::Relaxed);

    if let Err(e) = &result {
        // The peer gets the reason before the connection goes away.
        let _ = conn.write_frame(Frame::Error(format!("ERR Protocol error: {}", e)));
    }
    info!("Connection closed");
    result
}

async fn serve(conn: &mut Connection, redis: &Redis, client: &mut Client) -> Result<(), Error> {
    // Requests that arrived while a blocking command was waiting.
    let mut queued: VecDeque<Frame> = VecDeque::new();

    loop {
        let frame = match queued.pop_front() {
            Some(frame) => frame,
            None => match conn.read_frame().await? {
                Some(frame) => frame,
                None => return Ok(()),
            },
        };
        debug!("Received frame from client: {:?}", frame);

        let Outcome::Blocked(mut pending) = redis.dispatch(client, frame) else {
            continue;
        };

        // Keep reading to notice a disconnect, holding requests back until the reply is out.
        loop {
            tokio::select! {
                _ = pending.wait() => break,
                read = conn.read_frame() => match read {
                    Ok(Some(frame)) => queued.push_back(frame),
                    Ok(None) => {
                        pending.cancel();
                        return Ok(());
                    }
                    Err(e) => {
                        pending.cancel();
                        return Err(e);
                    }
                },
            }
        }
    }
}
