use clap::Parser;
use radish::codec::DEFAULT_MAX_FRAME_SIZE;
use radish::config::{Config, DEFAULT_DATABASES, DEFAULT_PORT};
use radish::{server, Error};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// The port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// The address to bind to
    #[arg(short, long, default_value = "127.0.0.1")]
    bind: String,

    /// Number of logical databases
    #[arg(long, default_value_t = DEFAULT_DATABASES)]
    databases: usize,

    /// Largest request frame accepted, in bytes
    #[arg(long, env = "MAX_FRAME_SIZE", default_value_t = DEFAULT_MAX_FRAME_SIZE)]
    max_frame_size: usize,

    /// Print logs to stdout, filtered with RUST_LOG
    #[arg(long)]
    log: bool,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let args = Args::parse();

    if args.log {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let config = Config {
        bind: args.bind,
        port: args.port,
        databases: args.databases,
        max_frame_size: args.max_frame_size,
        ..Default::default()
    };

    server::run(config).await
}
