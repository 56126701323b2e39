//! Process configuration: `ServerConfig` is built from `clap::Parser` fields
//! sourced from either a flag or an env var, after loading a local `.env`.
//! No wallet-signature auth or database URL survive here; this server's only
//! external dependency is the clock.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

const DEFAULT_BIND: &str = "127.0.0.1:4000";

#[derive(Debug, Parser)]
#[command(name = "wagerd")]
#[command(about = "Run the wagering server's table, duel, and ledger core", long_about = None)]
pub struct Args {
    /// Address to bind the HTTP surface to (host:port).
    #[arg(long, env = "WAGERD_BIND", default_value = DEFAULT_BIND)]
    pub bind: SocketAddr,

    /// Toggle structured (JSON) logs.
    #[arg(long, env = "WAGERD_LOG_JSON", default_value_t = false)]
    pub json: bool,

    /// How often the scheduler is polled for due deadlines, in milliseconds.
    #[arg(long, env = "WAGERD_TICK_MS", default_value_t = 250)]
    pub tick_millis: u64,
}

/// A `.env` alongside the crate root is optional, the process `.env` in the
/// current working directory is optional too, neither failure is fatal.
pub fn load_dotenv() {
    let manifest_env_path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(".env");
    dotenv::from_filename(manifest_env_path).ok();
    dotenv::dotenv().ok();
}

pub fn init_tracing(json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt::fmt().with_env_filter(filter).with_target(false);

    if json {
        builder.json().flatten_event(true).init();
    } else {
        builder.compact().init();
    }
}
