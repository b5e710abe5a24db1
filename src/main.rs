//! signatory: an HTTP signing service for a single hot-wallet key.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────────────┐
//!                     │                      SIGNATORY                       │
//!                     │                                                      │
//!   Operator TTY ─────┼─▶ secret (prompt) ─▶ keystore (unlock) ─┐            │
//!                     │                                          ▼            │
//!   Client Request    │  ┌────────┐    ┌────────────┐    ┌──────────┐        │
//!   ──────────────────┼─▶│  http  │───▶│ authorizer │───▶│  policy  │        │
//!                     │  │ server │    │  pipeline  │    └──────────┘        │
//!                     │  └────────┘    └─────┬──────┘                        │
//!                     │       ▲              │ nonce         ┌────────────┐  │
//!   Client Response   │       │              ├──────────────▶│ blockchain │──┼──▶ Explorer
//!   ◀─────────────────┼───────┘              │ sign          │  explorer  │  │
//!                     │                      └──────────────▶│ transaction│  │
//!                     │                                      └────────────┘  │
//!                     │  ┌────────────────────────────────────────────────┐  │
//!                     │  │ config · lifecycle · observability             │  │
//!                     │  └────────────────────────────────────────────────┘  │
//!                     └──────────────────────────────────────────────────────┘
//! ```
//!
//! The listener is bound only after the key has been unlocked; no request is
//! ever served by a locked signer.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;

use signatory::config::load_config;
use signatory::http::HttpServer;
use signatory::keystore::Web3KeystoreDecryptor;
use signatory::lifecycle::{build_authorizer, prepare, unlock_key, Shutdown};
use signatory::observability::{logging, metrics};
use signatory::secret::{PassphrasePrompt, TerminalChannel};

#[derive(Parser, Debug)]
#[command(name = "signatory")]
#[command(about = "Signs value transfers from a single hot-wallet key", long_about = None)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config/settings.toml")]
    config: PathBuf,

    /// Override listener.bind_address
    #[arg(short, long)]
    bind: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = load_config(&args.config)?;
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind.to_string();
    }

    logging::init_logging(&config.observability.log_level);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "signatory starting");

    let prepared = prepare(config)?;
    let config = prepared.config;

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    // The prompt blocks on the terminal; keep it off the runtime workers.
    let source = prepared.policy.source();
    let key_file = prepared.key_file;
    let settings = config.unlock.settings();
    let store = tokio::task::spawn_blocking(move || {
        let mut prompt = PassphrasePrompt::new(TerminalChannel);
        unlock_key(&key_file, source, &mut prompt, &Web3KeystoreDecryptor, &settings)
    })
    .await??;

    let authorizer = build_authorizer(store, prepared.policy, &config.nonce)?;
    let server = HttpServer::new(authorizer.into(), &config.security);

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let _signals = shutdown.trigger_on_signal();
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
