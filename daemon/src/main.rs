//! Meridian daemon — entry point for running a Meridian node.

use clap::Parser;
use meridian_ledger::{AccountRoot, LedgerBuilder, LedgerMaster};
use meridian_rpc::{Context, RpcServer};
use meridian_types::AccountId;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "meridian-daemon", about = "Meridian ledger node daemon")]
struct Cli {
    /// RPC server port.
    #[arg(long, env = "MERIDIAN_RPC_PORT")]
    rpc_port: Option<u16>,

    /// Allow admin-only methods (standalone mode needs `ledger_accept`).
    #[arg(long, env = "MERIDIAN_ADMIN")]
    admin: bool,

    /// Run standalone: seed a dev genesis ledger instead of syncing.
    #[arg(long, env = "MERIDIAN_STANDALONE")]
    standalone: bool,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, default_value = "info", env = "MERIDIAN_LOG_LEVEL")]
    log_level: String,

    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct NodeConfig {
    rpc_port: u16,
    admin: bool,
    standalone: bool,
    log_level: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            rpc_port: 7077,
            admin: false,
            standalone: false,
            log_level: "info".to_owned(),
        }
    }
}

/// Initialize the tracing subscriber. `RUST_LOG` overrides the configured
/// level.
fn init_tracing(level: &str) {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_owned()));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Genesis state for standalone runs: one funded dev account, empty books.
fn seed_dev_ledger() -> LedgerMaster {
    let genesis = AccountId::new([0xDD; 20]);
    let snap = LedgerBuilder::new(1)
        .close_time(0)
        .account(AccountRoot {
            account: genesis,
            sequence: 1,
            balance: 100_000_000_000,
            owner_count: 0,
            flags: 0,
        })
        .build();
    tracing::info!(
        account = %genesis.to_address(),
        hash = %snap.hash().to_hex(),
        "seeded dev genesis ledger"
    );
    let master = LedgerMaster::new();
    master.publish_current(snap);
    master
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let file_config: NodeConfig = match &cli.config {
        Some(path) => {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str(&contents)?
        }
        None => NodeConfig::default(),
    };

    let config = NodeConfig {
        rpc_port: cli.rpc_port.unwrap_or(file_config.rpc_port),
        admin: cli.admin || file_config.admin,
        standalone: cli.standalone || file_config.standalone,
        log_level: cli.log_level,
    };

    init_tracing(&config.log_level);
    if cli.config.is_some() {
        tracing::info!("loaded config file");
    }

    let master = if config.standalone {
        seed_dev_ledger()
    } else {
        // without a sync pipeline the node starts empty and reports
        // notSynced until a ledger is published
        LedgerMaster::new()
    };

    let ctx = Arc::new(Context::new(Arc::new(master)).with_admin(config.admin));
    tracing::info!(
        port = config.rpc_port,
        admin = config.admin,
        standalone = config.standalone,
        "starting Meridian RPC server"
    );
    RpcServer::new(config.rpc_port).start(ctx).await?;
    Ok(())
}
