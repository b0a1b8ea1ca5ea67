//! hg659 - JSON proxy for Huawei HG659 routers
//!
//! Logs into the router once at startup, then re-serves device info and the
//! host list as plain JSON.

use anyhow::{Context, Result};
use clap::Parser;
use hg659::config::Config;
use hg659::server::{self, AppState, Credentials};
use hg659::{DeviceApi, Hg659Client};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "hg659")]
#[command(about = "JSON proxy for the HG659 router management API", long_about = None)]
struct Args {
    /// Config file path
    #[arg(short, long)]
    config: Option<String>,

    /// Interface to bind
    #[arg(long)]
    bind: Option<String>,

    /// Port to run on
    #[arg(long)]
    port: Option<u16>,

    /// Hostname or IP of the HG659 device
    #[arg(long)]
    host: Option<String>,

    /// Username for login
    #[arg(long)]
    user: Option<String>,

    /// Password for login
    #[arg(long)]
    pass: Option<String>,

    /// Print device info and hosts as JSON, then exit
    #[arg(long)]
    once: bool,
}

impl Args {
    fn apply(self, cfg: &mut Config) {
        if let Some(bind) = self.bind {
            cfg.proxy.bind = bind;
        }
        if let Some(port) = self.port {
            cfg.proxy.port = port;
        }
        if let Some(host) = self.host {
            cfg.device.host = host;
        }
        if let Some(user) = self.user {
            cfg.device.username = user;
        }
        if let Some(pass) = self.pass {
            cfg.device.password = pass;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut cfg = Config::load(args.config.as_deref())?;
    let once = args.once;
    args.apply(&mut cfg);

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&cfg.logging.level)),
        )
        .init();

    cfg.validate()?;

    tracing::info!("Connecting to {}...", cfg.device.host);
    let client = Hg659Client::connect(
        &cfg.device.host,
        &cfg.device.username,
        &cfg.device.password,
        &cfg.http,
    )
    .await
    .with_context(|| format!("Failed to log into {}", cfg.device.host))?;

    if once {
        return run_once(&client).await;
    }

    let device: Arc<dyn DeviceApi> = Arc::new(client);

    if cfg.proxy.heartbeat_interval > 0 {
        server::spawn_session_keeper(
            device.clone(),
            Credentials {
                username: cfg.device.username.clone(),
                password: cfg.device.password.clone(),
            },
            Duration::from_secs(cfg.proxy.heartbeat_interval),
        );
    }

    server::run_server(&cfg.listen_addr(), AppState { device }).await
}

/// Dump a single snapshot to stdout
async fn run_once(client: &Hg659Client) -> Result<()> {
    let info = client.device_info().await.context("Failed to read device info")?;
    let hosts = client.hosts().await.context("Failed to read hosts")?;

    let snapshot = serde_json::json!({
        "device": info,
        "hosts": hosts,
    });
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}
