use anyhow::Result;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use vsphere_exporter::{
    config::{Config, ConfigOverrides},
    server,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/Default.toml")]
    config: String,

    /// vCenter URL (overrides config)
    #[arg(long, env = "VSPHERE_URL")]
    vsphere_url: Option<String>,

    /// vCenter user (overrides config)
    #[arg(long, env = "VSPHERE_USERNAME")]
    vsphere_username: Option<String>,

    /// vCenter password (overrides config)
    #[arg(long, env = "VSPHERE_PASSWORD", hide_env_values = true)]
    vsphere_password: Option<String>,

    /// Port to listen on for metrics
    #[arg(short, long, env = "EXPORTER_PORT")]
    port: Option<u16>,

    /// Address to bind to
    #[arg(short, long, env = "EXPORTER_ADDR")]
    addr: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting vSphere Prometheus Exporter v{}",
        env!("CARGO_PKG_VERSION")
    );

    // Parse CLI arguments
    let args = Args::parse();

    let overrides = ConfigOverrides {
        vsphere_url: args.vsphere_url,
        vsphere_username: args.vsphere_username,
        vsphere_password: args.vsphere_password,
        port: args.port,
        addr: args.addr,
    };
    let config = Config::load_with_overrides(&args.config, &overrides)?;

    info!("Configuration loaded successfully");
    info!("vCenter: {}", config.vsphere.url);
    info!(
        "Metrics endpoint: http://{}:{}/metrics",
        config.server.addr, config.server.port
    );

    // Start the metrics server
    if let Err(e) = server::start(config).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
