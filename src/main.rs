//! Toolbox Server Entry Point
//!
//! Loads configuration, discovers tools, prepares the staging area, composes
//! their routes and serves them over HTTP until Ctrl-C.

use anyhow::Result;
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, fmt};

use toolbox_server::core::{Config, HttpTransport, ToolboxServer};
use toolbox_server::domains::capabilities::CapabilityTable;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration from environment
    let config = Config::from_env();

    // Initialize logging
    init_logging(&config.logging.level);

    // Discover tools and sweep the staging area; only an unreadable source
    // root or staging directory is fatal
    let server = ToolboxServer::bootstrap(config, CapabilityTable::builtin())?;

    info!("Starting {} v{}", server.name(), server.version());

    // Create and run the HTTP transport
    let transport = HttpTransport::new(server.config().transport.clone());
    transport.run(server).await?;

    info!("Server shutting down");

    Ok(())
}

/// Initialize the logging subsystem.
///
/// Configures tracing with the specified log level and format.
fn init_logging(level: &str) {
    let level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .init();
}
