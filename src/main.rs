use std::process::ExitCode;
use std::sync::Arc;

use tracing::{error, info};

use drivebox::drive::create_drive;
use drivebox::web::WebServer;
use drivebox::{Config, Database};

#[tokio::main]
async fn main() -> ExitCode {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    // Load configuration
    let config = match Config::load_with_env(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {config_path}: {e}");
            eprintln!("Using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };

    // Initialize logging
    if let Err(e) = drivebox::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        drivebox::logging::init_console_only(&config.logging.level);
    }

    if let Err(e) = config.validate() {
        error!("{e}");
        return ExitCode::FAILURE;
    }

    info!("drivebox {}", env!("CARGO_PKG_VERSION"));

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let db = Arc::new(Database::open(&config.database.path).await?);
    let drive = create_drive(&config.drive).await?;
    info!(backend = drive.store.backend_name(), "Storage backend ready");

    let server = WebServer::new(&config, db, drive)?;
    info!("Server configured on {}", server.addr());
    server.run().await?;
    Ok(())
}
