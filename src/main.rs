use billing_backend::app::app::App;
use billing_backend::util::logger::Logger;
use dotenv::dotenv;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    let dotenv_result = dotenv();

    // the logger must outlive the server so file writers keep flushing
    let _logger = match Logger::new() {
        Ok(logger) => Some(logger),
        Err(e) => {
            Logger::console_only();
            warn!("File logging unavailable, logging to console only: {}", e);
            None
        }
    };

    info!("🚀 Starting Billing Backend Application");
    match dotenv_result {
        Ok(_) => info!("✅ Successfully loaded .env file"),
        Err(e) => warn!("⚠️ Failed to load .env file: {} (using system env vars)", e),
    }

    let app = match App::new().await {
        Ok(app) => app,
        Err(e) => {
            error!("Failed to start application: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = app.start().await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}
