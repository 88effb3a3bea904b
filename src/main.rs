use flyway_migrator::cli::run_cli;
use tracing::error;

#[tokio::main]
async fn main() {
    // Load .env file if it exists (optional - won't fail if missing)
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Warning: Error loading .env file: {}", e);
        }
    }

    if let Err(e) = run_cli().await {
        error!(error = %format!("{:#}", e), "Migration run failed");
        std::process::exit(1);
    }
}
