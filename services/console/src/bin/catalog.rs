//! services/console/src/bin/catalog.rs

use console_lib::{config::Config, error::ConsoleError, logging, shell::Console};
use tokio::io::{self, AsyncWriteExt, BufReader};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), ConsoleError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    logging::init(config.log_level)?;
    info!(api_url = %config.api_url, page_size = config.page_size, "Configuration loaded");

    // --- 2. Wire the Catalog Stack ---
    let mut console = Console::from_config(&config)?;
    let mut stdout = io::stdout();

    // --- 3. Optional Auto-login ---
    if let Some((email, password)) = &config.login {
        let greeting = console.login(email, password).await;
        stdout.write_all(greeting.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
    } else {
        stdout
            .write_all(b"Not logged in. Use 'login <email> <password>' or 'help'.\n")
            .await?;
    }

    // --- 4. Run the Console ---
    console.run(BufReader::new(io::stdin()), stdout).await
}
