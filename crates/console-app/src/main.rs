use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use simulator_client::SimulatorClient;
use tokio::io::{AsyncBufReadExt, BufReader};
use trade_core::TradingApi;

mod app;
mod command;
mod config;
mod draft;
mod render;
mod router;
mod session;

use app::App;
use command::Command;
use config::AppConfig;
use render::{ConsoleRenderer, Renderer};
use session::SessionStore;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Logs go to stderr so they never interleave with rendered views.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = AppConfig::from_env()?;
    tracing::info!("Trading Simulator backend: {}", config.api_url);
    tracing::info!("Session token file: {}", config.token_path.display());

    let api: Arc<dyn TradingApi> = Arc::new(SimulatorClient::new(&config.api_url)?);
    let renderer: Arc<dyn Renderer> = Arc::new(ConsoleRenderer::new());
    let session = SessionStore::load(config.token_path);

    let mut app = App::new(session, api, renderer);

    println!("Trading Simulator - type 'help' for commands, 'quit' to exit.");
    app.start().await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt()?;
        let Some(line) = lines.next_line().await? else {
            break; // stdin closed
        };
        if line.trim().is_empty() {
            continue;
        }

        match command::parse(&line) {
            Ok(Command::Quit) => break,
            Ok(Command::Help) => print_help(),
            Ok(command) => app.handle(command).await,
            Err(message) => println!("{message}"),
        }
    }

    println!("Goodbye.");
    Ok(())
}

fn prompt() -> Result<()> {
    print!("> ");
    std::io::stdout().flush()?;
    Ok(())
}

fn print_help() {
    println!("Commands:");
    println!("  login <username> <password>      sign in");
    println!("  register <username> <password>   create an account");
    println!("  dashboard | stocks | portfolio | history");
    println!("                                   switch views");
    println!("  trade <symbol> [buy|sell]        open an order (buy by default)");
    println!("  side buy|sell                    change the open order's side");
    println!("  qty <shares>                     set the open order's quantity");
    println!("  submit                           execute the open order");
    println!("  cancel                           discard the open order");
    println!("  refresh                          reload the active view");
    println!("  logout                           sign out");
    println!("  quit                             exit");
}
