use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::info;

use transcribe_relay::{AppState, RelayConfig, mic, routes};

/// Transcribe Relay - real-time PCM audio to streaming transcripts
#[derive(Parser, Debug)]
#[command(name = "transcribe-relay")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Relay the default microphone and print transcripts until Ctrl-C
    Mic,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists (must be done before config loading)
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = RelayConfig::from_env()?;

    if let Some(Commands::Mic) = cli.command {
        return mic::run(&config).await;
    }

    let address = config.address();
    let app_state = AppState::new(config);
    let app = routes::create_router(app_state);

    println!("Server listening on http://{}", address);
    let listener = TcpListener::bind(&address).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutdown signal received");
}
