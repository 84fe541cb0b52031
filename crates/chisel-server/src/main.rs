//! chisel-server main binary

use chisel_foundation::{logging, AppConfig};
use chisel_server::{create_dispatcher, ServerLifecycle};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "chisel-server")]
#[command(about = "Chisel refactoring server")]
struct Cli {
    /// Override the configured port
    #[arg(long)]
    port: Option<u16>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the TCP server (default)
    Serve,
    /// Print the tool catalogue as JSON and exit
    Tools,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load()?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    logging::initialize(&config);

    match cli.command {
        Some(Commands::Tools) => {
            let catalogue = chisel_handlers::tool_definitions::get_all_tool_definitions();
            println!("{}", serde_json::to_string_pretty(&catalogue)?);
            return Ok(());
        }
        Some(Commands::Serve) | None => {}
    }

    tracing::info!("Starting chisel server");

    let dispatcher = create_dispatcher(&config);
    let lifecycle = ServerLifecycle::new(dispatcher, config.server.clone());

    let addr = lifecycle.start().await?;
    tracing::info!(addr = %addr, "Listening");

    tokio::signal::ctrl_c().await?;
    tracing::info!("Interrupt received, shutting down");

    lifecycle.stop().await;
    tracing::info!("Server stopped");
    Ok(())
}
