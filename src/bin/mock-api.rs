use clap::Parser;
use tokio::net::TcpListener;

use devup::lifecycle::{signals, Shutdown};
use devup::{mock_api, observability};

#[derive(Parser)]
#[command(name = "mock-api")]
#[command(about = "Stand-in HTTP dependency with /health and /echo", long_about = None)]
struct Cli {
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    #[arg(short, long, env = "MOCK_API_PORT", default_value_t = 5000)]
    port: u16,

    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    observability::logging::init(cli.verbose);

    let listener = TcpListener::bind((cli.host.as_str(), cli.port)).await?;

    let shutdown = Shutdown::new();
    signals::spawn_ctrl_c_listener(shutdown.clone());
    mock_api::serve(listener, shutdown.subscribe()).await?;

    tracing::info!("Mock API stopped");
    Ok(())
}
