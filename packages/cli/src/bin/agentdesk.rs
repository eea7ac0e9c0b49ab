use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "agentdesk")]
#[command(about = "Agentdesk - multi-agent document Q&A server")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve => agentdesk_cli::run_server().await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
