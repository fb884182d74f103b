//! Croupier CLI
//!
//! Talks to a casino registry over HTTP. Signing keys never leave the machine.

use clap::Parser;

use croupier_cli::commands::{self, Command};
use croupier_core::tracing_init::init_tracing;

#[derive(Parser, Debug)]
#[command(name = "croupier")]
#[command(version, about = "Casino registry client", long_about = None)]
struct Cli {
    /// Registry base URL
    #[arg(
        long,
        global = true,
        env = "CROUPIER_SERVER",
        default_value = "http://127.0.0.1:8080"
    )]
    server: String,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing("croupier_cli=info", cli.log_json);
    commands::run(cli.command, &cli.server).await
}
