use clap::Parser;
use lbsync::adapter::inbound::cli::command::Cli;
use lbsync::adapter::inbound::cli::output::{self, Mode};
use lbsync::infrastructure::config::settings::Config;
use tracing::info;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    output::set_mode(Mode::from_flags(cli.json, cli.quiet));

    let config = match Config::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            output::error(&format!("Failed to load config: {e}"));
            std::process::exit(1);
        }
    };

    config.init_logging();
    info!(command = ?cli.command, "lbsync starting");

    if let Err(e) = lbsync::adapter::inbound::cli::run(&cli, config).await {
        output::error(&e.to_string());
        std::process::exit(1);
    }
}
