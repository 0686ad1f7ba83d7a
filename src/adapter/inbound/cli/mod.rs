//! CLI module graph and dispatch.

pub mod change;
pub mod check;
pub mod command;
pub mod members;
pub mod migrate;
pub mod output;
pub mod reconcile;

use crate::error::Result;
use crate::infrastructure::bootstrap::App;
use crate::infrastructure::config::settings::Config;
use command::{Cli, Commands};

/// Run one parsed command against a loaded configuration.
pub async fn run(cli: &Cli, config: Config) -> Result<()> {
    match &cli.command {
        Commands::Migrate => migrate::execute(&config),
        Commands::Check => check::execute(&cli.config, &config),
        Commands::Reconcile(args) => {
            let app = App::build(config).await?;
            reconcile::execute(&app, args).await
        }
        Commands::Members(args) => {
            let app = App::build(config).await?;
            members::execute(&app, args).await
        }
        Commands::Enable(args) => {
            let app = App::build(config).await?;
            change::execute(&app, args, true).await
        }
        Commands::Disable(args) => {
            let app = App::build(config).await?;
            change::execute(&app, args, false).await
        }
    }
}
