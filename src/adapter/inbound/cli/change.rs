//! Handlers for the `enable` and `disable` commands.

use serde_json::json;

use crate::adapter::inbound::cli::command::ChangeArgs;
use crate::adapter::inbound::cli::output;
use crate::domain::MembershipChange;
use crate::error::Result;
use crate::infrastructure::auth::Credentials;
use crate::infrastructure::bootstrap::App;

pub async fn execute(app: &App, args: &ChangeArgs, enabled: bool) -> Result<()> {
    app.auth
        .authorize(&Credentials::new(args.user.as_deref(), args.key.as_deref()))?;

    let change = if enabled {
        MembershipChange {
            enabled: args.nodes.clone(),
            disabled: Vec::new(),
        }
    } else {
        MembershipChange {
            enabled: Vec::new(),
            disabled: args.nodes.clone(),
        }
    };

    let outcomes = app.inventory().apply_change(&args.device, &change).await?;

    if output::is_json() {
        return output::document(&json!({
            "command": if enabled { "enable" } else { "disable" },
            "device": args.device,
            "nodes": outcomes,
        }));
    }

    let verb = if enabled { "Enabled" } else { "Disabled" };
    for outcome in &outcomes {
        output::outcome(
            &format!("{verb} {}", outcome.node),
            outcome.error.as_deref(),
        );
    }
    Ok(())
}
