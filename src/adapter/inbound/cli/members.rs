//! Handler for the `members` command.

use serde::{Deserialize, Serialize};
use serde_json::json;
use tabled::Tabled;

use crate::adapter::inbound::cli::command::MembersArgs;
use crate::adapter::inbound::cli::output;
use crate::application::topology::Inventory;
use crate::domain::PoolName;
use crate::error::Result;
use crate::infrastructure::bootstrap::App;

#[derive(Debug, Clone, Serialize, Deserialize, Tabled)]
struct MemberRow {
    #[tabled(rename = "Pool")]
    pool: String,
    #[tabled(rename = "Node")]
    node: String,
    #[tabled(rename = "Port")]
    port: u16,
    #[tabled(rename = "Enabled")]
    enabled: bool,
}

pub async fn execute(app: &App, args: &MembersArgs) -> Result<()> {
    if !args.force {
        app.readiness.ensure_warm().await?;
    }

    let inventory = app.inventory().clone();
    let device = args.device.clone();
    let pool = args.pool.clone();
    let rows: Vec<MemberRow> = app
        .memo
        .get_or_compute("members", &(&args.device, &args.pool), || async move {
            list(&inventory, &device, pool.as_deref())
        })
        .await?;

    if output::is_json() {
        return output::document(&json!({
            "command": "members",
            "device": args.device,
            "members": rows,
        }));
    }

    output::section(&format!("Pool members on {}", args.device));
    output::table(rows, "No pool members recorded");
    Ok(())
}

fn list(inventory: &Inventory, device: &str, pool: Option<&str>) -> Result<Vec<MemberRow>> {
    let pools = match pool {
        Some(name) => vec![PoolName::parse(name)?],
        None => inventory
            .device(device)
            .pools()?
            .into_iter()
            .map(|pool| pool.name().clone())
            .collect(),
    };

    let mut rows = Vec::new();
    for pool in pools {
        for member in inventory.device(device).with_pool(pool.clone()).poolmembers()? {
            rows.push(MemberRow {
                pool: pool.to_string(),
                node: member.name().to_string(),
                port: member.port()?,
                enabled: member.enabled()?,
            });
        }
    }
    Ok(rows)
}
