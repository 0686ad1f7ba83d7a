//! Handler for the `reconcile` command.

use tabled::Tabled;

use crate::adapter::inbound::cli::command::ReconcileArgs;
use crate::adapter::inbound::cli::output;
use crate::application::reconcile::{Kind, PassReport};
use crate::domain::Snapshot;
use crate::error::Result;
use crate::infrastructure::bootstrap::App;

#[derive(Tabled)]
struct KindRow {
    #[tabled(rename = "Kind")]
    kind: &'static str,
    #[tabled(rename = "Added")]
    added: usize,
    #[tabled(rename = "Removed")]
    removed: usize,
    #[tabled(rename = "Updated")]
    updated: usize,
    #[tabled(rename = "Errors")]
    errors: usize,
}

pub async fn execute(app: &App, args: &ReconcileArgs) -> Result<()> {
    let content = std::fs::read_to_string(&args.snapshot)?;
    let snapshot = Snapshot::from_json(&content)?;

    let report = app.reconciler.reconcile(&args.device, &snapshot).await;
    print_report(&report)
}

fn print_report(report: &PassReport) -> Result<()> {
    if output::is_json() {
        return output::document(report);
    }

    output::section(&format!("Reconciled {}", report.device));
    let rows: Vec<KindRow> = Kind::ALL
        .iter()
        .map(|kind| {
            let entry = report.kind(*kind);
            KindRow {
                kind: kind.as_str(),
                added: entry.added,
                removed: entry.removed,
                updated: entry.updated,
                errors: entry.errors.len(),
            }
        })
        .collect();
    output::table(rows, "No kinds reported");

    for kind in Kind::ALL {
        for error in &report.kind(kind).errors {
            output::warning(&format!("{kind}: {error}"));
        }
    }

    if report.warm {
        output::success("Cache index is warm");
    }
    Ok(())
}
