//! Terminal rendering for command results.
//!
//! Each invocation picks one [`Mode`] from the global flags. In JSON mode a
//! command prints exactly one document on stdout and nothing else; errors
//! go to stderr as `{"error": ...}`.

use std::fmt::Display;
use std::sync::OnceLock;

use owo_colors::OwoColorize;
use parking_lot::RwLock;
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::error::Result;

/// How command results are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Human,
    /// Warnings and errors only.
    Quiet,
    Json,
}

impl Mode {
    /// `--json` wins over `--quiet`.
    #[must_use]
    pub const fn from_flags(json: bool, quiet: bool) -> Self {
        if json {
            Self::Json
        } else if quiet {
            Self::Quiet
        } else {
            Self::Human
        }
    }
}

static MODE: OnceLock<RwLock<Mode>> = OnceLock::new();

fn cell() -> &'static RwLock<Mode> {
    MODE.get_or_init(|| RwLock::new(Mode::default()))
}

pub fn set_mode(mode: Mode) {
    *cell().write() = mode;
}

#[must_use]
pub fn mode() -> Mode {
    *cell().read()
}

#[must_use]
pub fn is_json() -> bool {
    mode() == Mode::Json
}

fn verbose() -> bool {
    mode() == Mode::Human
}

pub fn section(title: &str) {
    if verbose() {
        println!();
        println!("{}", title.bold());
    }
}

pub fn field(label: &str, value: impl Display) {
    if verbose() {
        println!("  {:<12} {}", label.dimmed(), value);
    }
}

pub fn success(message: &str) {
    if verbose() {
        println!("  {} {}", "✓".green(), message);
    }
}

/// Shown in quiet mode too.
pub fn warning(message: &str) {
    if !is_json() {
        println!("  {} {}", "!".yellow(), message);
    }
}

pub fn error(message: &str) {
    if is_json() {
        eprintln!("{}", serde_json::json!({ "error": message }));
    } else {
        eprintln!("  {} {}", "×".red(), message);
    }
}

/// Success or warning line depending on `failure`.
pub fn outcome(message: &str, failure: Option<&str>) {
    match failure {
        None => success(message),
        Some(reason) => warning(&format!("{message}: {reason}")),
    }
}

/// Render rows as an indented table, or a placeholder line when empty.
pub fn table<T: Tabled>(rows: Vec<T>, empty: &str) {
    if !verbose() {
        return;
    }
    if rows.is_empty() {
        warning(empty);
        return;
    }
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    for line in table.to_string().lines() {
        println!("  {line}");
    }
}

/// Print the command's single JSON document.
pub fn document(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}
