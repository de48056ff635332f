//! CLI command handlers.

use anyhow::{Context, Result};
use serde::Serialize;

pub mod auth;
pub mod config;
pub mod history;
pub mod profile;
pub mod search;
pub mod stats;

/// Prints a view model as pretty JSON on stdout.
fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("serialize output")?;
    println!("{json}");
    Ok(())
}
