pub mod recon;
pub mod screenshots;
pub mod wayback;
pub mod whois;

use anyhow::Result;
use serde_json::Value;

/// Pretty JSON on stdout.
pub fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
