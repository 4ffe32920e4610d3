// Upper-case copy of a text file
//
// Usage: complete_02_stream_upper [config.toml]

use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;
use vol2_patterns::config::DemoConfig;
use vol2_patterns::{telemetry, upper_case_copy};

fn main() -> Result<()> {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = DemoConfig::load_or_default(config_path.as_deref())
        .context("loading configuration")?;
    telemetry::init(config.logging.level()?);

    let transform = &config.transform;
    let summary = upper_case_copy(&transform.input, &transform.output).with_context(|| {
        format!(
            "copying {} to {}",
            transform.input.display(),
            transform.output.display()
        )
    })?;

    println!(
        "{}",
        format!(
            "✓ Wrote {} ({} bytes, {} changed)",
            transform.output.display(),
            summary.bytes,
            summary.changed
        )
        .green()
    );
    Ok(())
}
