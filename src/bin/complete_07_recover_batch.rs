// Bulk construction with rollback and retry
//
// Builds a batch on the process-wide counter, rolling back and retrying
// whenever an element fails to construct.
//
// Usage: complete_07_recover_batch [config.toml]

use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;
use vol2_patterns::batch::{retry_batch, BatchFactory, SequenceCounter};
use vol2_patterns::config::DemoConfig;
use vol2_patterns::telemetry;

fn main() -> Result<()> {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = DemoConfig::load_or_default(config_path.as_deref())
        .context("loading configuration")?;
    telemetry::init(config.logging.level()?);

    let settings = &config.batch;
    let factory = BatchFactory::new(SequenceCounter::global()).with_policy(settings.policy());

    println!("{}", "=== Recovering from construction failure ===".bold());
    println!(
        "count: {}, trigger: {:?}, reset on rollback: {}, attempts: {}",
        settings.count,
        factory.policy().failure_trigger,
        settings.reset_on_rollback,
        settings
            .attempt_limit()
            .map_or_else(|| "unbounded".to_string(), |n| n.to_string()),
    );

    let report = retry_batch(
        &factory,
        settings.count,
        settings.base_name.as_deref(),
        settings.attempt_limit(),
    )
    .context("constructing batch")?;

    if let Some(index) = report.last_failed_index {
        println!(
            "{}",
            format!("caught {} failure(s), last at index {index}", report.failures).yellow()
        );
    }

    match &report.batch {
        Some(batch) => println!(
            "{}",
            format!(
                "✓ Constructed {} element(s) after {} attempt(s): {:?}",
                batch.len(),
                report.attempts,
                batch.sequences()
            )
            .green()
        ),
        None => println!(
            "{}",
            format!("✗ Gave up after {} attempt(s)", report.attempts).red()
        ),
    }
    println!("next sequence number: {}", factory.counter().peek());
    Ok(())
}
