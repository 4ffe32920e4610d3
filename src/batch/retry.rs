use super::{BatchError, BatchFactory, ConstructionBatch};

#[derive(Debug, Default)]
pub struct RetryReport {
    pub attempts: usize,
    pub failures: usize,
    pub last_failed_index: Option<usize>,
    pub batch: Option<ConstructionBatch>,
}

impl RetryReport {
    pub fn succeeded(&self) -> bool {
        self.batch.is_some()
    }
}

/// Keeps constructing until a batch completes or `max_attempts` runs out.
///
/// Only `ConstructionFailed` is retried, immediately and without backoff.
/// With `max_attempts = None` and a batch that always hits the trigger this
/// never returns.
pub fn retry_batch(
    factory: &BatchFactory<'_>,
    count: usize,
    base_name: Option<&str>,
    max_attempts: Option<usize>,
) -> Result<RetryReport, BatchError> {
    let mut report = RetryReport::default();

    while max_attempts.map_or(true, |max| report.attempts < max) {
        report.attempts += 1;
        match factory.construct_batch(count, base_name) {
            Ok(batch) => {
                report.batch = Some(batch);
                break;
            }
            Err(BatchError::ConstructionFailed { index, .. }) => {
                tracing::info!(attempt = report.attempts, index, "caught construction failure");
                report.failures += 1;
                report.last_failed_index = Some(index);
            }
            Err(err) => return Err(err),
        }
    }

    Ok(report)
}
