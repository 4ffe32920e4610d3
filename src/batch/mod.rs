// Guarded Bulk Allocation
//
// A batch reserves one block for `count` elements and constructs them in
// order. When an element fails to construct, everything already built is
// torn down newest-first, the block is released, and the caller gets a typed
// `ConstructionFailed` carrying the failing index.

pub mod counter;
pub mod label;
pub mod lifecycle;
pub mod retry;

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

pub use counter::SequenceCounter;
pub use label::{Label, DEFAULT_NAME, LABEL_CAPACITY};
pub use lifecycle::{Journal, LifecycleEvent, LifecycleSink, TracingSink};
pub use retry::{retry_batch, RetryReport};

/// Sequence number whose construction fails under the default policy.
pub const DEFAULT_FAILURE_TRIGGER: u64 = 11;

// ============================================================================
// Errors and policy
// ============================================================================

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BatchError {
    #[error("construction failed at index {index} (sequence {sequence})")]
    ConstructionFailed { index: usize, sequence: u64 },

    #[error("could not reserve a block for {count} elements")]
    ResourceExhausted { count: usize },
}

impl BatchError {
    pub fn failed_index(&self) -> Option<usize> {
        match self {
            Self::ConstructionFailed { index, .. } => Some(*index),
            Self::ResourceExhausted { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPolicy {
    /// Sequence number at which construction fails; `None` never fails.
    pub failure_trigger: Option<u64>,
    /// Reset the counter to zero after every rollback.
    pub reset_on_rollback: bool,
}

impl Default for BatchPolicy {
    fn default() -> Self {
        Self {
            failure_trigger: Some(DEFAULT_FAILURE_TRIGGER),
            reset_on_rollback: true,
        }
    }
}

// ============================================================================
// Elements and the owning block
// ============================================================================

/// One constructed element. Reports its own destruction.
pub struct Tracked {
    sequence: u64,
    label: Label,
    sink: Arc<dyn LifecycleSink>,
}

impl Tracked {
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn label(&self) -> &Label {
        &self.label
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.sink.record(LifecycleEvent::Destructed {
            sequence: self.sequence,
            label: self.label.to_string(),
        });
    }
}

impl fmt::Debug for Tracked {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracked")
            .field("sequence", &self.sequence)
            .field("label", &self.label)
            .finish()
    }
}

/// Storage reserved up front for a whole batch.
///
/// Dropping it destroys the elements newest-first and then releases the
/// block, on every exit path including unwinding.
struct Block {
    elements: Vec<Tracked>,
    capacity: usize,
    sink: Arc<dyn LifecycleSink>,
}

impl Block {
    fn acquire(capacity: usize, sink: Arc<dyn LifecycleSink>) -> Result<Self, BatchError> {
        let mut elements = Vec::new();
        elements
            .try_reserve_exact(capacity)
            .map_err(|_| BatchError::ResourceExhausted { count: capacity })?;
        sink.record(LifecycleEvent::BlockAcquired { capacity });
        Ok(Self {
            elements,
            capacity,
            sink,
        })
    }
}

impl Drop for Block {
    fn drop(&mut self) {
        while let Some(element) = self.elements.pop() {
            drop(element);
        }
        self.sink.record(LifecycleEvent::BlockReleased {
            capacity: self.capacity,
        });
    }
}

/// A fully constructed batch.
pub struct ConstructionBatch {
    block: Block,
}

impl ConstructionBatch {
    pub fn len(&self) -> usize {
        self.block.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.block.elements.is_empty()
    }

    pub fn elements(&self) -> &[Tracked] {
        &self.block.elements
    }

    pub fn sequences(&self) -> Vec<u64> {
        self.elements().iter().map(Tracked::sequence).collect()
    }
}

impl fmt::Debug for ConstructionBatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.elements()).finish()
    }
}

// ============================================================================
// State machine
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    Empty,
    /// `k` elements are fully constructed.
    Constructing(usize),
    Complete,
    RolledBack { index: usize },
}

impl BatchState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::RolledBack { .. })
    }
}

enum Stage {
    Empty,
    Building(Block),
    Complete(Block),
    RolledBack(BatchError),
}

/// A batch being built one element at a time.
///
/// Dropping an unfinished attempt tears down what it built, without
/// touching the counter.
pub struct BatchAttempt<'a> {
    factory: &'a BatchFactory<'a>,
    count: usize,
    label: Label,
    stage: Stage,
}

impl<'a> BatchAttempt<'a> {
    pub fn state(&self) -> BatchState {
        match &self.stage {
            Stage::Empty => BatchState::Empty,
            Stage::Building(block) => BatchState::Constructing(block.elements.len()),
            Stage::Complete(_) => BatchState::Complete,
            Stage::RolledBack(error) => BatchState::RolledBack {
                index: error.failed_index().unwrap_or_default(),
            },
        }
    }

    /// Performs one transition. Terminal states are returned unchanged.
    ///
    /// A failed construction rolls the batch back before the error is
    /// returned.
    pub fn advance(&mut self) -> Result<BatchState, BatchError> {
        self.stage = match std::mem::replace(&mut self.stage, Stage::Empty) {
            Stage::Empty => {
                let block = Block::acquire(self.count, Arc::clone(&self.factory.sink))?;
                if self.count == 0 {
                    Stage::Complete(block)
                } else {
                    Stage::Building(block)
                }
            }
            Stage::Building(mut block) => {
                let index = block.elements.len();
                match self.factory.construct_element(self.label) {
                    Ok(element) => {
                        block.elements.push(element);
                        if block.elements.len() == self.count {
                            tracing::info!(count = self.count, "batch complete");
                            Stage::Complete(block)
                        } else {
                            Stage::Building(block)
                        }
                    }
                    Err(sequence) => {
                        drop(block);
                        self.factory.after_rollback();
                        tracing::warn!(index, sequence, "batch rolled back");
                        let error = BatchError::ConstructionFailed { index, sequence };
                        self.stage = Stage::RolledBack(error.clone());
                        return Err(error);
                    }
                }
            }
            terminal => terminal,
        };
        Ok(self.state())
    }

    /// Advances until the attempt completes or rolls back.
    pub fn run(mut self) -> Result<ConstructionBatch, BatchError> {
        loop {
            match std::mem::replace(&mut self.stage, Stage::Empty) {
                Stage::Complete(block) => return Ok(ConstructionBatch { block }),
                Stage::RolledBack(error) => return Err(error),
                stage => {
                    self.stage = stage;
                    self.advance()?;
                }
            }
        }
    }

    pub fn into_batch(self) -> Option<ConstructionBatch> {
        match self.stage {
            Stage::Complete(block) => Some(ConstructionBatch { block }),
            _ => None,
        }
    }
}

// ============================================================================
// Factory
// ============================================================================

/// Builds batches against one sequence counter.
///
/// Give each independent user its own counter so that a rollback in one
/// cannot renumber another.
pub struct BatchFactory<'c> {
    counter: &'c SequenceCounter,
    policy: BatchPolicy,
    sink: Arc<dyn LifecycleSink>,
}

impl<'c> BatchFactory<'c> {
    pub fn new(counter: &'c SequenceCounter) -> Self {
        Self {
            counter,
            policy: BatchPolicy::default(),
            sink: Arc::new(TracingSink),
        }
    }

    pub fn with_policy(mut self, policy: BatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn LifecycleSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn counter(&self) -> &'c SequenceCounter {
        self.counter
    }

    pub fn policy(&self) -> BatchPolicy {
        self.policy
    }

    /// Starts an attempt in the `Empty` state. `None` uses `DEFAULT_NAME`.
    pub fn begin(&self, count: usize, base_name: Option<&str>) -> BatchAttempt<'_> {
        BatchAttempt {
            factory: self,
            count,
            label: base_name.map(Label::new).unwrap_or_default(),
            stage: Stage::Empty,
        }
    }

    pub fn construct_batch(
        &self,
        count: usize,
        base_name: Option<&str>,
    ) -> Result<ConstructionBatch, BatchError> {
        self.begin(count, base_name).run()
    }

    /// Returns the failing sequence number when the trigger is hit.
    fn construct_element(&self, label: Label) -> Result<Tracked, u64> {
        let sequence = self.counter.next();
        self.sink.record(LifecycleEvent::Constructing {
            sequence,
            label: label.to_string(),
        });
        if self.policy.failure_trigger == Some(sequence) {
            return Err(sequence);
        }
        Ok(Tracked {
            sequence,
            label,
            sink: Arc::clone(&self.sink),
        })
    }

    fn after_rollback(&self) {
        if self.policy.reset_on_rollback {
            self.counter.reset();
            self.sink.record(LifecycleEvent::CounterReset);
        }
    }
}

/// Builds a batch on the process-wide counter with the default policy.
pub fn construct_batch(
    count: usize,
    base_name: Option<&str>,
) -> Result<ConstructionBatch, BatchError> {
    BatchFactory::new(SequenceCounter::global()).construct_batch(count, base_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn journaled(counter: &SequenceCounter) -> (BatchFactory<'_>, Arc<Journal>) {
        let journal = Arc::new(Journal::new());
        let factory = BatchFactory::new(counter).with_sink(journal.clone());
        (factory, journal)
    }

    #[test]
    fn test_twelfth_element_fails_and_rolls_back() {
        let counter = SequenceCounter::new();
        let (factory, journal) = journaled(&counter);

        let err = factory.construct_batch(12, None).unwrap_err();
        assert_eq!(
            err,
            BatchError::ConstructionFailed {
                index: 11,
                sequence: 11
            }
        );
        assert_eq!(journal.constructed(), (0..12).collect::<Vec<_>>());
        assert_eq!(journal.destructed(), (0..11).rev().collect::<Vec<_>>());

        let events = journal.events();
        assert_eq!(
            &events[events.len() - 2..],
            &[
                LifecycleEvent::BlockReleased { capacity: 12 },
                LifecycleEvent::CounterReset
            ]
        );
        assert_eq!(counter.peek(), 0);
    }

    #[test]
    fn test_failure_repeats_after_reset() {
        let counter = SequenceCounter::new();
        let factory = BatchFactory::new(&counter);

        for _ in 0..3 {
            let err = factory.construct_batch(12, Some("retry")).unwrap_err();
            assert_eq!(err.failed_index(), Some(11));
            assert_eq!(counter.peek(), 0);
        }
    }

    #[test]
    fn test_small_batch_succeeds() {
        let counter = SequenceCounter::new();
        let (factory, journal) = journaled(&counter);

        let batch = factory.construct_batch(5, Some("noisy")).unwrap();
        assert_eq!(batch.len(), 5);
        assert_eq!(batch.sequences(), vec![0, 1, 2, 3, 4]);
        assert!(batch.elements().iter().all(|e| e.label().as_str() == "noisy"));
        assert!(journal.destructed().is_empty());
        assert_eq!(counter.peek(), 5);

        drop(batch);
        assert_eq!(journal.destructed(), vec![4, 3, 2, 1, 0]);
        assert_eq!(
            journal.events().last(),
            Some(&LifecycleEvent::BlockReleased { capacity: 5 })
        );
    }

    #[test]
    fn test_default_label_applies() {
        let counter = SequenceCounter::new();
        let factory = BatchFactory::new(&counter);
        let batch = factory.construct_batch(1, None).unwrap();
        assert_eq!(batch.elements()[0].label().as_str(), DEFAULT_NAME);
    }

    #[test]
    fn test_state_transitions_to_complete() {
        let counter = SequenceCounter::new();
        let factory = BatchFactory::new(&counter);
        let mut attempt = factory.begin(2, None);

        assert_eq!(attempt.state(), BatchState::Empty);
        assert_eq!(attempt.advance(), Ok(BatchState::Constructing(0)));
        assert_eq!(attempt.advance(), Ok(BatchState::Constructing(1)));
        assert_eq!(attempt.advance(), Ok(BatchState::Complete));
        assert_eq!(attempt.advance(), Ok(BatchState::Complete));

        let batch = attempt.into_batch().unwrap();
        assert_eq!(batch.sequences(), vec![0, 1]);
    }

    #[test]
    fn test_state_transitions_to_rolled_back() {
        let counter = SequenceCounter::starting_at(10);
        let (factory, journal) = journaled(&counter);
        let mut attempt = factory.begin(3, None);

        attempt.advance().unwrap();
        assert_eq!(attempt.advance(), Ok(BatchState::Constructing(1)));
        assert_eq!(
            attempt.advance(),
            Err(BatchError::ConstructionFailed {
                index: 1,
                sequence: 11
            })
        );
        assert_eq!(attempt.state(), BatchState::RolledBack { index: 1 });
        assert_eq!(journal.destructed(), vec![10]);
        assert_eq!(counter.peek(), 0);
        assert!(attempt.into_batch().is_none());
    }

    #[test]
    fn test_zero_count_completes_empty() {
        let counter = SequenceCounter::new();
        let (factory, journal) = journaled(&counter);

        let batch = factory.construct_batch(0, None).unwrap();
        assert!(batch.is_empty());
        drop(batch);
        assert_eq!(
            journal.events(),
            vec![
                LifecycleEvent::BlockAcquired { capacity: 0 },
                LifecycleEvent::BlockReleased { capacity: 0 },
            ]
        );
    }

    #[test]
    fn test_without_reset_counter_keeps_running() {
        let counter = SequenceCounter::new();
        let factory = BatchFactory::new(&counter).with_policy(BatchPolicy {
            reset_on_rollback: false,
            ..BatchPolicy::default()
        });

        assert!(factory.construct_batch(12, None).is_err());
        assert_eq!(counter.peek(), 12);

        let batch = factory.construct_batch(12, None).unwrap();
        assert_eq!(batch.sequences(), (12..24).collect::<Vec<_>>());
    }

    #[test]
    fn test_no_trigger_never_fails() {
        let counter = SequenceCounter::new();
        let factory = BatchFactory::new(&counter).with_policy(BatchPolicy {
            failure_trigger: None,
            ..BatchPolicy::default()
        });
        assert_eq!(factory.construct_batch(50, None).unwrap().len(), 50);
    }

    #[test]
    fn test_rollback_only_resets_own_counter() {
        let first = SequenceCounter::new();
        let second = SequenceCounter::new();
        let failing = BatchFactory::new(&first);
        let healthy = BatchFactory::new(&second);

        let kept = healthy.construct_batch(4, None).unwrap();
        assert!(failing.construct_batch(12, None).is_err());
        assert_eq!(second.peek(), 4);
        assert_eq!(kept.sequences(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_resource_exhaustion_is_reported() {
        let counter = SequenceCounter::new();
        let (factory, journal) = journaled(&counter);

        let err = factory.construct_batch(usize::MAX, None).unwrap_err();
        assert_eq!(err, BatchError::ResourceExhausted { count: usize::MAX });
        assert_eq!(err.failed_index(), None);
        assert!(journal.events().is_empty());
        assert_eq!(counter.peek(), 0);
    }

    #[test]
    fn test_abandoned_attempt_tears_down() {
        let counter = SequenceCounter::new();
        let (factory, journal) = journaled(&counter);

        let mut attempt = factory.begin(5, None);
        for _ in 0..4 {
            attempt.advance().unwrap();
        }
        drop(attempt);

        assert_eq!(journal.destructed(), vec![2, 1, 0]);
        assert_eq!(counter.peek(), 3);
    }
}
