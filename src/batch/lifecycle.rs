use std::sync::{Mutex, PoisonError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    BlockAcquired { capacity: usize },
    Constructing { sequence: u64, label: String },
    Destructed { sequence: u64, label: String },
    BlockReleased { capacity: usize },
    CounterReset,
}

/// Receives construction and teardown events as they happen.
pub trait LifecycleSink: Send + Sync {
    fn record(&self, event: LifecycleEvent);
}

/// Narrates events through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LifecycleSink for TracingSink {
    fn record(&self, event: LifecycleEvent) {
        match event {
            LifecycleEvent::BlockAcquired { capacity } => {
                tracing::debug!(capacity, "acquired block");
            }
            LifecycleEvent::Constructing { sequence, label } => {
                tracing::debug!(sequence, %label, "constructing element");
            }
            LifecycleEvent::Destructed { sequence, label } => {
                tracing::debug!(sequence, %label, "destructing element");
            }
            LifecycleEvent::BlockReleased { capacity } => {
                tracing::debug!(capacity, "released block");
            }
            LifecycleEvent::CounterReset => {
                tracing::debug!("sequence counter reset");
            }
        }
    }
}

/// Keeps every event in memory, in arrival order.
#[derive(Debug, Default)]
pub struct Journal {
    events: Mutex<Vec<LifecycleEvent>>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<LifecycleEvent> {
        self.lock().clone()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn constructed(&self) -> Vec<u64> {
        self.lock()
            .iter()
            .filter_map(|event| match event {
                LifecycleEvent::Constructing { sequence, .. } => Some(*sequence),
                _ => None,
            })
            .collect()
    }

    pub fn destructed(&self) -> Vec<u64> {
        self.lock()
            .iter()
            .filter_map(|event| match event {
                LifecycleEvent::Destructed { sequence, .. } => Some(*sequence),
                _ => None,
            })
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<LifecycleEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LifecycleSink for Journal {
    fn record(&self, event: LifecycleEvent) {
        self.lock().push(event);
    }
}
