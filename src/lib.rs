//! # Volume 2 Patterns
//!
//! Small, self-contained library pieces behind the `complete_*` programs.
//!
//! ## Modules
//!
//! 1. **ordered** - An append-only sequence sorted in place by an explicit comparison strategy
//! 2. **batch** - Bulk construction of fallible elements with rollback on failure
//! 3. **stream** - Upper-case copy of a text file
//! 4. **config** - TOML settings shared by the programs
//! 5. **telemetry** - Logging setup
//!
//! ## Running the programs
//!
//! ```bash
//! cargo run --bin complete_03_sorted
//! cargo run --bin complete_07_recover_batch -- demo.toml
//! cargo run --bin complete_02_stream_upper -- demo.toml
//! ```
//!
//! ## Key Dependencies
//!
//! - `thiserror` - Error enums for each module
//! - `serde` + `toml` - Configuration files
//! - `tracing` - Lifecycle narration

pub mod batch;
pub mod config;
pub mod ordered;
pub mod stream;
pub mod telemetry;

pub use batch::{
    construct_batch, BatchAttempt, BatchError, BatchFactory, BatchPolicy, BatchState,
    ConstructionBatch, SequenceCounter,
};
pub use ordered::{ByCStr, ByDeref, ByValue, Comparator, OrderedSequence};
pub use stream::{upper_case, upper_case_copy, TransformError};
