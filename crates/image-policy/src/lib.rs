#![doc = include_str!("../README.md")]
//!
//! # Module Structure
//!
//! - [`error`]: Domain error types (`ImagePolicyError`)
//! - [`types`]: Audit mode and per-image outcome (`Mode`, `Outcome`)
//! - [`pattern`]: Pattern file loading (`PatternSet`, `load_patterns_from_file`)
//! - [`classifier`]: Classification engine (`Classifier`, `CompiledPatterns`, `classify`)
//! - [`sink`]: Observability sinks (`ClassificationSink`, `TracingSink`, `RecordingSink`)
//! - [`docker`]: Docker API abstraction (`DockerClient` trait, `BollardDockerClient`)
//! - [`audit`]: Snapshot + classify + layer expansion (`run_audit`, `AuditReport`)
//!
//! # Architecture
//!
//! ```text
//! images.txt --load--> PatternSet --compile--> Classifier
//!                                                  |
//! DockerClient.list_running_images() ------> classify() --> ClassificationSink
//!                                                  |
//!                                       collect_image_layers()
//!                                                  |
//!                                              AuditReport
//! ```

pub mod audit;
pub mod classifier;
pub mod docker;
pub mod error;
pub mod pattern;
pub mod sink;
pub mod types;

// --- Public API Re-exports ---

// Audit
pub use audit::{AuditReport, run_audit};

// Classification
pub use classifier::{ClassificationReport, Classifier, CompiledPatterns, classify};

// Error
pub use error::ImagePolicyError;

// Patterns
pub use pattern::{PatternSet, load_patterns_from_file};

// Sinks
pub use sink::{ClassificationSink, NullSink, RecordedOutcome, RecordingSink, TracingSink};

// Docker API
pub use docker::{BollardDockerClient, DockerClient, collect_image_layers};

// Types
pub use types::{Mode, Outcome};
