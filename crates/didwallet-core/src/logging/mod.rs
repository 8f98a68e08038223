//! JSONL run logs.
//!
//! Each demo run appends its tracing events to its own file, one JSON
//! object per line:
//!
//! ```text
//! <log_dir>/
//! └── raw/
//!     ├── 2026-10-18_run-143045.jsonl
//!     └── 2026-10-18_run-150112.jsonl
//! ```
//!
//! ```ignore
//! use didwallet_core::logging::JsonlLayer;
//! use tracing_subscriber::prelude::*;
//!
//! let layer = JsonlLayer::new("./logs", "run-143045")?;
//! tracing_subscriber::registry()
//!     .with(layer)
//!     .with(tracing_subscriber::fmt::layer())
//!     .init();
//! ```
//!
//! Failed steps across all runs:
//!
//! ```bash
//! jq 'select(.level == "warn")' logs/raw/*.jsonl
//! ```

pub mod entry;
pub mod layer;
pub mod writer;

pub use entry::LogEntry;
pub use layer::JsonlLayer;
pub use writer::{read_all_entries, read_run_entries, RunLogWriter};
