#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]

//! Daemon assembly for the XML ingestion watcher.
//!
//! # Design
//! - `bootstrap` loads configuration, installs telemetry and wires the
//!   watcher, pipeline and maintenance jobs together.
//! - `pipeline` is the [`vigia_watcher::BatchHandler`] implementation:
//!   classify, upload, commit.
//! - `scheduler` hosts the fire-and-forget daily cleanup and weekly report.

mod bootstrap;
mod error;
mod pipeline;
mod scheduler;

pub use bootstrap::run;
pub use error::{AppError, AppResult};
pub use pipeline::UploadPipeline;
