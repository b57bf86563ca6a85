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

//! Durable on-disk lifecycle for ingested XML documents.
//!
//! # Design
//! - The filesystem is the state store: a file's terminal outcome is the
//!   dated bucket it physically resides in (`processed/<date>/`,
//!   `errors/<date>/`, `ignored/<date>/`).
//! - Retention cleanup compresses expired processed folders into the
//!   archive root before deleting anything.
//! - Per-file move failures are logged and never abort sibling files.

pub mod error;
pub mod filter;
pub mod service;
pub mod stats;

pub use error::{OrganizerError, OrganizerResult};
pub use filter::{DocumentKind, classify_document};
pub use service::{CleanupReport, Disposition, Organizer};
pub use stats::{BucketStats, format_bytes};
