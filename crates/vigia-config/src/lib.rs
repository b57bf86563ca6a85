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

//! File-backed configuration for the Vigia watcher daemon.
//!
//! Layout: `model.rs` (typed settings documents), `loader.rs` (JSON file
//! discovery, env overrides), `validate.rs` (validation helpers).

pub mod error;
pub mod loader;
pub mod model;
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::{load, load_from};
pub use model::{
    Credentials, Folders, ReportSettings, RetentionPolicy, RetrySettings, Settings, WatchSettings,
};
pub use validate::validate;
