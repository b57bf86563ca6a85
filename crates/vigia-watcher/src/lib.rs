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

//! Directory observation for incoming XML documents.
//!
//! # Design
//! - A platform watcher (depth 1, XML names only) feeds raw write events
//!   into a debouncing loop.
//! - Each path must stay quiet for the stability window before it joins the
//!   pending batch; the shared batch-join window then groups near-simultaneous
//!   arrivals into one submission.
//! - Batches drain through a strictly serial queue; the [`BatchHandler`]
//!   seam is where the upload pipeline plugs in.

mod batcher;
pub mod error;
pub mod filter;
mod queue;
pub mod service;

pub use error::{WatchError, WatchResult};
pub use filter::XmlFilter;
pub use queue::{BatchHandler, HandlerError};
pub use service::WatchService;
