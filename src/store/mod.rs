//! Persistence for document streams and bulk data.
//!
//! Two concerns live here:
//!
//! - **Document stores** ([`MemoryStore`], [`JsonlStore`]) receive the same
//!   document stream the live callbacks see and serve it back later for
//!   offline plotting or CSV export. Both implement
//!   [`DocumentCallback`](crate::callback::DocumentCallback), so subscribing a
//!   store to the engine is no different from subscribing a plot.
//! - **The [`FileStore`]** holds bulk arrays (detector frames) outside the
//!   document stream. Detectors save a frame and put only the returned datum
//!   id into the event; consumers resolve the id back to the raw array.

pub mod filestore;
pub mod jsonl;
pub mod memory;

pub use filestore::FileStore;
pub use jsonl::JsonlStore;
pub use memory::MemoryStore;

use crate::error::AppResult;
use crate::experiment::document::Document;

/// Anything that can record a document stream.
pub trait DocumentStore {
    /// Record one document. Order of insertion is the order of the stream.
    fn insert(&mut self, doc: &Document) -> AppResult<()>;
}
