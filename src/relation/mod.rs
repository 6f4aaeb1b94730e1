//! The relation channel: a generic inter-application key-value exchange.
//!
//! The DNS authority and this service exchange data through a flat
//! `String -> String` map with replace-whole-value semantics: a writer
//! always reads the full current set, mutates it, and writes the complete
//! result back. Partial delta writes are not supported by the transport.
//!
//! Two implementations are provided, [`memory::InMemoryRelationStore`] and
//! [`file::FileRelationStore`]. The former is not durable across restarts.
//! The latter persists the channel state as JSON on disk, which an external
//! counterpart process can read and answer through.

use crate::error::Error;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

pub mod codec;
pub mod file;
pub mod memory;
pub mod request;

#[allow(clippy::module_name_repetitions)]
pub use file::FileRelationStore;
#[allow(clippy::module_name_repetitions)]
pub use memory::InMemoryRelationStore;

/// `DynRelationStore` is a type alias for a [`RelationStore`] shared by
/// multiple read/write consumers through an [`Arc`] and a [`RwLock`].
#[allow(clippy::module_name_repetitions)]
pub type DynRelationStore = Arc<RwLock<dyn RelationStore + Send + Sync>>;

/// Async access to the relation channel's key-value data.
#[async_trait::async_trait]
pub trait RelationStore {
    /// Read the full current channel data.
    async fn read(&self) -> HashMap<String, String>;

    /// Replace the full channel data.
    async fn write(&mut self, kv: HashMap<String, String>) -> Result<(), Error>;
}
