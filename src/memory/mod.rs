//! Project memory corpus
//!
//! Records, the storage interface and its implementations, and the HTTP
//! handlers that expose CRUD over a store.

pub mod handler;
pub mod record;
pub mod store;

pub use handler::{memory_router, MemoryState};
pub use record::{Importance, MemoryCategory, MemoryPatch, MemoryRecord, MemoryRecordBuilder};
pub use store::{fuzzy_rank, parse_corpus, substring_search, InMemoryStore, JsonFileStore, MemoryStore};
