//! The storage backend: in-memory collections with write-through persistence.

pub mod persistence;
pub mod store;

pub use persistence::{FileAdapter, MemoryAdapter, PersistenceAdapter};
pub use store::Store;
