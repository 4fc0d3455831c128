//! Storage backends.

mod filesystem;
mod memory;

pub use filesystem::{FilesystemStore, FilesystemStoreCreateError};
pub use memory::MemoryStore;
