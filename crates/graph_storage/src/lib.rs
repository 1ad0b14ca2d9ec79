//! File-backed implementation of the graph and history persistence traits.

pub mod error;
pub mod file_storage;

pub use error::{Result, StorageError};
pub use file_storage::FileGraphStorage;
