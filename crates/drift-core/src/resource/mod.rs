//! Shared resources reused across table assemblies.

mod pool;

pub use pool::{StoragePool, StoragePoolRef};
