// ── Persisted key-value stores ──
//
// Backends for the `KeyValueStore` contract: an in-memory map for tests
// and ephemeral sessions, and a one-file-per-key directory store.

mod file;
mod memory;

pub use file::FileKvStore;
pub use memory::MemoryKvStore;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum KvError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("value encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}
