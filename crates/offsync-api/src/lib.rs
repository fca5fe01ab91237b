// offsync-api: Async HTTP client for the remote record store, blob storage,
// and reachability probe.

pub mod blobs;
pub mod error;
pub mod probe;
pub mod records;
mod response;
pub mod transport;

pub use blobs::BlobClient;
pub use error::Error;
pub use probe::HttpProbe;
pub use records::{RecordClient, RecordQuery};
pub use transport::{TlsMode, TransportConfig};
