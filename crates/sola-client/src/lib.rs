//! Network edge of the Sola client: the WebSocket transport, the HTTP
//! fallback surface, and the HTTP long-term memory store.

pub mod http_fallback;
pub mod memory_sync;
pub mod transport;

pub use http_fallback::{BackendHttpError, HttpBackendClient};
pub use memory_sync::HttpMemoryStore;
pub use transport::{SocketTransport, TransportEvent};
