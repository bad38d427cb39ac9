//! Qvick core types: session state, durable storage and the token store

pub mod error;
pub mod session;
pub mod storage;
pub mod token_store;
pub mod tracing;

pub use error::{CoreError, CoreResult};
pub use session::{PersistedSession, Role, Session};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use token_store::TokenStore;
