pub mod auth_client;
pub mod persist;
pub mod store;

pub use auth_client::AuthClient;
pub use persist::{FilePersistStore, MemoryPersistStore, PersistStore, PERSIST_KEY};
pub use store::SessionStore;
