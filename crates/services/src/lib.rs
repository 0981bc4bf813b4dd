pub mod auth;
pub mod facts;
pub mod store;
pub mod theme;
pub mod wellness;

pub use facts::FactStore;
pub use store::{JsonFileStore, KeyValueStore, MemoryStore};
pub use theme::ThemeStore;
