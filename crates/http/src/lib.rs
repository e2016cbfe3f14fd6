//! Shelf HTTP client
//!
//! Typed access to the media-library REST API with bearer authentication,
//! persistent session storage and single-flight token refresh.

#[macro_use]
extern crate tracing;

pub mod client;
pub mod events;
pub mod storage;
pub mod types;

pub use client::error::ClientError;
pub use client::{ShelfClient, ShelfClientBuilder};
pub use events::{LOGIN_ROUTE, Notification, NotificationLevel, SessionEvents, TracingEvents};
pub use storage::{FileStorage, KeyValueStore, MemoryStorage, StorageError, TokenStore};
pub use types::TokenPair;

#[cfg(target_arch = "wasm32")]
pub use events::BrowserEvents;
#[cfg(target_arch = "wasm32")]
pub use storage::LocalStorage;
