//! Shelf core types and utilities

pub mod config;
pub mod error;
#[cfg(all(feature = "tracing", not(target_arch = "wasm32")))]
pub mod tracing;
pub mod types;

pub use config::ClientSettings;
pub use error::{CoreError, CoreResult};
pub use types::{
    AccountUpdate, BorrowRecord, BorrowStatus, MediaDraft, MediaFilter, MediaItem, MediaType,
    PageInfo, Paginated, Role, SortOrder, User, UserPatch, UserQuery,
};
