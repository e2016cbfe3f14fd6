//! Shelf session layer
//!
//! Holds the signed-in user on top of [`shelf_http::ShelfClient`]: sign-in
//! and sign-out, restoring a stored session, optimistic updates and route
//! guards.

#[macro_use]
extern crate tracing;

pub mod auth;
pub mod optimistic;
pub mod services;

pub use auth::{
    FormError, FormField, Guard, GuardDecision, SessionContext, SessionError, SessionState,
};
pub use optimistic::{Reconciled, mutate_then_reconcile};
pub use services::FavoritesService;
