//! Authentication module

pub mod context;
pub mod error;
pub mod form_error;
pub mod guard;

// Re-export commonly used items
pub use context::{SessionAction, SessionContext, SessionState};
pub use error::SessionError;
pub use form_error::{FormError, FormField};
pub use guard::{Guard, GuardDecision, HOME_ROUTE};
