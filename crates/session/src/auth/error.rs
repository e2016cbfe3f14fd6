use super::form_error::FormError;
use shelf_http::{ClientError, StorageError};
use thiserror::Error;

/// Failures of session operations
#[derive(Debug, Error)]
pub enum SessionError {
    /// The server refused the credentials or the submitted form
    #[error("{form}")]
    Rejected {
        form: FormError,
        #[source]
        source: ClientError,
    },

    /// Tokens were issued but the profile could not be loaded
    #[error("failed to load profile: {0}")]
    Profile(#[source] ClientError),

    /// The operation needs a signed-in user
    #[error("not signed in")]
    NotSignedIn,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl SessionError {
    /// Wrap a failed call, mapping its server message onto the form
    pub(crate) fn rejected(source: ClientError, fallback: &str) -> Self {
        let form = source
            .server_message()
            .filter(|m| !m.is_empty())
            .map_or_else(|| FormError::general(fallback), FormError::from_message);
        Self::Rejected { form, source }
    }

    /// Error to render on the form that triggered the operation
    pub fn form_error(&self) -> FormError {
        match self {
            Self::Rejected { form, .. } => form.clone(),
            other => FormError::general(other.to_string()),
        }
    }
}
