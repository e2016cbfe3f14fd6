//! Mutate-then-reconcile
//!
//! Apply a change to the signed-in user right away, run the server call,
//! and put the previous user back if the call fails.

use crate::auth::SessionContext;
use shelf_core::User;
use shelf_http::{ClientError, Notification};

/// Outcome of an optimistic update
#[derive(Debug)]
pub enum Reconciled<T> {
    /// The server accepted the change
    Applied(T),
    /// The server call failed and the local change was undone
    RolledBack(ClientError),
}

impl<T> Reconciled<T> {
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Reconciled<U> {
        match self {
            Self::Applied(value) => Reconciled::Applied(f(value)),
            Self::RolledBack(err) => Reconciled::RolledBack(err),
        }
    }

    pub fn into_result(self) -> Result<T, ClientError> {
        match self {
            Self::Applied(value) => Ok(value),
            Self::RolledBack(err) => Err(err),
        }
    }
}

/// Apply `mutate` to the current user, then run `call`
///
/// On failure the whole pre-mutation user is restored and
/// `failure_message` is shown, unless the client already surfaced the
/// error itself. Without a signed-in user nothing is sent.
pub async fn mutate_then_reconcile<T, M, C, Fut>(
    session: &SessionContext,
    failure_message: &str,
    mutate: M,
    call: C,
) -> Reconciled<T>
where
    M: FnOnce(&mut User),
    C: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, ClientError>>,
{
    let Some(snapshot) = session.user() else {
        return Reconciled::RolledBack(ClientError::AuthenticationFailed(
            "not signed in".to_string(),
        ));
    };

    let mut draft = snapshot.clone();
    mutate(&mut draft);
    session.replace_user(draft);

    match call().await {
        Ok(value) => Reconciled::Applied(value),
        Err(err) => {
            let restored = session.restore_user(snapshot);
            debug!(restored, error = %err, "Optimistic update rolled back");
            if err.user_message().is_none() {
                session
                    .client()
                    .events()
                    .notify(Notification::error(failure_message));
            }
            Reconciled::RolledBack(err)
        }
    }
}
