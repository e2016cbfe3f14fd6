//! Session context: the signed-in user and the operations that change it
//!
//! State changes go through [`SessionState::reduce`] and are published on a
//! `watch` channel so front ends can re-render on every change.

use super::error::SessionError;
use super::guard::{Guard, GuardDecision};
use shelf_core::{User, UserPatch};
use shelf_http::types::{RegisterRequest, TokenPair};
use shelf_http::{ClientError, Notification, SessionEvents, ShelfClient, ShelfClientBuilder};
use std::sync::Arc;
use tokio::sync::watch;

/// Snapshot of the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub user: Option<User>,
    pub is_loading: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            user: None,
            is_loading: true, // Until stored state has been checked
        }
    }
}

/// Session state transitions
#[derive(Debug, Clone)]
pub enum SessionAction {
    /// Server-confirmed user; loading ends
    Authenticated(User),
    /// Cached user published while the server copy is fetched
    Restored(User),
    LoggedOut,
    SetLoading(bool),
    /// Local merge into the current user; ignored when signed out
    Patch(UserPatch),
}

impl SessionState {
    pub fn reduce(self, action: SessionAction) -> Self {
        match action {
            SessionAction::Authenticated(user) => Self {
                user: Some(user),
                is_loading: false,
            },
            SessionAction::Restored(user) => Self {
                user: Some(user),
                ..self
            },
            SessionAction::LoggedOut => Self {
                user: None,
                is_loading: false,
            },
            SessionAction::SetLoading(is_loading) => Self { is_loading, ..self },
            SessionAction::Patch(patch) => {
                let mut next = self;
                if let Some(user) = next.user.as_mut() {
                    user.apply(patch);
                }
                next
            }
        }
    }
}

/// Forwards client events and drops the in-memory user when the client ends the session
struct ContextEvents {
    state: Arc<watch::Sender<SessionState>>,
    inner: Arc<dyn SessionEvents>,
}

impl SessionEvents for ContextEvents {
    fn notify(&self, notification: Notification) {
        self.inner.notify(notification);
    }

    fn redirect_to_login(&self) {
        self.state
            .send_modify(|s| *s = std::mem::take(s).reduce(SessionAction::LoggedOut));
        self.inner.redirect_to_login();
    }
}

/// Shared handle to the session
///
/// Clones observe and mutate the same state.
#[derive(Clone)]
pub struct SessionContext {
    client: ShelfClient,
    state: Arc<watch::Sender<SessionState>>,
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("client", &self.client)
            .field("state", &*self.state.borrow())
            .finish()
    }
}

impl SessionContext {
    /// Build the client from `builder`, routing its events through the session
    pub fn new(
        builder: ShelfClientBuilder,
        events: Arc<dyn SessionEvents>,
    ) -> Result<Self, ClientError> {
        let (tx, _) = watch::channel(SessionState::default());
        let state = Arc::new(tx);
        let adapter = Arc::new(ContextEvents {
            state: state.clone(),
            inner: events,
        });
        let client = builder.events(adapter).build()?;
        Ok(Self { client, state })
    }

    pub fn client(&self) -> &ShelfClient {
        &self.client
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn user(&self) -> Option<User> {
        self.state.borrow().user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().user.is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.state.borrow().user.as_ref().is_some_and(User::is_admin)
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading
    }

    /// Receive every subsequent state change
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Access decision for a page guarded by `guard`
    pub fn guard(&self, guard: Guard) -> GuardDecision {
        let has_token = self.client.tokens().access_token().is_some();
        guard.decide(has_token, &self.state.borrow())
    }

    fn dispatch(&self, action: SessionAction) {
        self.state
            .send_modify(|s| *s = std::mem::take(s).reduce(action));
    }

    /// Rehydrate the session from storage
    ///
    /// A cached user is published immediately and then replaced by the
    /// server's copy. If that fetch fails the session is ended.
    pub async fn initialize(&self) {
        let tokens = self.client.tokens();
        if tokens.access_token().is_none() {
            debug!("No stored session");
            if let Err(e) = tokens.remove_user() {
                warn!(error = %e, "Failed to drop cached user");
            }
            self.dispatch(SessionAction::LoggedOut);
            return;
        }

        self.dispatch(SessionAction::SetLoading(true));
        if let Some(cached) = tokens.cached_user() {
            debug!(user_id = %cached.id, "Restored cached user");
            self.dispatch(SessionAction::Restored(cached));
        }

        match self.client.me().await {
            Ok(user) => {
                info!(user_id = %user.id, "Session restored");
                self.persist_user(&user);
                self.dispatch(SessionAction::Authenticated(user));
            }
            Err(e) => {
                warn!(error = %e, "Stored session is no longer valid");
                self.end_session();
            }
        }
    }

    /// Sign in with email and password
    pub async fn login(&self, email: &str, password: &str) -> Result<User, SessionError> {
        self.dispatch(SessionAction::SetLoading(true));
        let auth = match self.client.login(email, password).await {
            Ok(auth) => auth,
            Err(e) => {
                debug!(error = %e, "Login rejected");
                self.dispatch(SessionAction::SetLoading(false));
                return Err(SessionError::rejected(e, "Login failed"));
            }
        };
        self.establish(&auth.tokens).await
    }

    /// Create an account and sign in to it
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<User, SessionError> {
        self.dispatch(SessionAction::SetLoading(true));
        let request = RegisterRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        let response = match self.client.register(&request).await {
            Ok(response) => response,
            Err(e) => {
                debug!(error = %e, "Registration rejected");
                self.dispatch(SessionAction::SetLoading(false));
                return Err(SessionError::rejected(e, "Registration failed"));
            }
        };

        match response.tokens() {
            Some(tokens) => self.establish(&tokens).await,
            None => self.login(email, password).await,
        }
    }

    /// Store fresh tokens and load the profile they belong to
    async fn establish(&self, tokens: &TokenPair) -> Result<User, SessionError> {
        if let Err(e) = self.client.tokens().store_tokens(tokens) {
            error!(error = %e, "Failed to store session tokens");
            self.end_session();
            return Err(e.into());
        }

        match self.client.me().await {
            Ok(user) => {
                info!(user_id = %user.id, "Signed in");
                self.persist_user(&user);
                self.dispatch(SessionAction::Authenticated(user.clone()));
                self.client
                    .events()
                    .notify(Notification::success(format!("Welcome, {}!", user.name)));
                Ok(user)
            }
            Err(e) => {
                warn!(error = %e, "Profile fetch after sign-in failed");
                self.end_session();
                Err(SessionError::Profile(e))
            }
        }
    }

    /// Sign out; the server call is best effort
    pub async fn logout(&self) {
        if let Some(refresh_token) = self.client.tokens().refresh_token()
            && let Err(e) = self.client.logout(refresh_token).await
        {
            debug!(error = %e, "Server-side logout failed, clearing local session anyway");
        }
        self.end_session();
        self.client
            .events()
            .notify(Notification::info("You have been logged out."));
    }

    /// Merge `patch` into the current user without a server round trip
    ///
    /// Visible to [`Self::user`] as soon as this returns. Returns the
    /// updated user, or `None` when nobody is signed in.
    pub fn update_user(&self, patch: UserPatch) -> Option<User> {
        self.dispatch(SessionAction::Patch(patch));
        let user = self.user()?;
        self.persist_user(&user);
        Some(user)
    }

    /// Re-fetch the profile; on failure the current state is kept
    pub async fn refresh_user_data(&self) -> Result<User, ClientError> {
        let user = self.client.me().await?;
        self.persist_user(&user);
        self.dispatch(SessionAction::Authenticated(user.clone()));
        Ok(user)
    }

    /// Save profile changes server-side and adopt the result
    pub async fn save_profile(&self, patch: &UserPatch) -> Result<User, SessionError> {
        if !self.is_authenticated() {
            return Err(SessionError::NotSignedIn);
        }
        let user = self
            .client
            .update_profile(patch)
            .await
            .map_err(|e| SessionError::rejected(e, "Profile update failed"))?;
        self.persist_user(&user);
        self.dispatch(SessionAction::Authenticated(user.clone()));
        self.client
            .events()
            .notify(Notification::success("Profile updated."));
        Ok(user)
    }

    /// Replace the in-memory and cached user wholesale
    pub(crate) fn replace_user(&self, user: User) {
        self.persist_user(&user);
        self.dispatch(SessionAction::Restored(user));
    }

    /// Put back a user snapshot, unless the session ended or changed hands meanwhile
    pub(crate) fn restore_user(&self, snapshot: User) -> bool {
        let restored = self.state.send_if_modified(|s| match s.user.as_mut() {
            Some(current) if current.id == snapshot.id => {
                *current = snapshot;
                true
            }
            _ => false,
        });
        if restored && let Some(user) = self.user() {
            self.persist_user(&user);
        }
        restored
    }

    fn persist_user(&self, user: &User) {
        if let Err(e) = self.client.tokens().store_user(user) {
            warn!(error = %e, "Failed to cache user");
        }
    }

    fn end_session(&self) {
        if let Err(e) = self.client.tokens().clear() {
            error!(error = %e, "Failed to clear stored session");
        }
        self.dispatch(SessionAction::LoggedOut);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelf_core::Role;

    fn user() -> User {
        User {
            id: "u1".into(),
            name: "Ada".into(),
            email: "ada@example.com".into(),
            role: Role::User,
            favorites: vec!["m1".into()],
            active: true,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_initial_state_is_loading() {
        let state = SessionState::default();
        assert!(state.is_loading);
        assert!(state.user.is_none());
    }

    #[test]
    fn test_restored_keeps_loading() {
        let state = SessionState::default().reduce(SessionAction::Restored(user()));
        assert!(state.is_loading);
        assert!(state.user.is_some());

        let state = state.reduce(SessionAction::Authenticated(user()));
        assert!(!state.is_loading);
    }

    #[test]
    fn test_patch_is_ignored_when_signed_out() {
        let state = SessionState::default()
            .reduce(SessionAction::LoggedOut)
            .reduce(SessionAction::Patch(UserPatch::favorites(vec!["m2".into()])));
        assert!(state.user.is_none());
    }

    #[test]
    fn test_patch_merges_into_user() {
        let state = SessionState::default()
            .reduce(SessionAction::Authenticated(user()))
            .reduce(SessionAction::Patch(UserPatch::favorites(vec!["m2".into()])));
        let user = state.user.unwrap();
        assert_eq!(user.favorites, vec!["m2".to_string()]);
        assert_eq!(user.name, "Ada");
    }

    #[test]
    fn test_update_user_is_synchronous_and_persisted() {
        let session = SessionContext::new(
            ShelfClient::builder().base_url("http://localhost:5000/api"),
            Arc::new(shelf_http::TracingEvents),
        )
        .unwrap();
        assert!(session.update_user(UserPatch::default()).is_none());

        session.dispatch(SessionAction::Authenticated(user()));
        let updated = session
            .update_user(UserPatch::favorites(vec!["m7".into()]))
            .unwrap();

        assert_eq!(updated.favorites, vec!["m7".to_string()]);
        assert_eq!(session.user().unwrap().favorites, vec!["m7".to_string()]);
        assert_eq!(
            session.client().tokens().cached_user().unwrap().favorites,
            vec!["m7".to_string()]
        );
    }

    #[test]
    fn test_restore_user_skips_other_accounts() {
        let session = SessionContext::new(
            ShelfClient::builder().base_url("http://localhost:5000/api"),
            Arc::new(shelf_http::TracingEvents),
        )
        .unwrap();
        assert!(!session.restore_user(user()));

        let mut other = user();
        other.id = "u2".into();
        session.dispatch(SessionAction::Authenticated(other));
        assert!(!session.restore_user(user()));
        assert_eq!(session.user().unwrap().id, "u2");
    }
}
