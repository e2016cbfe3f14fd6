//! Route access decisions

use super::context::SessionState;
use shelf_http::LOGIN_ROUTE;

/// Landing page for redirects away from guest-only or admin pages
pub const HOME_ROUTE: &str = "/";

/// Access requirement of a page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    /// Anyone
    Public,
    /// Signed-in users
    Protected,
    /// Signed-in admins
    Admin,
    /// Only visitors who are not signed in (login, register)
    GuestOnly,
}

/// What the router should do with a navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    /// The session is still being restored; show a placeholder
    Pending,
    Redirect(&'static str),
}

impl Guard {
    /// Decide access from the stored token and the session state
    pub fn decide(self, has_token: bool, state: &SessionState) -> GuardDecision {
        let signed_in = has_token && state.user.is_some();
        let restoring = has_token && state.user.is_none() && state.is_loading;

        match self {
            Self::Public => GuardDecision::Allow,
            Self::GuestOnly if signed_in => GuardDecision::Redirect(HOME_ROUTE),
            Self::GuestOnly => GuardDecision::Allow,
            Self::Protected | Self::Admin if restoring => GuardDecision::Pending,
            Self::Protected | Self::Admin if !signed_in => GuardDecision::Redirect(LOGIN_ROUTE),
            Self::Admin if !state.user.as_ref().is_some_and(|u| u.is_admin()) => {
                GuardDecision::Redirect(HOME_ROUTE)
            }
            Self::Protected | Self::Admin => GuardDecision::Allow,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelf_core::{Role, User};

    fn user(role: Role) -> User {
        User {
            id: "u1".into(),
            name: "Ada".into(),
            email: "ada@example.com".into(),
            role,
            favorites: Vec::new(),
            active: true,
            created_at: None,
            updated_at: None,
        }
    }

    fn signed_in(role: Role) -> SessionState {
        SessionState {
            user: Some(user(role)),
            is_loading: false,
        }
    }

    #[test]
    fn test_protected_without_token_redirects_to_login() {
        // A cached user alone is not enough
        let state = signed_in(Role::User);
        assert_eq!(
            Guard::Protected.decide(false, &state),
            GuardDecision::Redirect("/login")
        );
        assert_eq!(
            Guard::Protected.decide(false, &SessionState::default()),
            GuardDecision::Redirect("/login")
        );
    }

    #[test]
    fn test_protected_waits_while_restoring() {
        let state = SessionState {
            user: None,
            is_loading: true,
        };
        assert_eq!(Guard::Protected.decide(true, &state), GuardDecision::Pending);
    }

    #[test]
    fn test_admin_requires_admin_role() {
        assert_eq!(
            Guard::Admin.decide(true, &signed_in(Role::User)),
            GuardDecision::Redirect(HOME_ROUTE)
        );
        assert_eq!(
            Guard::Admin.decide(true, &signed_in(Role::Admin)),
            GuardDecision::Allow
        );
    }

    #[test]
    fn test_guest_only_bounces_signed_in_users() {
        assert_eq!(
            Guard::GuestOnly.decide(true, &signed_in(Role::User)),
            GuardDecision::Redirect(HOME_ROUTE)
        );
        assert_eq!(
            Guard::GuestOnly.decide(false, &SessionState::default()),
            GuardDecision::Allow
        );
    }

    #[test]
    fn test_public_always_allows() {
        assert_eq!(
            Guard::Public.decide(false, &SessionState::default()),
            GuardDecision::Allow
        );
    }
}
