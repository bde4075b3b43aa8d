//! Session state machine.
//!
//! ```text
//!  Uninitialized ──Restored──▶ Anonymous ◀──────LoggedOut──────┐
//!        │                       │    │                         │
//!        └──Restored(user)──┐    │    └─VerificationRequired─┐  │
//!                           ▼    ▼                           ▼  │
//!                      Authenticated ◀──LoggedIn── VerificationPending
//! ```
//!
//! The status enum carries the user (or pending email) so that
//! "authenticated iff user present" and "pending verification excludes a
//! user" hold by construction. The flag accessors are derived from it.

use crate::api::User;
use crate::store::{Reduce, Store};

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionStatus {
    /// Durable storage has not been checked yet.
    #[default]
    Uninitialized,
    /// Checked; nobody is signed in.
    Anonymous,
    /// Signed in with a stored token.
    Authenticated { user: User },
    /// Credentials accepted structurally, waiting for a one-time code.
    VerificationPending { email: String },
}

/// Full session view state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub status: SessionStatus,
    /// A request is in flight.
    pub loading: bool,
    /// Message of the last failed operation.
    pub error: Option<String>,
}

impl SessionState {
    /// The signed-in user, if any.
    #[must_use]
    pub const fn user(&self) -> Option<&User> {
        match &self.status {
            SessionStatus::Authenticated { user } => Some(user),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self.status, SessionStatus::Authenticated { .. })
    }

    #[must_use]
    pub const fn needs_verification(&self) -> bool {
        matches!(self.status, SessionStatus::VerificationPending { .. })
    }

    /// Email waiting for a verification code.
    #[must_use]
    pub fn verification_email(&self) -> Option<&str> {
        match &self.status {
            SessionStatus::VerificationPending { email } => Some(email.as_str()),
            _ => None,
        }
    }

    /// Whether durable storage has been checked.
    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        !matches!(self.status, SessionStatus::Uninitialized)
    }
}

/// Session transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// Result of the startup storage check. Applied once; ignored afterwards.
    Restored { user: Option<User> },
    /// An auth request was issued.
    RequestStarted,
    /// Login or verification issued a session.
    LoggedIn { user: User },
    /// Registration succeeded, or login reported an unverified account.
    VerificationRequired { email: String },
    /// A stateless round trip (forgot/reset password) succeeded.
    RequestSucceeded,
    /// An auth request failed.
    Failed { message: String },
    /// The profile was refreshed or edited.
    ProfileUpdated { user: User },
    /// Local session cleared.
    LoggedOut,
    /// The user started typing again.
    ClearError,
}

impl Reduce for SessionState {
    type Action = SessionAction;

    fn reduce(self, action: SessionAction) -> Self {
        match action {
            SessionAction::Restored { user } => {
                if self.is_initialized() {
                    return self;
                }
                let status = user.map_or(SessionStatus::Anonymous, |user| {
                    SessionStatus::Authenticated { user }
                });
                Self {
                    status,
                    loading: false,
                    error: None,
                }
            }
            SessionAction::RequestStarted => Self {
                loading: true,
                error: None,
                ..self
            },
            SessionAction::LoggedIn { user } => Self {
                status: SessionStatus::Authenticated { user },
                loading: false,
                error: None,
            },
            SessionAction::VerificationRequired { email } => Self {
                status: SessionStatus::VerificationPending { email },
                loading: false,
                error: None,
            },
            SessionAction::RequestSucceeded => Self {
                loading: false,
                error: None,
                ..self
            },
            SessionAction::Failed { message } => Self {
                loading: false,
                error: Some(message),
                ..self
            },
            SessionAction::ProfileUpdated { user } => match self.status {
                SessionStatus::Authenticated { .. } => Self {
                    status: SessionStatus::Authenticated { user },
                    loading: false,
                    error: None,
                },
                _ => self,
            },
            SessionAction::LoggedOut => Self {
                status: SessionStatus::Anonymous,
                loading: false,
                error: None,
            },
            SessionAction::ClearError => Self {
                error: None,
                ..self
            },
        }
    }
}

/// Shared session store.
pub type SessionStore = Store<SessionState>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use agora_core::{Email, UserId};

    use super::*;

    fn user() -> User {
        User {
            id: UserId::new(1),
            name: "Ana".to_string(),
            email: Email::parse("ana@example.com").unwrap(),
            mobile: None,
            birth_date: None,
            gender: None,
            address: None,
        }
    }

    fn run(actions: impl IntoIterator<Item = SessionAction>) -> SessionState {
        actions
            .into_iter()
            .fold(SessionState::default(), Reduce::reduce)
    }

    #[test]
    fn test_starts_uninitialized() {
        let state = SessionState::default();
        assert!(!state.is_initialized());
        assert!(!state.is_authenticated());
        assert!(state.user().is_none());
    }

    #[test]
    fn test_restore_with_user() {
        let state = run([SessionAction::Restored { user: Some(user()) }]);
        assert!(state.is_initialized());
        assert!(state.is_authenticated());
        assert_eq!(state.user().unwrap().name, "Ana");
    }

    #[test]
    fn test_restore_without_user() {
        let state = run([SessionAction::Restored { user: None }]);
        assert!(state.is_initialized());
        assert_eq!(state.status, SessionStatus::Anonymous);
    }

    #[test]
    fn test_restore_applies_once() {
        let state = run([
            SessionAction::Restored { user: None },
            SessionAction::Restored { user: Some(user()) },
        ]);
        assert_eq!(state.status, SessionStatus::Anonymous);
    }

    #[test]
    fn test_login_flow() {
        let state = run([
            SessionAction::Restored { user: None },
            SessionAction::RequestStarted,
        ]);
        assert!(state.loading);

        let state = state.reduce(SessionAction::LoggedIn { user: user() });
        assert!(state.is_authenticated());
        assert!(!state.loading);
        assert!(!state.needs_verification());
    }

    #[test]
    fn test_verification_pending_excludes_user() {
        let state = run([
            SessionAction::Restored { user: Some(user()) },
            SessionAction::VerificationRequired {
                email: "ana@example.com".to_string(),
            },
        ]);
        assert!(state.needs_verification());
        assert_eq!(state.verification_email(), Some("ana@example.com"));
        assert!(state.user().is_none());
        assert!(!state.is_authenticated());
    }

    #[test]
    fn test_failed_verify_stays_pending() {
        let state = run([
            SessionAction::Restored { user: None },
            SessionAction::VerificationRequired {
                email: "ana@example.com".to_string(),
            },
            SessionAction::RequestStarted,
            SessionAction::Failed {
                message: "Invalid code".to_string(),
            },
        ]);
        assert!(state.needs_verification());
        assert_eq!(state.error.as_deref(), Some("Invalid code"));
        assert!(!state.loading);
    }

    #[test]
    fn test_transitions_clear_error() {
        let failed = run([
            SessionAction::Restored { user: None },
            SessionAction::Failed {
                message: "boom".to_string(),
            },
        ]);
        assert!(failed.error.is_some());

        assert!(failed.clone().reduce(SessionAction::RequestStarted).error.is_none());
        assert!(failed.clone().reduce(SessionAction::ClearError).error.is_none());
        assert!(
            failed
                .reduce(SessionAction::LoggedIn { user: user() })
                .error
                .is_none()
        );
    }

    #[test]
    fn test_logout_keeps_initialized() {
        let state = run([
            SessionAction::Restored { user: Some(user()) },
            SessionAction::LoggedOut,
        ]);
        assert!(state.is_initialized());
        assert!(!state.is_authenticated());
        assert!(state.user().is_none());
    }

    #[test]
    fn test_profile_update_only_when_authenticated() {
        let mut renamed = user();
        renamed.name = "Ana Maria".to_string();

        let anonymous = run([
            SessionAction::Restored { user: None },
            SessionAction::ProfileUpdated {
                user: renamed.clone(),
            },
        ]);
        assert!(anonymous.user().is_none());

        let signed_in = run([
            SessionAction::Restored { user: Some(user()) },
            SessionAction::ProfileUpdated { user: renamed },
        ]);
        assert_eq!(signed_in.user().unwrap().name, "Ana Maria");
    }
}
