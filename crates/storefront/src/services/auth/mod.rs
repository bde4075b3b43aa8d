//! Authentication service.
//!
//! Maps each auth round trip onto session transitions and keeps the durable
//! `user`/`token` pair in sync with the session.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use tracing::instrument;

use agora_core::Email;

use crate::api::{
    ApiClient, ApiError, ErrorClassifier, ErrorKind, IssuedSession, PasswordReset, Registration,
    User,
};
use crate::error::{clear_sentry_user, set_sentry_user};
use crate::session::{SessionAction, SessionState, SessionStore};
use crate::storage::{self, Storage, StorageError, keys};

/// Outcome of a login attempt that was not a hard failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// A session was issued.
    Authenticated(User),
    /// The account exists but must be verified with a code first.
    VerificationRequired { email: String },
}

/// Authentication service.
///
/// Handles registration, verification, login, password recovery and logout.
#[derive(Clone)]
pub struct AuthService {
    api: ApiClient,
    storage: Arc<dyn Storage>,
    session: SessionStore,
    classifier: ErrorClassifier,
}

impl AuthService {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(
        api: ApiClient,
        storage: Arc<dyn Storage>,
        session: SessionStore,
        classifier: ErrorClassifier,
    ) -> Self {
        Self {
            api,
            storage,
            session,
            classifier,
        }
    }

    /// The session store this service drives.
    #[must_use]
    pub const fn session(&self) -> &SessionStore {
        &self.session
    }

    // =========================================================================
    // Startup
    // =========================================================================

    /// Restore the session from durable storage.
    ///
    /// Both `user` and `token` must be present to come back authenticated;
    /// no network call is made. Only the first call has any effect.
    pub fn restore(&self) -> SessionState {
        if self.session.with(SessionState::is_initialized) {
            return self.session.state();
        }

        let user = match self.stored_session() {
            Ok(user) => user,
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring unreadable stored session");
                None
            }
        };

        if let Some(user) = &user {
            set_sentry_user(&user.id, Some(user.email.as_str()));
        }

        self.session.dispatch(SessionAction::Restored { user });
        self.session.state()
    }

    fn stored_session(&self) -> Result<Option<User>, StorageError> {
        let token = self
            .storage
            .get(keys::TOKEN)?
            .filter(|t| !t.is_empty());
        if token.is_none() {
            return Ok(None);
        }
        storage::read_json(self.storage.as_ref(), keys::USER)
    }

    // =========================================================================
    // Registration & Verification
    // =========================================================================

    /// Register a new account.
    ///
    /// Success moves the session to verification-pending for the registered
    /// email; no session is issued until [`verify`](Self::verify).
    ///
    /// # Errors
    ///
    /// Returns the API error, which is also recorded in the session.
    #[instrument(skip(self, form), fields(email = %form.email))]
    pub async fn register(&self, form: &Registration) -> Result<(), ApiError> {
        self.session.dispatch(SessionAction::RequestStarted);

        match self.api.register(form).await {
            Ok(()) => {
                tracing::info!("Registration accepted, awaiting verification");
                self.session.dispatch(SessionAction::VerificationRequired {
                    email: form.email.to_string(),
                });
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Verify an account with the emailed code and sign in.
    ///
    /// # Errors
    ///
    /// Returns the API error; the session stays verification-pending with
    /// the error recorded.
    #[instrument(skip(self, recovery_code), fields(email = %email))]
    pub async fn verify(&self, email: &Email, recovery_code: &str) -> Result<User, ApiError> {
        self.session.dispatch(SessionAction::RequestStarted);

        let issued = match self.api.verify_account(email, recovery_code).await {
            Ok(issued) => issued,
            Err(e) => return Err(self.fail(e)),
        };

        self.establish(issued)
    }

    // =========================================================================
    // Login & Logout
    // =========================================================================

    /// Log in with email and password.
    ///
    /// A rejection whose message says the account still needs verification
    /// is not a failure: the session moves to verification-pending for
    /// `email` and `LoginOutcome::VerificationRequired` is returned.
    ///
    /// # Errors
    ///
    /// Returns any other API error, which is also recorded in the session.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<LoginOutcome, ApiError> {
        self.session.dispatch(SessionAction::RequestStarted);

        match self.api.login(email, password).await {
            Ok(issued) => self.establish(issued).map(LoginOutcome::Authenticated),
            Err(e) if self.classifier.classify(&e) == ErrorKind::NeedsVerification => {
                tracing::info!("Login requires account verification");
                let email = email.to_string();
                self.session
                    .dispatch(SessionAction::VerificationRequired { email: email.clone() });
                Ok(LoginOutcome::VerificationRequired { email })
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Sign out.
    ///
    /// The server is told best-effort; local state is cleared regardless of
    /// the outcome.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        if let Err(e) = self.api.logout().await {
            tracing::warn!(error = %e, "Remote logout failed; clearing local session anyway");
        }

        for key in [keys::TOKEN, keys::USER] {
            if let Err(e) = self.storage.remove(key) {
                tracing::warn!(key, error = %e, "Failed to clear stored session value");
            }
        }

        clear_sentry_user();
        self.session.dispatch(SessionAction::LoggedOut);
    }

    // =========================================================================
    // Password Recovery
    // =========================================================================

    /// Ask the server to email a password recovery code.
    ///
    /// # Errors
    ///
    /// Returns the API error, which is also recorded in the session.
    #[instrument(skip(self), fields(email = %email))]
    pub async fn forgot_password(&self, email: &Email) -> Result<(), ApiError> {
        self.session.dispatch(SessionAction::RequestStarted);
        let result = self.api.forgot_password(email).await;
        self.settle(result)
    }

    /// Set a new password with a recovery code.
    ///
    /// # Errors
    ///
    /// Returns the API error, which is also recorded in the session.
    #[instrument(skip(self, form), fields(email = %form.email))]
    pub async fn reset_password(&self, form: &PasswordReset) -> Result<(), ApiError> {
        self.session.dispatch(SessionAction::RequestStarted);
        let result = self.api.reset_password(form).await;
        self.settle(result)
    }

    /// Clear the session error slot (on next user input).
    pub fn clear_error(&self) {
        self.session.dispatch(SessionAction::ClearError);
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Persist an issued session and mark the user signed in.
    fn establish(&self, issued: IssuedSession) -> Result<User, ApiError> {
        if let Err(e) = self.persist(&issued) {
            // A half-written pair must not leave a usable token behind
            for key in [keys::TOKEN, keys::USER] {
                if let Err(e) = self.storage.remove(key) {
                    tracing::warn!(key, error = %e, "Failed to clear partially stored session");
                }
            }
            return Err(self.fail(e.into()));
        }

        set_sentry_user(&issued.user.id, Some(issued.user.email.as_str()));
        tracing::info!(user_id = %issued.user.id, "Signed in");

        self.session.dispatch(SessionAction::LoggedIn {
            user: issued.user.clone(),
        });
        Ok(issued.user)
    }

    fn persist(&self, issued: &IssuedSession) -> Result<(), StorageError> {
        storage::write_json(self.storage.as_ref(), keys::USER, &issued.user)?;
        self.storage.set(keys::TOKEN, issued.token.expose_secret())
    }

    fn settle(&self, result: Result<(), ApiError>) -> Result<(), ApiError> {
        match result {
            Ok(()) => {
                self.session.dispatch(SessionAction::RequestSucceeded);
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Record `error` in the session and hand it back.
    fn fail(&self, error: ApiError) -> ApiError {
        self.session.dispatch(SessionAction::Failed {
            message: error.to_string(),
        });
        error
    }
}
