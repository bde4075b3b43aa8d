//! Authentication endpoints.

use chrono::NaiveDate;
use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use agora_core::Email;

use super::types::{Envelope, User};
use super::{ApiClient, ApiError, Auth};

/// Registration form.
///
/// Implements `Debug` manually to redact passwords.
#[derive(Clone)]
pub struct Registration {
    pub name: String,
    pub mobile: String,
    pub birth_date: NaiveDate,
    pub email: Email,
    pub password: SecretString,
    pub password_confirmation: SecretString,
    pub gender: String,
    pub address: String,
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("name", &self.name)
            .field("mobile", &self.mobile)
            .field("birth_date", &self.birth_date)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("password_confirmation", &"[REDACTED]")
            .field("gender", &self.gender)
            .field("address", &self.address)
            .finish()
    }
}

/// Password reset form (recovery code from the "forgot password" email).
#[derive(Debug, Clone)]
pub struct PasswordReset {
    pub email: Email,
    pub recovery_code: String,
    pub password: SecretString,
    pub confirm_password: SecretString,
}

/// A freshly issued session: the profile plus its bearer token.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub user: User,
    pub token: SecretString,
}

#[derive(Deserialize)]
struct RawSession {
    user: User,
    #[serde(alias = "token")]
    access_token: String,
}

impl From<RawSession> for IssuedSession {
    fn from(raw: RawSession) -> Self {
        Self {
            user: raw.user,
            token: SecretString::from(raw.access_token),
        }
    }
}

#[derive(Serialize)]
struct RegisterBody<'a> {
    name: &'a str,
    mobile: &'a str,
    birth_date: String,
    email: &'a str,
    password: &'a str,
    password_confirmation: &'a str,
    gender: &'a str,
    address: &'a str,
}

#[derive(Serialize)]
struct CredentialsBody<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct VerifyBody<'a> {
    email: &'a str,
    recovery_code: &'a str,
}

#[derive(Serialize)]
struct EmailBody<'a> {
    email: &'a str,
}

#[derive(Serialize)]
struct ResetBody<'a> {
    email: &'a str,
    recovery_code: &'a str,
    password: &'a str,
    confirm_password: &'a str,
}

impl ApiClient {
    /// Create an account. The account must still be verified before login.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the registration.
    #[instrument(skip(self, form), fields(email = %form.email))]
    pub async fn register(&self, form: &Registration) -> Result<(), ApiError> {
        let body = RegisterBody {
            name: &form.name,
            mobile: &form.mobile,
            birth_date: form.birth_date.format("%Y-%m-%d").to_string(),
            email: form.email.as_str(),
            password: form.password.expose_secret(),
            password_confirmation: form.password_confirmation.expose_secret(),
            gender: &form.gender,
            address: &form.address,
        };

        self.send::<_, serde_json::Value>(Method::POST, "/register", Some(&body), Auth::None)
            .await?;
        Ok(())
    }

    /// Exchange an email + recovery code for a session.
    ///
    /// # Errors
    ///
    /// Returns an error if the code is wrong or the response has no session.
    #[instrument(skip(self, recovery_code), fields(email = %email))]
    pub async fn verify_account(
        &self,
        email: &Email,
        recovery_code: &str,
    ) -> Result<IssuedSession, ApiError> {
        let body = VerifyBody {
            email: email.as_str(),
            recovery_code,
        };

        let session: Envelope<RawSession> = self
            .send(Method::POST, "/account-verification", Some(&body), Auth::None)
            .await?;
        Ok(session.into_inner().into())
    }

    /// Log in with email and password.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are rejected. An unverified
    /// account surfaces as an `Http` error whose message says so.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<IssuedSession, ApiError> {
        let body = CredentialsBody {
            email: email.as_str(),
            password: password.expose_secret(),
        };

        let session: Envelope<RawSession> = self
            .send(Method::POST, "/login", Some(&body), Auth::None)
            .await?;
        Ok(session.into_inner().into())
    }

    /// Request a password recovery code by email.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the request.
    #[instrument(skip(self), fields(email = %email))]
    pub async fn forgot_password(&self, email: &Email) -> Result<(), ApiError> {
        let body = EmailBody {
            email: email.as_str(),
        };
        self.send::<_, serde_json::Value>(Method::POST, "/find-email", Some(&body), Auth::None)
            .await?;
        Ok(())
    }

    /// Set a new password using a recovery code.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the code or password.
    #[instrument(skip(self, form), fields(email = %form.email))]
    pub async fn reset_password(&self, form: &PasswordReset) -> Result<(), ApiError> {
        let body = ResetBody {
            email: form.email.as_str(),
            recovery_code: &form.recovery_code,
            password: form.password.expose_secret(),
            confirm_password: form.confirm_password.expose_secret(),
        };
        self.send::<_, serde_json::Value>(Method::PUT, "/update-password", Some(&body), Auth::None)
            .await?;
        Ok(())
    }

    /// Invalidate the current token on the server.
    ///
    /// # Errors
    ///
    /// Returns an error if no token is stored or the call fails.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), ApiError> {
        self.send::<(), serde_json::Value>(Method::POST, "/logout", None, Auth::Bearer)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_debug_redacts_passwords() {
        let form = Registration {
            name: "Ana".to_string(),
            mobile: "0123".to_string(),
            birth_date: NaiveDate::from_ymd_opt(1990, 5, 17).unwrap(),
            email: Email::parse("ana@example.com").unwrap(),
            password: SecretString::from("hunter2-super-secret"),
            password_confirmation: SecretString::from("hunter2-super-secret"),
            gender: "female".to_string(),
            address: "Main St".to_string(),
        };

        let debug = format!("{form:?}");
        assert!(debug.contains("ana@example.com"));
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_session_accepts_token_alias() {
        let raw: Envelope<RawSession> = serde_json::from_value(serde_json::json!({
            "data": {
                "user": {"id": 1, "name": "Ana", "email": "ana@example.com"},
                "token": "tok"
            }
        }))
        .unwrap();
        let session: IssuedSession = raw.into_inner().into();
        assert_eq!(session.token.expose_secret(), "tok");
        assert_eq!(session.user.name, "Ana");
    }
}
