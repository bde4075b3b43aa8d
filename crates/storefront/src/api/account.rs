//! Account endpoints: profile, password change and order history.

use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::instrument;

use agora_core::OrderId;

use super::types::{Envelope, Order, User};
use super::{ApiClient, ApiError, Auth};

/// Editable profile fields. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl ProfileUpdate {
    /// Returns true if no field would change.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.mobile.is_none()
            && self.birth_date.is_none()
            && self.gender.is_none()
            && self.address.is_none()
    }
}

/// Password change form for a signed-in user.
#[derive(Debug, Clone)]
pub struct PasswordChange {
    pub current_password: SecretString,
    pub password: SecretString,
    pub password_confirmation: SecretString,
}

#[derive(Serialize)]
struct PasswordChangeBody<'a> {
    current_password: &'a str,
    password: &'a str,
    password_confirmation: &'a str,
}

impl ApiClient {
    /// Fetch the signed-in user's profile.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::MissingCredentials` without a stored token, or an
    /// error if the API request fails.
    #[instrument(skip(self))]
    pub async fn profile(&self) -> Result<User, ApiError> {
        let user: Envelope<User> = self.get("/profile", &[], Auth::Bearer).await?;
        Ok(user.into_inner())
    }

    /// Update profile fields.
    ///
    /// Returns the updated profile when the server echoes it back.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the update.
    #[instrument(skip(self))]
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<Option<User>, ApiError> {
        let response: serde_json::Value = self
            .send(Method::PUT, "/edit-profile", Some(update), Auth::Bearer)
            .await?;

        // Echoed profile is optional; anything unrecognised just means "no echo"
        Ok(serde_json::from_value::<Envelope<EchoedUser>>(response)
            .ok()
            .and_then(|echo| echo.into_inner().user))
    }

    /// Change the password of the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns an error if the current password is wrong or the new one is rejected.
    #[instrument(skip(self, form))]
    pub async fn change_password(&self, form: &PasswordChange) -> Result<(), ApiError> {
        let body = PasswordChangeBody {
            current_password: form.current_password.expose_secret(),
            password: form.password.expose_secret(),
            password_confirmation: form.password_confirmation.expose_secret(),
        };
        self.send::<_, serde_json::Value>(Method::PUT, "/change-password", Some(&body), Auth::Bearer)
            .await?;
        Ok(())
    }

    /// List the signed-in user's orders.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn orders(&self) -> Result<Vec<Order>, ApiError> {
        let orders: Envelope<Vec<Order>> = self.get("/user/orders", &[], Auth::Bearer).await?;
        Ok(orders.into_inner())
    }

    /// Fetch one order.
    ///
    /// # Errors
    ///
    /// Returns an error if the order does not exist or the request fails.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn order(&self, id: OrderId) -> Result<Order, ApiError> {
        let order: Envelope<Order> = self
            .get(&format!("/user/orders/{id}"), &[], Auth::Bearer)
            .await?;
        Ok(order.into_inner())
    }
}

/// `{"user": {...}}` or a bare profile.
#[derive(serde::Deserialize)]
#[serde(untagged)]
enum EchoedUserShape {
    Keyed { user: User },
    Bare(User),
}

#[derive(serde::Deserialize)]
#[serde(from = "EchoedUserShape")]
struct EchoedUser {
    user: Option<User>,
}

impl From<EchoedUserShape> for EchoedUser {
    fn from(shape: EchoedUserShape) -> Self {
        match shape {
            EchoedUserShape::Keyed { user } | EchoedUserShape::Bare(user) => Self { user: Some(user) },
        }
    }
}
