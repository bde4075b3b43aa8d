//! Classification of server-reported business errors.
//!
//! The backend reports conditions like "account not verified yet" or
//! "product already in favorites" only as free text. This module is the one
//! place that turns that text into an [`ErrorKind`]; the marker substrings
//! are configuration, not fixed law.

use super::ApiError;

/// Default markers meaning "the account still needs a verification code".
pub const DEFAULT_VERIFICATION_MARKERS: &[&str] = &["verification", "confirmation code"];

/// Default markers meaning "the product is already a favorite".
pub const DEFAULT_ALREADY_FAVORITED_MARKERS: &[&str] =
    &["already in favorites", "already in your favorites", "already favorited"];

/// Structured meaning of an API failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Login refused because the account is not verified.
    NeedsVerification,
    /// The product was already in the favorite set.
    AlreadyFavorited,
    /// Anything else.
    Other,
}

/// Matches server error messages against configurable markers.
#[derive(Debug, Clone)]
pub struct ErrorClassifier {
    verification_markers: Vec<String>,
    already_favorited_markers: Vec<String>,
}

impl Default for ErrorClassifier {
    fn default() -> Self {
        Self::new(
            DEFAULT_VERIFICATION_MARKERS.iter().copied(),
            DEFAULT_ALREADY_FAVORITED_MARKERS.iter().copied(),
        )
    }
}

impl ErrorClassifier {
    /// Create a classifier from marker substrings (matched case-insensitively).
    pub fn new<V, F>(verification: V, already_favorited: F) -> Self
    where
        V: IntoIterator,
        V::Item: AsRef<str>,
        F: IntoIterator,
        F::Item: AsRef<str>,
    {
        Self {
            verification_markers: normalize(verification),
            already_favorited_markers: normalize(already_favorited),
        }
    }

    /// Classify an error. Only server-reported (`Http`) errors carry business meaning.
    #[must_use]
    pub fn classify(&self, error: &ApiError) -> ErrorKind {
        match error {
            ApiError::Http { message, .. } => self.classify_message(message),
            _ => ErrorKind::Other,
        }
    }

    /// Classify a raw server message.
    #[must_use]
    pub fn classify_message(&self, message: &str) -> ErrorKind {
        let message = message.to_lowercase();
        let matches = |markers: &[String]| markers.iter().any(|m| message.contains(m.as_str()));

        if matches(&self.verification_markers) {
            ErrorKind::NeedsVerification
        } else if matches(&self.already_favorited_markers) {
            ErrorKind::AlreadyFavorited
        } else {
            ErrorKind::Other
        }
    }
}

fn normalize<I>(markers: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    markers
        .into_iter()
        .map(|m| m.as_ref().trim().to_lowercase())
        .filter(|m| !m.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http(message: &str) -> ApiError {
        ApiError::Http {
            status: 403,
            message: message.to_string(),
        }
    }

    #[test]
    fn test_default_markers() {
        let classifier = ErrorClassifier::default();
        assert_eq!(
            classifier.classify(&http("Your account requires Verification")),
            ErrorKind::NeedsVerification
        );
        assert_eq!(
            classifier.classify(&http("Please enter the confirmation code sent to you")),
            ErrorKind::NeedsVerification
        );
        assert_eq!(
            classifier.classify(&http("Product already in favorites")),
            ErrorKind::AlreadyFavorited
        );
        assert_eq!(
            classifier.classify(&http("Invalid credentials")),
            ErrorKind::Other
        );
    }

    #[test]
    fn test_non_http_errors_are_other() {
        let classifier = ErrorClassifier::default();
        assert_eq!(
            classifier.classify(&ApiError::MissingCredentials),
            ErrorKind::Other
        );
        assert_eq!(
            classifier.classify(&ApiError::InvalidResponse("verification".into())),
            ErrorKind::Other
        );
    }

    #[test]
    fn test_custom_markers() {
        let classifier = ErrorClassifier::new(["  NOT ACTIVATED "], Vec::<String>::new());
        assert_eq!(
            classifier.classify_message("account not activated"),
            ErrorKind::NeedsVerification
        );
        assert_eq!(
            classifier.classify_message("verification required"),
            ErrorKind::Other
        );
        assert_eq!(
            classifier.classify_message("already in favorites"),
            ErrorKind::Other
        );
    }
}
