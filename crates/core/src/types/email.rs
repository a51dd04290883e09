//! Email address type.

use core::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::id::UserId;

/// Errors that can occur when parsing an [`Email`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    /// The input is empty after trimming.
    #[error("email cannot be empty")]
    Empty,
    /// The input is too long.
    #[error("email must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input is not of the form `local@domain`.
    #[error("email must have the form local@domain")]
    Malformed,
}

/// A normalized email address.
///
/// Parsing trims surrounding whitespace and lowercases the address, so two
/// spellings of the same mailbox compare equal and map to the same
/// [`UserId`].
///
/// ## Examples
///
/// ```
/// use keycraft_core::Email;
///
/// let email = Email::parse("  Admin@Example.com ").unwrap();
/// assert_eq!(email.as_str(), "admin@example.com");
///
/// assert!(Email::parse("").is_err());
/// assert!(Email::parse("no-at-symbol").is_err());
/// assert!(Email::parse("@domain.com").is_err());
/// assert!(Email::parse("user@").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Maximum length of an email address (RFC 5321).
    pub const MAX_LENGTH: usize = 254;

    /// Parse and normalize an `Email`.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty, longer than 254
    /// characters, or does not have exactly one `@` with text on both sides.
    pub fn parse(s: &str) -> Result<Self, EmailError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(EmailError::Empty);
        }
        if trimmed.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        match trimmed.split_once('@') {
            Some((local, domain))
                if !local.is_empty() && !domain.is_empty() && !domain.contains('@') =>
            {
                Ok(Self(trimmed.to_lowercase()))
            }
            _ => Err(EmailError::Malformed),
        }
    }

    /// Returns the email address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Stable user identifier derived from this address.
    ///
    /// Uses a name-based (v5) UUID so the same address always maps to the
    /// same remote rows.
    #[must_use]
    pub fn user_id(&self) -> UserId {
        UserId::new(Uuid::new_v5(&Uuid::NAMESPACE_URL, self.0.as_bytes()))
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Email {
    type Err = EmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Email {
    type Error = EmailError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normalizes() {
        let email = Email::parse(" User@Example.COM ").unwrap();
        assert_eq!(email.as_str(), "user@example.com");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!(Email::parse("   "), Err(EmailError::Empty));
        assert_eq!(Email::parse("a@b@c"), Err(EmailError::Malformed));
        assert_eq!(Email::parse("@b"), Err(EmailError::Malformed));
        assert_eq!(Email::parse("a@"), Err(EmailError::Malformed));
        let long = format!("{}@example.com", "a".repeat(250));
        assert!(matches!(Email::parse(&long), Err(EmailError::TooLong { .. })));
    }

    #[test]
    fn test_user_id_is_stable_across_spellings() {
        let a = Email::parse("shopper@example.com").unwrap();
        let b = Email::parse("Shopper@Example.com").unwrap();
        let c = Email::parse("other@example.com").unwrap();
        assert_eq!(a.user_id(), b.user_id());
        assert_ne!(a.user_id(), c.user_id());
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: Result<Email, _> = serde_json::from_str("\"a@b.c\"");
        let bad: Result<Email, _> = serde_json::from_str("\"not-an-email\"");
        assert!(ok.is_ok());
        assert!(bad.is_err());
    }
}
