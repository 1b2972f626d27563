//! User domain types used by the console.

use keystone_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::Role;

/// Unique identifier for a user record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    /// Creates a user identifier from the server-assigned value.
    #[must_use]
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the underlying numeric value.
    #[must_use]
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Validated email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Creates a validated email address.
    ///
    /// Performs basic structural validation: non-empty, contains exactly one `@`,
    /// local part and domain are non-empty, domain contains at least one `.`.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim().to_lowercase();

        if trimmed.is_empty() {
            return Err(AppError::Validation(
                "email address must not be empty".to_owned(),
            ));
        }

        let Some((local, domain)) = trimmed.split_once('@') else {
            return Err(AppError::Validation(
                "email address must contain exactly one '@'".to_owned(),
            ));
        };

        if domain.contains('@') {
            return Err(AppError::Validation(
                "email address must contain exactly one '@'".to_owned(),
            ));
        }

        if local.is_empty() {
            return Err(AppError::Validation(
                "email local part must not be empty".to_owned(),
            ));
        }

        if domain.is_empty() || !domain.contains('.') {
            return Err(AppError::Validation(
                "email domain must contain at least one '.'".to_owned(),
            ));
        }

        Ok(Self(trimmed))
    }

    /// Returns the validated email string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

/// Email/password pair submitted to the login endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: EmailAddress,
    password: String,
}

impl LoginCredentials {
    /// Validates the login form before anything is sent.
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> AppResult<Self> {
        let email = EmailAddress::new(email)?;
        let password = password.into();
        if password.is_empty() {
            return Err(AppError::Validation("password must not be empty".to_owned()));
        }

        Ok(Self { email, password })
    }

    /// Returns the normalized email.
    #[must_use]
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Returns the plaintext password.
    #[must_use]
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// User row listed in the role assignment view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    /// Stable user identifier.
    pub id: UserId,
    /// Login email.
    pub email: String,
    /// Optional display name.
    pub name: Option<String>,
    /// Whether the account is active.
    pub is_active: bool,
    /// Roles currently assigned on the server.
    #[serde(default)]
    pub roles: Vec<Role>,
}

impl UserSummary {
    /// Returns the names of the committed roles, in server order.
    #[must_use]
    pub fn role_names(&self) -> Vec<String> {
        self.roles.iter().map(|role| role.name.clone()).collect()
    }

    /// Returns whether the user matches a case-insensitive search on email or name.
    ///
    /// A blank query matches every user.
    #[must_use]
    pub fn matches_search(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }

        self.email.to_lowercase().contains(query.as_str())
            || self
                .name
                .as_deref()
                .is_some_and(|name| name.to_lowercase().contains(query.as_str()))
    }
}

/// Filters users for the assignment list, preserving the input order.
#[must_use]
pub fn filter_users<'a>(users: &'a [UserSummary], query: &str) -> Vec<&'a UserSummary> {
    users.iter().filter(|user| user.matches_search(query)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: i64, email: &str, name: Option<&str>) -> UserSummary {
        UserSummary {
            id: UserId::new(id),
            email: email.to_owned(),
            name: name.map(str::to_owned),
            is_active: true,
            roles: Vec::new(),
        }
    }

    #[test]
    fn valid_email_is_accepted() {
        let email = EmailAddress::new("USER@Example.COM");
        assert!(email.is_ok());
        assert_eq!(
            email.unwrap_or_else(|_| panic!("test")).as_str(),
            "user@example.com"
        );
    }

    #[test]
    fn email_without_at_is_rejected() {
        assert!(EmailAddress::new("noatsign").is_err());
    }

    #[test]
    fn email_with_two_at_signs_is_rejected() {
        assert!(EmailAddress::new("a@b@example.com").is_err());
    }

    #[test]
    fn email_without_domain_dot_is_rejected() {
        assert!(EmailAddress::new("user@nodot").is_err());
    }

    #[test]
    fn login_credentials_require_password() {
        let result = LoginCredentials::new("a@example.com", "");
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn search_matches_email_or_name_case_insensitively() {
        let alice = user(1, "alice@example.com", Some("Alice Liddell"));
        assert!(alice.matches_search("ALICE@"));
        assert!(alice.matches_search(" liddell "));
        assert!(!alice.matches_search("bob"));
    }

    #[test]
    fn blank_search_keeps_every_user() {
        let users = vec![
            user(1, "alice@example.com", None),
            user(2, "bob@example.com", Some("Bob")),
        ];

        assert_eq!(filter_users(&users, "   ").len(), 2);
        let filtered = filter_users(&users, "bob");
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, UserId::new(2));
    }
}
