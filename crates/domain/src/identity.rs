//! The authenticated user's profile as known to the client.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Role, UserId};

/// Current user profile with its roles and effective permission codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Stable user identifier.
    pub id: UserId,
    /// Login email.
    pub email: String,
    /// Optional display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Whether the account is active.
    pub is_active: bool,
    /// Account creation time.
    pub created_at: DateTime<Utc>,
    /// Last profile update time.
    pub updated_at: DateTime<Utc>,
    /// Assigned roles in server order.
    #[serde(default)]
    pub roles: Vec<Role>,
    /// Effective permission codes resolved by the server.
    #[serde(default)]
    pub permissions: BTreeSet<String>,
}

impl Identity {
    /// Returns a copy with every field present in `patch` overwritten.
    #[must_use]
    pub fn merged(&self, patch: &IdentityPatch) -> Self {
        let mut merged = self.clone();

        if let Some(email) = &patch.email {
            merged.email.clone_from(email);
        }
        if let Some(name) = &patch.name {
            merged.name.clone_from(name);
        }
        if let Some(is_active) = patch.is_active {
            merged.is_active = is_active;
        }
        if let Some(created_at) = patch.created_at {
            merged.created_at = created_at;
        }
        if let Some(updated_at) = patch.updated_at {
            merged.updated_at = updated_at;
        }
        if let Some(roles) = &patch.roles {
            merged.roles.clone_from(roles);
        }
        if let Some(permissions) = &patch.permissions {
            merged.permissions.clone_from(permissions);
        }

        merged
    }

    /// Returns the label shown in the console header.
    #[must_use]
    pub fn display_label(&self) -> &str {
        self.name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(self.email.as_str())
    }
}

/// Partial identity update; `None` leaves a field untouched.
///
/// `name: Some(None)` clears the display name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityPatch {
    /// Replacement email.
    pub email: Option<String>,
    /// Replacement display name.
    pub name: Option<Option<String>>,
    /// Replacement active flag.
    pub is_active: Option<bool>,
    /// Replacement creation time.
    pub created_at: Option<DateTime<Utc>>,
    /// Replacement update time.
    pub updated_at: Option<DateTime<Utc>>,
    /// Replacement role list.
    pub roles: Option<Vec<Role>>,
    /// Replacement permission codes.
    pub permissions: Option<BTreeSet<String>>,
}

impl IdentityPatch {
    /// Returns whether the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}
