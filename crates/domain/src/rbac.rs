use std::str::FromStr;

use keystone_core::AppError;
use serde::{Deserialize, Serialize};

/// Unique identifier for a role record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleId(i64);

impl RoleId {
    /// Creates a role identifier from the server-assigned value.
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

impl std::fmt::Display for RoleId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Unique identifier for a permission record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionId(i64);

impl PermissionId {
    /// Creates a permission identifier from the server-assigned value.
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

/// Permission codes the console itself gates on.
///
/// The server may define additional codes; those are carried as plain strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConsolePermission {
    /// Allows reading roles and permissions.
    #[serde(rename = "rbac:read")]
    RbacRead,
    /// Allows mutating roles, grants and assignments.
    #[serde(rename = "rbac:write")]
    RbacWrite,
    /// Allows listing users.
    #[serde(rename = "users:read")]
    UsersRead,
    /// Allows mutating users.
    #[serde(rename = "users:write")]
    UsersWrite,
}

impl ConsolePermission {
    /// Returns the stable permission code.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RbacRead => "rbac:read",
            Self::RbacWrite => "rbac:write",
            Self::UsersRead => "users:read",
            Self::UsersWrite => "users:write",
        }
    }

    /// Returns all permissions the console knows about.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[ConsolePermission] = &[
            ConsolePermission::RbacRead,
            ConsolePermission::RbacWrite,
            ConsolePermission::UsersRead,
            ConsolePermission::UsersWrite,
        ];

        ALL
    }
}

impl FromStr for ConsolePermission {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "rbac:read" => Ok(Self::RbacRead),
            "rbac:write" => Ok(Self::RbacWrite),
            "users:read" => Ok(Self::UsersRead),
            "users:write" => Ok(Self::UsersWrite),
            _ => Err(AppError::Validation(format!(
                "unknown console permission '{value}'"
            ))),
        }
    }
}

impl std::fmt::Display for ConsolePermission {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Permission catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    /// Stable permission identifier.
    pub id: PermissionId,
    /// Unique permission code such as `rbac:write`.
    pub code: String,
    /// Optional human-readable description.
    #[serde(default)]
    pub description: Option<String>,
}

/// Role catalog entry as served by the console API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Stable role identifier.
    pub id: RoleId,
    /// Unique role name.
    pub name: String,
    /// Optional human-readable description.
    #[serde(default)]
    pub description: Option<String>,
    /// Group of mutually exclusive roles, if any.
    #[serde(default)]
    pub exclusive_group: Option<String>,
    /// Display precedence; higher wins when presenting conflicts.
    #[serde(default)]
    pub priority: i32,
    /// System roles are server-managed and read-only here.
    #[serde(default)]
    pub is_system: bool,
    /// Grants attached to the role.
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

impl Role {
    /// Returns the exclusive group with blank values treated as absent.
    ///
    /// The stored value is compared trimmed: `" account"` and `"account"` are the same
    /// group, and a whitespace-only value is no group at all. Forms already normalize
    /// groups this way before they reach the server.
    #[must_use]
    pub fn group(&self) -> Option<&str> {
        self.exclusive_group
            .as_deref()
            .map(str::trim)
            .filter(|group| !group.is_empty())
    }

    /// Returns the codes granted by this role.
    #[must_use]
    pub fn permission_codes(&self) -> Vec<String> {
        self.permissions
            .iter()
            .map(|permission| permission.code.clone())
            .collect()
    }
}
