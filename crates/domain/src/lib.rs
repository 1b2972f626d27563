//! Domain entities and invariants for the Keystone console.

#![forbid(unsafe_code)]

mod catalog;
mod identity;
mod rbac;
mod role_form;
mod user;

pub use catalog::{PermissionCatalog, RoleCatalog};
pub use identity::{Identity, IdentityPatch};
pub use rbac::{ConsolePermission, Permission, PermissionId, Role, RoleId};
pub use role_form::{
    CreateRoleInput, RoleDraft, RoleMetadataUpdate, normalize_exclusive_group, parse_priority,
};
pub use user::{EmailAddress, LoginCredentials, UserId, UserSummary, filter_users};
