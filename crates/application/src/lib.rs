//! Application services and ports.

#![forbid(unsafe_code)]

mod auth_session_service;
mod capability_set;
mod console_ports;
mod navigation_guard;
mod rbac_console_service;
mod role_assignment_editor;
mod role_permission_editor;
mod session_store;

#[cfg(test)]
mod test_support;

pub use auth_session_service::{AuthSessionService, DEFAULT_POST_LOGIN_PATH, SignedIn};
pub use capability_set::{CapabilitySet, CapabilityTracker};
pub use console_ports::{AuthGateway, IdentitySource, RbacGateway};
pub use navigation_guard::{
    GuardConfig, GuardOutcome, GuardState, NavigationGuard, Redirect, StaleFetchPolicy,
};
pub use rbac_console_service::RbacConsoleService;
pub use role_assignment_editor::{RoleAssignmentEditor, RoleToggle, UserRolesSubmission};
pub use role_permission_editor::{
    RoleMetadataEditor, RolePermissionEditor, RolePermissionsSubmission,
};
pub use session_store::{SessionState, SessionStore};
