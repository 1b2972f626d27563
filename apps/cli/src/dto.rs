use keystone_application::{GuardOutcome, GuardState, Redirect, RoleToggle};
use keystone_domain::{Identity, Permission, Role, UserSummary};
use serde::Serialize;
use ts_rs::TS;

/// Current user as printed by `whoami` and consumed by the web console.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/identity-response.ts"
)]
pub struct IdentityResponse {
    pub id: i64,
    pub email: String,
    pub name: Option<String>,
    pub display_label: String,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
    pub roles: Vec<String>,
    pub permissions: Vec<String>,
}

impl From<&Identity> for IdentityResponse {
    fn from(identity: &Identity) -> Self {
        Self {
            id: identity.id.as_i64(),
            email: identity.email.clone(),
            name: identity.name.clone(),
            display_label: identity.display_label().to_owned(),
            is_active: identity.is_active,
            created_at: identity.created_at.to_rfc3339(),
            updated_at: identity.updated_at.to_rfc3339(),
            roles: identity.roles.iter().map(|role| role.name.clone()).collect(),
            permissions: identity.permissions.iter().cloned().collect(),
        }
    }
}

/// Outcome of a guard check.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/guard-response.ts"
)]
pub struct GuardResponse {
    #[ts(
        type = "\"unchecked\" | \"checking\" | \"authorized\" | \"unauthenticated\" | \"forbidden\""
    )]
    pub state: GuardState,
    pub proceed: bool,
    pub user_email: Option<String>,
    #[ts(
        type = "{ kind: \"login\", to: string, redirect: string } | { kind: \"forbidden\", to: string, missing: string, from: string } | null"
    )]
    pub redirect: Option<Redirect>,
    pub redirect_href: Option<String>,
}

impl GuardResponse {
    pub fn new(outcome: &GuardOutcome, state: GuardState) -> Self {
        match outcome {
            GuardOutcome::Proceed(identity) => Self {
                state,
                proceed: true,
                user_email: Some(identity.email.clone()),
                redirect: None,
                redirect_href: None,
            },
            GuardOutcome::Redirect(redirect) => Self {
                state,
                proceed: false,
                user_email: None,
                redirect_href: Some(redirect.href()),
                redirect: Some(redirect.clone()),
            },
        }
    }
}

/// Permission catalog entry.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/permission-response.ts"
)]
pub struct PermissionResponse {
    pub id: i64,
    pub code: String,
    pub description: Option<String>,
}

impl From<&Permission> for PermissionResponse {
    fn from(permission: &Permission) -> Self {
        Self {
            id: permission.id.as_i64(),
            code: permission.code.clone(),
            description: permission.description.clone(),
        }
    }
}

/// Role catalog entry.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/role-response.ts"
)]
pub struct RoleResponse {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub exclusive_group: Option<String>,
    pub priority: i32,
    pub is_system: bool,
    pub permission_codes: Vec<String>,
}

impl From<&Role> for RoleResponse {
    fn from(role: &Role) -> Self {
        Self {
            id: role.id.as_i64(),
            name: role.name.clone(),
            description: role.description.clone(),
            exclusive_group: role.group().map(str::to_owned),
            priority: role.priority,
            is_system: role.is_system,
            permission_codes: role.permission_codes(),
        }
    }
}

/// Roles and permissions listed by `roles`.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/rbac-catalog-response.ts"
)]
pub struct RbacCatalogResponse {
    pub roles: Vec<RoleResponse>,
    pub permissions: Vec<PermissionResponse>,
}

/// User row listed by `users`.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/user-response.ts"
)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub name: Option<String>,
    pub is_active: bool,
    pub roles: Vec<String>,
}

impl From<&UserSummary> for UserResponse {
    fn from(user: &UserSummary) -> Self {
        Self {
            id: user.id.as_i64(),
            email: user.email.clone(),
            name: user.name.clone(),
            is_active: user.is_active,
            roles: user.role_names(),
        }
    }
}

/// One role toggled by `assign`.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/role-toggle-response.ts"
)]
pub struct RoleToggleResponse {
    pub role: String,
    pub added: bool,
    pub displaced: Vec<String>,
}

impl RoleToggleResponse {
    pub fn new(role: &str, toggle: RoleToggle) -> Self {
        match toggle {
            RoleToggle::Removed => Self {
                role: role.to_owned(),
                added: false,
                displaced: Vec::new(),
            },
            RoleToggle::Added { displaced } => Self {
                role: role.to_owned(),
                added: true,
                displaced,
            },
        }
    }
}

/// Result of saving a user's roles.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/assignment-response.ts"
)]
pub struct AssignmentResponse {
    pub user: UserResponse,
    pub toggles: Vec<RoleToggleResponse>,
}
