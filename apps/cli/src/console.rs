use std::sync::Arc;

use keystone_application::{
    AuthGateway, AuthSessionService, GuardConfig, IdentitySource, NavigationGuard,
    RbacConsoleService, RbacGateway, RoleAssignmentEditor, SessionStore,
};
use keystone_core::{AppError, AppResult};
use keystone_domain::{LoginCredentials, UserId, filter_users};
use serde_json::{Value, json};
use tracing::info;

use crate::cli_config::SignInConfig;
use crate::command::Command;
use crate::dto::{
    AssignmentResponse, GuardResponse, IdentityResponse, PermissionResponse, RbacCatalogResponse,
    RoleResponse, RoleToggleResponse, UserResponse,
};

/// Services of one console session wired around a single backend.
pub struct Console {
    session: SessionStore,
    auth: AuthSessionService,
    guard: NavigationGuard,
    rbac: RbacConsoleService,
}

impl Console {
    pub fn new<G>(gateway: Arc<G>, guard_config: GuardConfig) -> Self
    where
        G: IdentitySource + AuthGateway + RbacGateway + 'static,
    {
        let session = SessionStore::new();
        let identity_source: Arc<dyn IdentitySource> = gateway.clone();
        let auth_gateway: Arc<dyn AuthGateway> = gateway.clone();
        let rbac_gateway: Arc<dyn RbacGateway> = gateway;

        Self {
            auth: AuthSessionService::new(auth_gateway, identity_source.clone(), session.clone()),
            guard: NavigationGuard::with_config(session.clone(), identity_source, guard_config),
            rbac: RbacConsoleService::new(rbac_gateway, session.clone()),
            session,
        }
    }

    /// Signs in with configured credentials, or restores an existing server session.
    pub async fn start(&self, sign_in: Option<&SignInConfig>) -> AppResult<()> {
        match sign_in {
            Some(config) => {
                let credentials =
                    LoginCredentials::new(config.email.as_str(), config.password.as_str())?;
                self.auth.sign_in(&credentials, None).await?;
            }
            None => {
                if self.auth.restore_session().await.is_none() {
                    info!("no server session; continuing unauthenticated");
                }
            }
        }

        Ok(())
    }

    pub async fn run(&self, command: Command) -> AppResult<Value> {
        match command {
            Command::WhoAmI => {
                let identity = self
                    .session
                    .current_user()
                    .ok_or_else(|| AppError::Unauthorized("not signed in".to_owned()))?;
                to_json(&IdentityResponse::from(identity.as_ref()))
            }
            Command::Guard {
                location,
                permission,
            } => {
                let outcome = match permission {
                    Some(code) => {
                        self.guard
                            .require_permission(code.as_str(), location.as_str())
                            .await
                    }
                    None => self.guard.require_auth(location.as_str()).await,
                };
                to_json(&GuardResponse::new(&outcome, self.guard.state()))
            }
            Command::Roles => {
                let roles = self.rbac.load_roles().await?;
                let permissions = self.rbac.load_permissions().await?;
                to_json(&RbacCatalogResponse {
                    roles: roles.roles().iter().map(RoleResponse::from).collect(),
                    permissions: permissions
                        .permissions()
                        .iter()
                        .map(PermissionResponse::from)
                        .collect(),
                })
            }
            Command::Users { query } => {
                let users = self.rbac.load_users().await?;
                let query = query.unwrap_or_default();
                let listed: Vec<UserResponse> = filter_users(users.as_slice(), query.as_str())
                    .into_iter()
                    .map(UserResponse::from)
                    .collect();
                to_json(&listed)
            }
            Command::Assign {
                user_id,
                role_names,
            } => {
                let user_id = UserId::new(user_id);
                let catalog = self.rbac.load_roles().await?;
                let users = self.rbac.load_users().await?;
                let user = users
                    .iter()
                    .find(|user| user.id == user_id)
                    .ok_or_else(|| AppError::NotFound(format!("user {user_id} does not exist")))?;

                let mut editor = RoleAssignmentEditor::new();
                editor.select(user.id, user.role_names());
                let toggles: Vec<RoleToggleResponse> = role_names
                    .iter()
                    .map(|role_name| {
                        let toggle = editor.toggle(role_name.as_str(), &catalog);
                        RoleToggleResponse::new(role_name.as_str(), toggle)
                    })
                    .collect();

                let saved = self.rbac.save_user_roles(&mut editor, &catalog).await?;

                to_json(&AssignmentResponse {
                    user: UserResponse::from(&saved),
                    toggles,
                })
            }
            Command::Logout => {
                self.auth.sign_out().await?;
                Ok(json!({ "signed_out": true }))
            }
        }
    }
}

fn to_json<T>(value: &T) -> AppResult<Value>
where
    T: serde::Serialize,
{
    serde_json::to_value(value)
        .map_err(|error| AppError::Internal(format!("failed to encode command output: {error}")))
}
