use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use keystone_application::{AuthGateway, IdentitySource, RbacGateway};
use keystone_core::{AppError, AppResult};
use keystone_domain::{
    ConsolePermission, CreateRoleInput, EmailAddress, Identity, LoginCredentials, Permission,
    PermissionId, Role, RoleCatalog, RoleId, RoleMetadataUpdate, UserId, UserSummary,
};
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct StoredUser {
    email: EmailAddress,
    password: String,
    name: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    role_ids: Vec<RoleId>,
}

#[derive(Debug, Default)]
struct ConsoleState {
    permissions: Vec<Permission>,
    roles: BTreeMap<RoleId, Role>,
    users: BTreeMap<UserId, StoredUser>,
    signed_in: Option<UserId>,
    next_role_id: i64,
    next_user_id: i64,
}

impl ConsoleState {
    fn role_named(&self, name: &str) -> Option<&Role> {
        self.roles.values().find(|role| role.name == name)
    }

    fn catalog(&self) -> AppResult<RoleCatalog> {
        RoleCatalog::new(self.roles.values().cloned().collect())
    }

    fn user_roles(&self, user: &StoredUser) -> Vec<Role> {
        user.role_ids
            .iter()
            .filter_map(|role_id| self.roles.get(role_id))
            .cloned()
            .collect()
    }

    fn summary(&self, user_id: UserId, user: &StoredUser) -> UserSummary {
        UserSummary {
            id: user_id,
            email: user.email.as_str().to_owned(),
            name: user.name.clone(),
            is_active: user.is_active,
            roles: self.user_roles(user),
        }
    }

    fn identity(&self, user_id: UserId, user: &StoredUser) -> Identity {
        let roles = self.user_roles(user);
        let permissions: BTreeSet<String> = roles
            .iter()
            .flat_map(|role| role.permissions.iter())
            .map(|permission| permission.code.clone())
            .collect();

        Identity {
            id: user_id,
            email: user.email.as_str().to_owned(),
            name: user.name.clone(),
            is_active: user.is_active,
            created_at: user.created_at,
            updated_at: user.created_at,
            roles,
            permissions,
        }
    }

    fn role_mut(&mut self, role_id: RoleId) -> AppResult<&mut Role> {
        self.roles
            .get_mut(&role_id)
            .ok_or_else(|| AppError::NotFound(format!("role {role_id} does not exist")))
    }
}

/// In-process console backend holding roles, permissions and accounts.
///
/// Mirrors the server's validation rules but performs no authorization checks.
#[derive(Debug, Default)]
pub struct InMemoryRbacGateway {
    state: RwLock<ConsoleState>,
}

impl InMemoryRbacGateway {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend seeded with the console permissions and the system `admin` and
    /// `user` roles.
    #[must_use]
    pub fn with_defaults() -> Self {
        let permissions: Vec<Permission> = ConsolePermission::all()
            .iter()
            .zip(1_i64..)
            .map(|(permission, id)| Permission {
                id: PermissionId::new(id),
                code: permission.as_str().to_owned(),
                description: None,
            })
            .collect();

        let admin = Role {
            id: RoleId::new(1),
            name: "admin".to_owned(),
            description: Some("Administrator".to_owned()),
            exclusive_group: None,
            priority: 100,
            is_system: true,
            permissions: permissions.clone(),
        };
        let user = Role {
            id: RoleId::new(2),
            name: "user".to_owned(),
            description: Some("Default user".to_owned()),
            exclusive_group: None,
            priority: 0,
            is_system: true,
            permissions: Vec::new(),
        };

        Self {
            state: RwLock::new(ConsoleState {
                permissions,
                roles: BTreeMap::from([(admin.id, admin), (user.id, user)]),
                next_role_id: 2,
                ..ConsoleState::default()
            }),
        }
    }

    /// Registers an account holding the named roles.
    pub async fn add_user(
        &self,
        email: &str,
        password: &str,
        name: Option<&str>,
        role_names: &[&str],
    ) -> AppResult<UserId> {
        let email = EmailAddress::new(email)?;
        let mut state = self.state.write().await;

        if state.users.values().any(|user| user.email == email) {
            return Err(AppError::Conflict(format!(
                "account '{}' already exists",
                email.as_str()
            )));
        }

        let role_ids = role_names
            .iter()
            .map(|role_name| {
                state
                    .role_named(role_name)
                    .map(|role| role.id)
                    .ok_or_else(|| AppError::Validation(format!("unknown role '{role_name}'")))
            })
            .collect::<AppResult<Vec<_>>>()?;

        state.next_user_id += 1;
        let user_id = UserId::new(state.next_user_id);
        state.users.insert(
            user_id,
            StoredUser {
                email,
                password: password.to_owned(),
                name: name.map(str::to_owned),
                is_active: true,
                created_at: Utc::now(),
                role_ids,
            },
        );

        Ok(user_id)
    }
}

#[async_trait]
impl IdentitySource for InMemoryRbacGateway {
    async fn fetch_current_identity(&self) -> AppResult<Identity> {
        let state = self.state.read().await;
        let user_id = state
            .signed_in
            .ok_or_else(|| AppError::Unauthorized("not authenticated".to_owned()))?;
        let user = state
            .users
            .get(&user_id)
            .ok_or_else(|| AppError::Unauthorized("session user no longer exists".to_owned()))?;

        Ok(state.identity(user_id, user))
    }
}

#[async_trait]
impl AuthGateway for InMemoryRbacGateway {
    async fn login(&self, credentials: &LoginCredentials) -> AppResult<()> {
        let mut state = self.state.write().await;
        let user_id = state
            .users
            .iter()
            .find(|(_, user)| {
                user.is_active
                    && &user.email == credentials.email()
                    && user.password == credentials.password()
            })
            .map(|(user_id, _)| *user_id)
            .ok_or_else(|| AppError::Unauthorized("Incorrect email or password".to_owned()))?;

        state.signed_in = Some(user_id);
        Ok(())
    }

    async fn logout(&self) -> AppResult<()> {
        self.state.write().await.signed_in = None;
        Ok(())
    }
}

#[async_trait]
impl RbacGateway for InMemoryRbacGateway {
    async fn list_roles(&self) -> AppResult<Vec<Role>> {
        Ok(self.state.read().await.roles.values().cloned().collect())
    }

    async fn list_permissions(&self) -> AppResult<Vec<Permission>> {
        Ok(self.state.read().await.permissions.clone())
    }

    async fn list_users(&self) -> AppResult<Vec<UserSummary>> {
        let state = self.state.read().await;
        Ok(state
            .users
            .iter()
            .map(|(user_id, user)| state.summary(*user_id, user))
            .collect())
    }

    async fn create_role(&self, input: CreateRoleInput) -> AppResult<Role> {
        let mut state = self.state.write().await;
        if state.role_named(input.name.as_str()).is_some() {
            return Err(AppError::Conflict(format!(
                "role '{}' already exists",
                input.name
            )));
        }

        state.next_role_id += 1;
        let role = Role {
            id: RoleId::new(state.next_role_id),
            name: input.name.into(),
            description: input.description,
            exclusive_group: input.exclusive_group,
            priority: input.priority,
            is_system: false,
            permissions: Vec::new(),
        };
        state.roles.insert(role.id, role.clone());

        Ok(role)
    }

    async fn update_role_metadata(
        &self,
        role_id: RoleId,
        update: RoleMetadataUpdate,
    ) -> AppResult<Role> {
        let mut state = self.state.write().await;
        let role = state.role_mut(role_id)?;
        if role.is_system {
            return Err(AppError::Validation(format!(
                "system role '{}' cannot be modified",
                role.name
            )));
        }

        role.exclusive_group = update.exclusive_group;
        role.priority = update.priority;
        Ok(role.clone())
    }

    async fn delete_role(&self, role_id: RoleId) -> AppResult<()> {
        let mut state = self.state.write().await;
        let role = state.role_mut(role_id)?;
        if role.is_system {
            return Err(AppError::Validation(format!(
                "system role '{}' cannot be deleted",
                role.name
            )));
        }

        state.roles.remove(&role_id);
        for user in state.users.values_mut() {
            user.role_ids.retain(|assigned| *assigned != role_id);
        }
        Ok(())
    }

    async fn set_role_permissions(
        &self,
        role_id: RoleId,
        permission_codes: Vec<String>,
    ) -> AppResult<Role> {
        let mut state = self.state.write().await;
        let mut granted = Vec::with_capacity(permission_codes.len());
        for code in &permission_codes {
            let permission = state
                .permissions
                .iter()
                .find(|permission| &permission.code == code)
                .ok_or_else(|| AppError::Validation(format!("unknown permission '{code}'")))?;
            if !granted.contains(permission) {
                granted.push(permission.clone());
            }
        }

        let role = state.role_mut(role_id)?;
        role.permissions = granted;
        Ok(role.clone())
    }

    async fn set_user_roles(
        &self,
        user_id: UserId,
        role_names: Vec<String>,
    ) -> AppResult<UserSummary> {
        let mut state = self.state.write().await;
        state
            .catalog()?
            .validate_assignment(role_names.iter().map(String::as_str))?;

        let mut role_ids = Vec::with_capacity(role_names.len());
        for role_name in &role_names {
            let role = state
                .role_named(role_name)
                .ok_or_else(|| AppError::Validation(format!("unknown role '{role_name}'")))?;
            if !role_ids.contains(&role.id) {
                role_ids.push(role.id);
            }
        }

        let user = state
            .users
            .get_mut(&user_id)
            .ok_or_else(|| AppError::NotFound(format!("user {user_id} does not exist")))?;
        user.role_ids = role_ids;

        let user = user.clone();
        Ok(state.summary(user_id, &user))
    }
}

#[cfg(test)]
mod tests;
