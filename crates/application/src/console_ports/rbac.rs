use async_trait::async_trait;

use keystone_core::AppResult;
use keystone_domain::{
    CreateRoleInput, Permission, Role, RoleId, RoleMetadataUpdate, UserId, UserSummary,
};

/// Port for the role, permission and assignment endpoints.
///
/// The server stays authoritative; every call here is re-checked on its side.
#[async_trait]
pub trait RbacGateway: Send + Sync {
    /// Lists the role catalog with grants.
    async fn list_roles(&self) -> AppResult<Vec<Role>>;

    /// Lists the permission catalog.
    async fn list_permissions(&self) -> AppResult<Vec<Permission>>;

    /// Lists users with their committed roles.
    async fn list_users(&self) -> AppResult<Vec<UserSummary>>;

    /// Creates a role.
    async fn create_role(&self, input: CreateRoleInput) -> AppResult<Role>;

    /// Updates the exclusive group and priority of a role.
    async fn update_role_metadata(
        &self,
        role_id: RoleId,
        update: RoleMetadataUpdate,
    ) -> AppResult<Role>;

    /// Deletes a role.
    async fn delete_role(&self, role_id: RoleId) -> AppResult<()>;

    /// Replaces the permission codes granted to a role.
    async fn set_role_permissions(
        &self,
        role_id: RoleId,
        permission_codes: Vec<String>,
    ) -> AppResult<Role>;

    /// Replaces the role names assigned to a user.
    async fn set_user_roles(
        &self,
        user_id: UserId,
        role_names: Vec<String>,
    ) -> AppResult<UserSummary>;
}
