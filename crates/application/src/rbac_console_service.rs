//! Role and permission administration flows of the console.

use std::sync::Arc;

use keystone_core::{AppError, AppResult};
use keystone_domain::{
    ConsolePermission, PermissionCatalog, Role, RoleCatalog, RoleDraft, UserSummary,
};
use tracing::{info, warn};

use crate::{
    CapabilitySet, RbacGateway, RoleAssignmentEditor, RoleMetadataEditor, RolePermissionEditor,
    SessionStore,
};

/// Application service driving the RBAC admin view.
///
/// Capability checks here only gate the UI; the server re-checks every call. A failed
/// mutation never touches the editors, so the draft can be resubmitted as is.
#[derive(Clone)]
pub struct RbacConsoleService {
    gateway: Arc<dyn RbacGateway>,
    session: SessionStore,
}

impl RbacConsoleService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(gateway: Arc<dyn RbacGateway>, session: SessionStore) -> Self {
        Self { gateway, session }
    }

    /// Returns the capabilities of the current session.
    #[must_use]
    pub fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::from_session(&self.session.snapshot())
    }

    /// Returns whether mutation controls should be enabled.
    #[must_use]
    pub fn can_write(&self) -> bool {
        self.capabilities()
            .has_console_permission(ConsolePermission::RbacWrite)
    }

    /// Loads the role catalog.
    pub async fn load_roles(&self) -> AppResult<RoleCatalog> {
        self.require(ConsolePermission::RbacRead)?;
        RoleCatalog::new(self.gateway.list_roles().await?)
    }

    /// Loads the permission catalog.
    pub async fn load_permissions(&self) -> AppResult<PermissionCatalog> {
        self.require(ConsolePermission::RbacRead)?;
        PermissionCatalog::new(self.gateway.list_permissions().await?)
    }

    /// Loads the users shown in the assignment view.
    pub async fn load_users(&self) -> AppResult<Vec<UserSummary>> {
        self.require(ConsolePermission::UsersRead)?;
        self.gateway.list_users().await
    }

    /// Validates the create form and creates the role.
    ///
    /// The new role is selected in both role editors.
    pub async fn create_role(
        &self,
        draft: &RoleDraft,
        permission_editor: &mut RolePermissionEditor,
        metadata_editor: &mut RoleMetadataEditor,
    ) -> AppResult<Role> {
        self.require(ConsolePermission::RbacWrite)?;
        let input = draft.validate()?;

        let role = self
            .gateway
            .create_role(input)
            .await
            .inspect_err(|error| warn!(%error, "create role failed"))?;
        info!(role = %role.name, "role created");

        permission_editor.select(role.id, Vec::<String>::new());
        metadata_editor.select(&role);
        Ok(role)
    }

    /// Deletes a non-system role, clearing the editors when it was selected.
    pub async fn delete_role(
        &self,
        role: &Role,
        permission_editor: &mut RolePermissionEditor,
        metadata_editor: &mut RoleMetadataEditor,
    ) -> AppResult<()> {
        self.require(ConsolePermission::RbacWrite)?;
        if role.is_system {
            return Err(AppError::Validation(format!(
                "system role '{}' cannot be deleted",
                role.name
            )));
        }

        self.gateway
            .delete_role(role.id)
            .await
            .inspect_err(|error| warn!(%error, role = %role.name, "delete role failed"))?;
        info!(role = %role.name, "role deleted");

        if permission_editor.selected_role() == Some(role.id) {
            permission_editor.clear();
        }
        if metadata_editor.selected_role() == Some(role.id) {
            metadata_editor.clear();
        }
        Ok(())
    }

    /// Saves the permission draft and re-baselines it from the refetched role.
    ///
    /// Once the server accepts the grants the save counts as done; a failed refetch falls
    /// back to the role returned by the mutation.
    pub async fn save_role_permissions(
        &self,
        editor: &mut RolePermissionEditor,
    ) -> AppResult<Role> {
        self.require(ConsolePermission::RbacWrite)?;
        let submission = editor.submission()?;

        let saved = self
            .gateway
            .set_role_permissions(submission.role_id, submission.permission_codes)
            .await
            .inspect_err(|error| {
                warn!(%error, role_id = %submission.role_id, "saving role permissions failed");
            })?;

        let role = self.refetched_role(saved).await;
        editor.select(role.id, role.permission_codes());
        Ok(role)
    }

    /// Saves the role-membership draft and re-baselines it from the refetched user.
    ///
    /// A failed or forbidden user refetch falls back to the mutation response.
    pub async fn save_user_roles(
        &self,
        editor: &mut RoleAssignmentEditor,
        catalog: &RoleCatalog,
    ) -> AppResult<UserSummary> {
        self.require(ConsolePermission::RbacWrite)?;
        let submission = editor.submission(catalog)?;

        let saved = self
            .gateway
            .set_user_roles(submission.user_id, submission.role_names)
            .await
            .inspect_err(|error| {
                warn!(%error, user_id = %submission.user_id, "saving user roles failed");
            })?;

        let user = match self.load_users().await {
            Ok(users) => users
                .into_iter()
                .find(|user| user.id == saved.id)
                .unwrap_or(saved),
            Err(error) => {
                warn!(%error, user_id = %saved.id, "refetching users after save failed");
                saved
            }
        };
        editor.select(user.id, user.role_names());
        Ok(user)
    }

    /// Saves the metadata form of a non-system role.
    ///
    /// Returns `Ok(None)` without any call when nothing is editable.
    pub async fn save_role_metadata(
        &self,
        editor: &mut RoleMetadataEditor,
    ) -> AppResult<Option<Role>> {
        self.require(ConsolePermission::RbacWrite)?;
        let Some((role_id, update)) = editor.submission()? else {
            return Ok(None);
        };

        let saved = self
            .gateway
            .update_role_metadata(role_id, update)
            .await
            .inspect_err(|error| warn!(%error, %role_id, "saving role metadata failed"))?;

        let role = self.refetched_role(saved).await;
        editor.select(&role);
        Ok(Some(role))
    }

    async fn refetched_role(&self, saved: Role) -> Role {
        match self.gateway.list_roles().await {
            Ok(roles) => roles
                .into_iter()
                .find(|role| role.id == saved.id)
                .unwrap_or(saved),
            Err(error) => {
                warn!(%error, role = %saved.name, "refetching roles after save failed");
                saved
            }
        }
    }

    fn require(&self, permission: ConsolePermission) -> AppResult<()> {
        if self.capabilities().has_console_permission(permission) {
            return Ok(());
        }

        Err(AppError::Forbidden(format!(
            "current session is missing permission '{}'",
            permission.as_str()
        )))
    }
}
