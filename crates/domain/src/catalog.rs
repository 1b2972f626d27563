//! Read-through role and permission catalogs.

use std::collections::{HashMap, HashSet};

use keystone_core::{AppError, AppResult};

use crate::{Permission, Role, RoleId};

/// Role catalog indexed by unique role name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleCatalog {
    roles: Vec<Role>,
    by_name: HashMap<String, usize>,
}

impl RoleCatalog {
    /// Builds a catalog, rejecting duplicate role names.
    pub fn new(roles: Vec<Role>) -> AppResult<Self> {
        let mut by_name = HashMap::with_capacity(roles.len());
        for (index, role) in roles.iter().enumerate() {
            if by_name.insert(role.name.clone(), index).is_some() {
                return Err(AppError::Validation(format!(
                    "role name '{}' appears more than once in the catalog",
                    role.name
                )));
            }
        }

        Ok(Self { roles, by_name })
    }

    /// Returns the roles in server order.
    #[must_use]
    pub fn roles(&self) -> &[Role] {
        self.roles.as_slice()
    }

    /// Finds a role by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Role> {
        self.by_name.get(name).map(|index| &self.roles[*index])
    }

    /// Finds a role by identifier.
    #[must_use]
    pub fn get_by_id(&self, role_id: RoleId) -> Option<&Role> {
        self.roles.iter().find(|role| role.id == role_id)
    }

    /// Returns the exclusive group of a role; unknown roles are ungrouped.
    #[must_use]
    pub fn exclusive_group_of(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Role::group)
    }

    /// Lists roles in `selected` that adding `role_name` would displace.
    ///
    /// Ordered by descending priority, then by name.
    #[must_use]
    pub fn conflicts_for<'a, I>(&self, role_name: &str, selected: I) -> Vec<&Role>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let Some(group) = self.exclusive_group_of(role_name) else {
            return Vec::new();
        };

        let mut conflicts: Vec<&Role> = selected
            .into_iter()
            .filter(|name| *name != role_name)
            .filter_map(|name| self.get(name))
            .filter(|role| role.group() == Some(group))
            .collect();
        conflicts.sort_by(|left, right| {
            right
                .priority
                .cmp(&left.priority)
                .then_with(|| left.name.cmp(&right.name))
        });
        conflicts
    }

    /// Checks that at most one name per exclusive group is present.
    pub fn validate_assignment<'a, I>(&self, names: I) -> AppResult<()>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut seen: HashMap<&str, &str> = HashMap::new();
        for name in names {
            let Some(group) = self.exclusive_group_of(name) else {
                continue;
            };
            if let Some(previous) = seen.insert(group, name) {
                return Err(AppError::Validation(format!(
                    "roles '{previous}' and '{name}' share exclusive group '{group}'"
                )));
            }
        }

        Ok(())
    }
}

/// Permission catalog indexed by unique code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionCatalog {
    permissions: Vec<Permission>,
}

impl PermissionCatalog {
    /// Builds a catalog, rejecting duplicate codes.
    pub fn new(permissions: Vec<Permission>) -> AppResult<Self> {
        let mut seen = HashSet::with_capacity(permissions.len());
        for permission in &permissions {
            if !seen.insert(permission.code.as_str()) {
                return Err(AppError::Validation(format!(
                    "permission code '{}' appears more than once in the catalog",
                    permission.code
                )));
            }
        }

        Ok(Self { permissions })
    }

    /// Returns permissions in server order.
    #[must_use]
    pub fn permissions(&self) -> &[Permission] {
        self.permissions.as_slice()
    }
}
