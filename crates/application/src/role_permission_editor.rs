//! Working sets for the role selected in the permission view.

use keystone_core::{AppError, AppResult};
use keystone_domain::{Role, RoleId, RoleMetadataUpdate, normalize_exclusive_group, parse_priority};

/// Payload for the role-permission mutation endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolePermissionsSubmission {
    /// Role whose grants are replaced.
    pub role_id: RoleId,
    /// Complete permission-code set, in working order.
    pub permission_codes: Vec<String>,
}

/// In-memory permission-code draft for one role. Any combination is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RolePermissionEditor {
    selected_role: Option<RoleId>,
    baseline: Vec<String>,
    working: Vec<String>,
}

impl RolePermissionEditor {
    /// Creates an editor with no role selected.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects a role and makes its committed codes the new baseline.
    pub fn select<I, S>(&mut self, role_id: RoleId, initial_codes: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut codes: Vec<String> = Vec::new();
        for code in initial_codes {
            let code = code.into();
            if !codes.contains(&code) {
                codes.push(code);
            }
        }

        self.selected_role = Some(role_id);
        self.baseline.clone_from(&codes);
        self.working = codes;
    }

    /// Drops the selection and the draft.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Returns the selected role.
    #[must_use]
    pub fn selected_role(&self) -> Option<RoleId> {
        self.selected_role
    }

    /// Returns the working codes in insertion order.
    #[must_use]
    pub fn codes(&self) -> &[String] {
        self.working.as_slice()
    }

    /// Returns whether the code is in the working set.
    #[must_use]
    pub fn contains(&self, code: &str) -> bool {
        self.working.iter().any(|current| current == code)
    }

    /// Returns whether the working set differs from the baseline.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.working.len() != self.baseline.len()
            || self.working.iter().any(|code| !self.baseline.contains(code))
    }

    /// Flips membership of a code; returns whether it is now present.
    pub fn toggle(&mut self, code: &str) -> bool {
        if self.contains(code) {
            self.working.retain(|current| current != code);
            return false;
        }

        self.working.push(code.to_owned());
        true
    }

    /// Returns the payload for the save call.
    pub fn submission(&self) -> AppResult<RolePermissionsSubmission> {
        let role_id = self
            .selected_role
            .ok_or_else(|| AppError::Validation("no role selected".to_owned()))?;

        Ok(RolePermissionsSubmission {
            role_id,
            permission_codes: self.working.clone(),
        })
    }
}

/// Exclusive-group and priority form for the selected role.
///
/// System roles are read-only: every edit is ignored and nothing is submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleMetadataEditor {
    selected_role: Option<RoleId>,
    is_system: bool,
    exclusive_group: String,
    priority: String,
}

impl RoleMetadataEditor {
    /// Creates an editor with no role selected.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the form from a role.
    pub fn select(&mut self, role: &Role) {
        self.selected_role = Some(role.id);
        self.is_system = role.is_system;
        self.exclusive_group = role.exclusive_group.clone().unwrap_or_default();
        self.priority = role.priority.to_string();
    }

    /// Drops the selection.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Returns the selected role.
    #[must_use]
    pub fn selected_role(&self) -> Option<RoleId> {
        self.selected_role
    }

    /// Returns whether the controls must render read-only.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.selected_role.is_none() || self.is_system
    }

    /// Returns the exclusive group text.
    #[must_use]
    pub fn exclusive_group(&self) -> &str {
        self.exclusive_group.as_str()
    }

    /// Returns the priority text.
    #[must_use]
    pub fn priority(&self) -> &str {
        self.priority.as_str()
    }

    /// Sets the exclusive group text; returns `false` when the edit was ignored.
    pub fn set_exclusive_group(&mut self, value: impl Into<String>) -> bool {
        if self.is_read_only() {
            return false;
        }

        self.exclusive_group = value.into();
        true
    }

    /// Sets the priority text; returns `false` when the edit was ignored.
    pub fn set_priority(&mut self, value: impl Into<String>) -> bool {
        if self.is_read_only() {
            return false;
        }

        self.priority = value.into();
        true
    }

    /// Validates the form for the update call.
    ///
    /// `Ok(None)` means there is nothing to submit: no role is selected or it is a
    /// system role.
    pub fn submission(&self) -> AppResult<Option<(RoleId, RoleMetadataUpdate)>> {
        let Some(role_id) = self.selected_role.filter(|_| !self.is_system) else {
            return Ok(None);
        };

        let priority = parse_priority(self.priority.as_str())?;
        Ok(Some((
            role_id,
            RoleMetadataUpdate {
                exclusive_group: normalize_exclusive_group(self.exclusive_group.as_str()),
                priority,
            },
        )))
    }
}
