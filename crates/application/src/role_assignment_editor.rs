//! Working set of role names for the user selected in the assignment view.

use keystone_core::{AppError, AppResult};
use keystone_domain::{RoleCatalog, UserId};

/// Effect of toggling one role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleToggle {
    /// The role was in the working set and has been removed.
    Removed,
    /// The role was added; `displaced` lists same-group roles it replaced.
    Added {
        /// Roles removed to keep the exclusive group single-valued, highest priority first.
        displaced: Vec<String>,
    },
}

/// Payload for the user-role mutation endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRolesSubmission {
    /// User whose roles are replaced.
    pub user_id: UserId,
    /// Complete role-name set, in working order.
    pub role_names: Vec<String>,
}

/// In-memory role membership draft for one user.
///
/// After every toggle the working set holds at most one role per exclusive group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleAssignmentEditor {
    selected_user: Option<UserId>,
    baseline: Vec<String>,
    working: Vec<String>,
}

impl RoleAssignmentEditor {
    /// Creates an editor with no user selected.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects a user and makes its committed roles the new baseline.
    ///
    /// Any unsaved draft is discarded.
    pub fn select<I, S>(&mut self, user_id: UserId, initial_role_names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names: Vec<String> = Vec::new();
        for name in initial_role_names {
            let name = name.into();
            if !names.contains(&name) {
                names.push(name);
            }
        }

        self.selected_user = Some(user_id);
        self.baseline.clone_from(&names);
        self.working = names;
    }

    /// Drops the selection and the draft.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Returns the selected user.
    #[must_use]
    pub fn selected_user(&self) -> Option<UserId> {
        self.selected_user
    }

    /// Returns the working role names in insertion order.
    #[must_use]
    pub fn role_names(&self) -> &[String] {
        self.working.as_slice()
    }

    /// Returns whether the role is in the working set.
    #[must_use]
    pub fn contains(&self, role_name: &str) -> bool {
        self.working.iter().any(|name| name == role_name)
    }

    /// Returns whether the working set differs from the baseline.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.working.len() != self.baseline.len()
            || self.working.iter().any(|name| !self.baseline.contains(name))
    }

    /// Toggles a role, resolving exclusive-group conflicts against the catalog.
    ///
    /// Removal is unconditional. Adding a grouped role first removes every other
    /// working role of the same group; ungrouped roles stack.
    pub fn toggle(&mut self, role_name: &str, catalog: &RoleCatalog) -> RoleToggle {
        if self.contains(role_name) {
            self.working.retain(|name| name != role_name);
            return RoleToggle::Removed;
        }

        let displaced: Vec<String> = catalog
            .conflicts_for(role_name, self.working.iter().map(String::as_str))
            .into_iter()
            .map(|role| role.name.clone())
            .collect();
        self.working.retain(|name| !displaced.contains(name));

        self.working.push(role_name.to_owned());
        RoleToggle::Added { displaced }
    }

    /// Returns the payload for the save call.
    ///
    /// Fails when no user is selected or the draft violates an exclusive group, which can
    /// only happen when the baseline itself did.
    pub fn submission(&self, catalog: &RoleCatalog) -> AppResult<UserRolesSubmission> {
        let user_id = self
            .selected_user
            .ok_or_else(|| AppError::Validation("no user selected".to_owned()))?;
        catalog.validate_assignment(self.working.iter().map(String::as_str))?;

        Ok(UserRolesSubmission {
            user_id,
            role_names: self.working.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use keystone_core::AppError;
    use keystone_domain::{RoleCatalog, UserId};
    use proptest::prelude::*;

    use super::{RoleAssignmentEditor, RoleToggle};
    use crate::test_support::role;

    fn catalog() -> RoleCatalog {
        let mut admin = role(1, "admin", Some("account"));
        admin.is_system = true;
        RoleCatalog::new(vec![
            admin,
            role(2, "viewer", Some("account")),
            role(3, "auditor", None),
            role(4, "billing", Some("finance")),
            role(5, "payroll", Some("finance")),
        ])
        .unwrap_or_default()
    }

    fn editor_with(names: &[&str]) -> RoleAssignmentEditor {
        let mut editor = RoleAssignmentEditor::new();
        editor.select(UserId::new(7), names.iter().copied());
        editor
    }

    #[test]
    fn grouped_toggle_replaces_group_member_and_ungrouped_stacks() {
        let catalog = catalog();
        let mut editor = editor_with(&["admin"]);

        let outcome = editor.toggle("viewer", &catalog);
        assert_eq!(
            outcome,
            RoleToggle::Added {
                displaced: vec!["admin".to_owned()]
            }
        );
        assert_eq!(editor.role_names(), ["viewer"]);

        editor.toggle("auditor", &catalog);
        assert_eq!(editor.role_names(), ["viewer", "auditor"]);
    }

    #[test]
    fn displaced_roles_are_reported_by_priority() {
        let mut owner = role(6, "owner", Some("account"));
        owner.priority = 50;
        let mut admin = role(1, "admin", Some("account"));
        admin.priority = 100;
        let roles = vec![admin, role(2, "viewer", Some("account")), owner];
        let Ok(catalog) = RoleCatalog::new(roles) else {
            panic!("catalog should be valid");
        };
        let mut editor = editor_with(&["viewer", "owner"]);

        let outcome = editor.toggle("admin", &catalog);

        assert_eq!(
            outcome,
            RoleToggle::Added {
                displaced: vec!["owner".to_owned(), "viewer".to_owned()]
            }
        );
        assert_eq!(editor.role_names(), ["admin"]);
    }

    #[test]
    fn toggling_present_role_always_removes_it() {
        let catalog = catalog();
        let mut editor = editor_with(&["admin", "auditor", "billing"]);

        for name in ["admin", "auditor", "billing"] {
            assert_eq!(editor.toggle(name, &catalog), RoleToggle::Removed);
            assert!(!editor.contains(name));
        }
        assert!(editor.role_names().is_empty());
    }

    #[test]
    fn unknown_role_is_treated_as_ungrouped() {
        let catalog = catalog();
        let mut editor = editor_with(&["viewer"]);

        editor.toggle("ghost", &catalog);
        assert_eq!(editor.role_names(), ["viewer", "ghost"]);
    }

    #[test]
    fn select_discards_previous_draft() {
        let catalog = catalog();
        let mut editor = editor_with(&["viewer"]);
        editor.toggle("auditor", &catalog);
        assert!(editor.is_dirty());

        editor.select(UserId::new(8), ["billing", "billing"]);

        assert_eq!(editor.selected_user(), Some(UserId::new(8)));
        assert_eq!(editor.role_names(), ["billing"]);
        assert!(!editor.is_dirty());
    }

    #[test]
    fn reordering_back_to_baseline_is_not_dirty() {
        let catalog = catalog();
        let mut editor = editor_with(&["viewer", "auditor"]);

        editor.toggle("viewer", &catalog);
        editor.toggle("viewer", &catalog);

        assert_eq!(editor.role_names(), ["auditor", "viewer"]);
        assert!(!editor.is_dirty());
    }

    #[test]
    fn submission_requires_selection() {
        let editor = RoleAssignmentEditor::new();
        assert!(matches!(
            editor.submission(&catalog()),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn submission_rejects_conflicting_baseline() {
        let editor = editor_with(&["admin", "viewer"]);
        assert!(editor.submission(&catalog()).is_err());
    }

    #[test]
    fn submission_carries_working_set() {
        let catalog = catalog();
        let mut editor = editor_with(&[]);
        editor.toggle("billing", &catalog);
        editor.toggle("auditor", &catalog);

        let Ok(submission) = editor.submission(&catalog) else {
            panic!("submission should be valid");
        };
        assert_eq!(submission.user_id, UserId::new(7));
        assert_eq!(submission.role_names, vec!["billing", "auditor"]);
    }

    proptest! {
        #[test]
        fn at_most_one_role_per_group_after_any_toggle_sequence(
            toggles in prop::collection::vec(
                prop::sample::select(vec!["admin", "viewer", "auditor", "billing", "payroll"]),
                0..24,
            ),
        ) {
            let catalog = catalog();
            let mut editor = editor_with(&[]);

            for name in toggles {
                editor.toggle(name, &catalog);
                prop_assert!(catalog
                    .validate_assignment(editor.role_names().iter().map(String::as_str))
                    .is_ok());
            }
        }

        #[test]
        fn two_roles_of_one_group_leave_exactly_one(
            pair in prop::sample::select(vec![
                ("admin", "viewer"),
                ("viewer", "admin"),
                ("billing", "payroll"),
                ("payroll", "billing"),
            ]),
        ) {
            let catalog = catalog();
            let mut editor = editor_with(&[]);

            editor.toggle(pair.0, &catalog);
            editor.toggle(pair.1, &catalog);

            let expected = [pair.1.to_owned()];
            prop_assert_eq!(editor.role_names(), expected.as_slice());
        }
    }
}
