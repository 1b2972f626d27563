//! Form-level validation for role creation and metadata edits.

use keystone_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

/// Parses the priority text typed into a role form.
///
/// Blank input means `0`. Anything else must be a finite number, and since priorities are
/// stored as integers it must also be whole and fit `i32`: `"1.5"` and `"1e10"` are
/// rejected while `"1e2"` parses as `100`.
pub fn parse_priority(value: &str) -> AppResult<i32> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }

    let parsed = trimmed
        .parse::<f64>()
        .ok()
        .filter(|number| number.is_finite())
        .ok_or_else(|| AppError::Validation("priority must be a number".to_owned()))?;

    if parsed.fract() != 0.0 || parsed < f64::from(i32::MIN) || parsed > f64::from(i32::MAX) {
        return Err(AppError::Validation(
            "priority must be a whole number".to_owned(),
        ));
    }

    Ok(parsed as i32)
}

/// Normalizes a free-form exclusive group; blank means ungrouped.
#[must_use]
pub fn normalize_exclusive_group(value: &str) -> Option<String> {
    optional_text(value)
}

fn optional_text(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

/// Validated payload for creating a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRoleInput {
    /// Unique role name.
    pub name: NonEmptyString,
    /// Optional description.
    pub description: Option<String>,
    /// Optional exclusive group.
    pub exclusive_group: Option<String>,
    /// Display precedence.
    pub priority: i32,
}

/// Validated payload for updating role metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleMetadataUpdate {
    /// Exclusive group, `None` to clear it.
    pub exclusive_group: Option<String>,
    /// Display precedence.
    pub priority: i32,
}

/// Raw text of the "create role" form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleDraft {
    /// Role name as typed.
    pub name: String,
    /// Description as typed.
    pub description: String,
    /// Exclusive group as typed.
    pub exclusive_group: String,
    /// Priority as typed.
    pub priority: String,
}

impl Default for RoleDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            exclusive_group: String::new(),
            priority: "0".to_owned(),
        }
    }
}

impl RoleDraft {
    /// Validates the form into a create payload.
    pub fn validate(&self) -> AppResult<CreateRoleInput> {
        let name = NonEmptyString::new(self.name.as_str())
            .map_err(|_| AppError::Validation("role name is required".to_owned()))?;
        let priority = parse_priority(self.priority.as_str())?;

        Ok(CreateRoleInput {
            name,
            description: optional_text(self.description.as_str()),
            exclusive_group: normalize_exclusive_group(self.exclusive_group.as_str()),
            priority,
        })
    }
}

#[cfg(test)]
mod tests {
    use keystone_core::AppError;

    use super::{RoleDraft, normalize_exclusive_group, parse_priority};

    #[test]
    fn priority_accepts_integers_and_blank() {
        assert_eq!(parse_priority("42").ok(), Some(42));
        assert_eq!(parse_priority(" -3 ").ok(), Some(-3));
        assert_eq!(parse_priority("").ok(), Some(0));
        assert_eq!(parse_priority("1e2").ok(), Some(100));
    }

    #[test]
    fn priority_rejects_non_numeric_input() {
        for value in ["abc", "NaN", "inf", "12px"] {
            assert!(
                matches!(parse_priority(value), Err(AppError::Validation(_))),
                "{value} should be rejected"
            );
        }
    }

    #[test]
    fn priority_rejects_fractions_and_overflow() {
        assert!(parse_priority("1.5").is_err());
        assert!(parse_priority("99999999999").is_err());
        assert!(parse_priority("1e10").is_err());
    }

    #[test]
    fn exclusive_group_blank_is_none() {
        assert_eq!(normalize_exclusive_group("  "), None);
        assert_eq!(
            normalize_exclusive_group(" account "),
            Some("account".to_owned())
        );
    }

    #[test]
    fn draft_requires_name() {
        let draft = RoleDraft {
            name: "   ".to_owned(),
            ..RoleDraft::default()
        };
        assert!(matches!(draft.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn draft_validates_into_create_input() {
        let draft = RoleDraft {
            name: " viewer ".to_owned(),
            description: String::new(),
            exclusive_group: "account".to_owned(),
            priority: "10".to_owned(),
        };

        let Ok(input) = draft.validate() else {
            panic!("draft should validate");
        };
        assert_eq!(input.name.as_str(), "viewer");
        assert_eq!(input.description, None);
        assert_eq!(input.exclusive_group.as_deref(), Some("account"));
        assert_eq!(input.priority, 10);
    }
}
