//! Validation and sanitisation of cheat code input.

use std::collections::BTreeMap;
use std::fmt;

use super::model::{CheatDraft, RAW_CHEAT_TYPE};
use super::types::CheatTypeRegistry;

/// Maximum length of a cheat name or code.
pub const MAX_FIELD_LEN: usize = 255;

/// Per-field validation failures, keyed by field name
/// (`name`, `code`, `description`, `type`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    fields: BTreeMap<&'static str, String>,
}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.fields.iter().map(|(k, v)| (*k, v.as_str()))
    }

    fn insert(&mut self, field: &'static str, message: impl Into<String>) {
        self.fields.insert(field, message.into());
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .fields
            .iter()
            .map(|(field, message)| format!("{}: {}", field, message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// Validates cheat drafts against a cheat type registry.
pub struct CheatValidator<'a> {
    registry: &'a CheatTypeRegistry,
}

impl<'a> CheatValidator<'a> {
    pub fn new(registry: &'a CheatTypeRegistry) -> Self {
        Self { registry }
    }

    /// Validator backed by the built-in cheat types.
    pub fn builtin() -> CheatValidator<'static> {
        CheatValidator::new(CheatTypeRegistry::builtin())
    }

    /// Checks a draft and returns every field-level problem found.
    ///
    /// The code format is only checked when both the code and the type
    /// passed their own checks.
    pub fn validate(&self, draft: &CheatDraft) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();

        if draft.name.is_empty() {
            errors.insert("name", "Cheat code name is required");
        } else if draft.name.chars().count() > MAX_FIELD_LEN {
            errors.insert("name", "Cheat code name must be 255 characters or less");
        }

        if draft.code.is_empty() {
            errors.insert("code", "Cheat code is required");
        } else if draft.code.chars().count() > MAX_FIELD_LEN {
            errors.insert("code", "Cheat code must be 255 characters or less");
        }

        if draft.cheat_type.is_empty() {
            errors.insert("type", "Cheat code type is required");
        } else if !self.registry.contains(&draft.cheat_type) {
            errors.insert(
                "type",
                format!(
                    "Invalid cheat code type. Must be one of: {}",
                    self.registry.type_ids().join(", ")
                ),
            );
        }

        if errors.get("code").is_none() && errors.get("type").is_none() {
            if let Some(message) = self.check_format(&draft.code, &draft.cheat_type) {
                errors.insert("code", message);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Checks a code's shape for the given type; spaces are ignored.
    pub fn check_format(&self, code: &str, cheat_type: &str) -> Option<String> {
        let clean: String = code.chars().filter(|c| *c != ' ').collect();

        if cheat_type == RAW_CHEAT_TYPE {
            return clean
                .is_empty()
                .then(|| "Raw code cannot be empty".to_string());
        }

        if self.registry.matches(cheat_type, &clean) {
            return None;
        }

        let type_name = self
            .registry
            .get(cheat_type)
            .map(|t| t.name.clone())
            .unwrap_or_else(|| capitalize(cheat_type));
        Some(format!("{} codes must match the required format", type_name))
    }

    /// Normalises user input before it is stored.
    ///
    /// Fields are trimmed, the description defaults to empty, and the type is
    /// lower-cased; unregistered types become `raw`.
    pub fn sanitize(&self, draft: &CheatDraft) -> CheatDraft {
        let cheat_type = draft.cheat_type.trim().to_lowercase();
        let cheat_type = if self.registry.contains(&cheat_type) {
            cheat_type
        } else {
            RAW_CHEAT_TYPE.to_string()
        };

        CheatDraft {
            name: draft.name.trim().to_string(),
            code: draft.code.trim().to_string(),
            description: Some(
                draft
                    .description
                    .as_deref()
                    .unwrap_or_default()
                    .trim()
                    .to_string(),
            ),
            cheat_type,
        }
    }
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> CheatValidator<'static> {
        CheatValidator::builtin()
    }

    #[test]
    fn test_valid_game_genie_code() {
        let draft = CheatDraft::new("Infinite Lives", "ABCD-1234").with_type("game_genie");
        assert!(validator().validate(&draft).is_ok());
    }

    #[test]
    fn test_missing_fields_reported_per_field() {
        let draft = CheatDraft {
            name: String::new(),
            code: String::new(),
            description: None,
            cheat_type: String::new(),
        };

        let errors = validator().validate(&draft).unwrap_err();
        assert_eq!(errors.get("name"), Some("Cheat code name is required"));
        assert_eq!(errors.get("code"), Some("Cheat code is required"));
        assert_eq!(errors.get("type"), Some("Cheat code type is required"));
    }

    #[test]
    fn test_overlong_name_and_code() {
        let long = "x".repeat(256);
        let draft = CheatDraft::new(long.clone(), long);

        let errors = validator().validate(&draft).unwrap_err();
        assert_eq!(
            errors.get("name"),
            Some("Cheat code name must be 255 characters or less")
        );
        assert_eq!(
            errors.get("code"),
            Some("Cheat code must be 255 characters or less")
        );
    }

    #[test]
    fn test_unknown_type_lists_valid_types() {
        let draft = CheatDraft::new("Moon Jump", "D01F0000").with_type("xploder");
        let errors = validator().validate(&draft).unwrap_err();
        let message = errors.get("type").unwrap();
        assert!(message.starts_with("Invalid cheat code type. Must be one of: raw"));
        assert!(errors.get("code").is_none());
    }

    #[test]
    fn test_format_mismatch_uses_type_name() {
        let draft = CheatDraft::new("Max Money", "not-a-code").with_type("gameshark");
        let errors = validator().validate(&draft).unwrap_err();
        assert_eq!(
            errors.get("code"),
            Some("GameShark codes must match the required format")
        );
    }

    #[test]
    fn test_spaces_ignored_for_format_check() {
        let draft = CheatDraft::new("Max Money", "8009C6E4 0063").with_type("gameshark");
        assert!(validator().validate(&draft).is_ok());
    }

    #[test]
    fn test_raw_code_of_only_spaces_is_rejected() {
        assert_eq!(
            validator().check_format("   ", "raw").as_deref(),
            Some("Raw code cannot be empty")
        );
    }

    #[test]
    fn test_sanitize_trims_and_normalises_type() {
        let draft = CheatDraft {
            name: "  Infinite Lives ".to_string(),
            code: " SXYIZVSE ".to_string(),
            description: None,
            cheat_type: " GAME_GENIE ".to_string(),
        };

        let clean = validator().sanitize(&draft);
        assert_eq!(clean.name, "Infinite Lives");
        assert_eq!(clean.code, "SXYIZVSE");
        assert_eq!(clean.description.as_deref(), Some(""));
        assert_eq!(clean.cheat_type, "game_genie");
    }

    #[test]
    fn test_sanitize_maps_unknown_type_to_raw() {
        let draft = CheatDraft::new("x", "y").with_type("mystery");
        assert_eq!(validator().sanitize(&draft).cheat_type, "raw");
    }

    #[test]
    fn test_errors_display_joins_fields() {
        let draft = CheatDraft::new("", "ABC");
        let errors = validator().validate(&draft).unwrap_err();
        assert_eq!(errors.to_string(), "name: Cheat code name is required");
    }
}
