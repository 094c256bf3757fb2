//! Cheat type registry.
//!
//! Each cheat type carries a validation pattern that codes of that type must
//! match once spaces are removed. The built-in set mirrors the formats the
//! server accepts: raw, Game Genie, GameShark, CodeBreaker and Action Replay.
//! The server can extend or redefine that set; see
//! [`CheatTypeRegistry::with_overrides`].

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::model::RAW_CHEAT_TYPE;

/// Pattern applied to unknown cheat types.
pub const FALLBACK_PATTERN: &str = "^.+$";

/// Description of one cheat code format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheatType {
    pub id: String,
    pub name: String,
    pub description: String,
    pub pattern: String,
    pub example: String,
}

impl CheatType {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        pattern: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            pattern: pattern.into(),
            example: String::new(),
        }
    }

    fn builtin(id: &str, name: &str, description: &str, pattern: &str, example: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            pattern: pattern.to_string(),
            example: example.to_string(),
        }
    }
}

struct CompiledType {
    info: CheatType,
    regex: Option<Regex>,
}

/// Ordered collection of known cheat types with precompiled patterns.
pub struct CheatTypeRegistry {
    types: Vec<CompiledType>,
}

static FALLBACK_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(FALLBACK_PATTERN).expect("fallback pattern is valid"));

static DEFAULT_REGISTRY: Lazy<CheatTypeRegistry> =
    Lazy::new(|| CheatTypeRegistry::new(builtin_types()));

fn builtin_types() -> Vec<CheatType> {
    vec![
        CheatType::builtin(
            RAW_CHEAT_TYPE,
            "Raw",
            "Raw cheat code with no specific format",
            FALLBACK_PATTERN,
            "ABCDEF",
        ),
        CheatType::builtin(
            "game_genie",
            "Game Genie",
            "Game Genie letter codes (NES) or hex codes (SNES/Genesis/GB)",
            r"^(?:[APZLGITYEOXUKSVN]{6}|[APZLGITYEOXUKSVN]{8}|[0-9A-F]{4}-[0-9A-F]{4}|[0-9A-Z]{3}-[0-9A-Z]{3}(?:-[0-9A-Z]{3})?|[0-9A-Z]{4}-[0-9A-Z]{4})$",
            "SXYIZVSE",
        ),
        CheatType::builtin(
            "gameshark",
            "GameShark",
            "GameShark address/value codes, '+' joins multi-line codes",
            r"^[0-9A-F]{8}(?:[0-9A-F]{4})?(?:\+[0-9A-F]{8}(?:[0-9A-F]{4})?)*$",
            "8009C6E40063",
        ),
        CheatType::builtin(
            "codebreaker",
            "CodeBreaker",
            "CodeBreaker codes, '+' joins multi-line codes",
            r"^[0-9A-F]{8}[0-9A-F]{4,8}(?:\+[0-9A-F]{8}[0-9A-F]{4,8})*$",
            "82025C3C0063",
        ),
        CheatType::builtin(
            "actionreplay",
            "Action Replay",
            "Action Replay codes, '+' joins multi-line codes",
            r"^[0-9A-F]{8}(?:[0-9A-F]{4}|[0-9A-F]{8})(?:\+[0-9A-F]{8}(?:[0-9A-F]{4}|[0-9A-F]{8}))*$",
            "3202C1E40063",
        ),
    ]
}

impl CheatTypeRegistry {
    /// Builds a registry, compiling each pattern once.
    ///
    /// Types whose pattern fails to compile are kept but validate with the
    /// fallback pattern.
    pub fn new(types: Vec<CheatType>) -> Self {
        let types = types
            .into_iter()
            .map(|info| {
                let regex = match Regex::new(&info.pattern) {
                    Ok(regex) => Some(regex),
                    Err(e) => {
                        tracing::warn!(
                            "[CheatTypeRegistry] Invalid pattern for type '{}': {}",
                            info.id,
                            e
                        );
                        None
                    }
                };
                CompiledType { info, regex }
            })
            .collect();
        Self { types }
    }

    /// Built-in types overlaid with `types` (usually the server's list).
    ///
    /// A type whose id is already known replaces that definition in place;
    /// new ids are appended in the given order.
    pub fn with_overrides(types: Vec<CheatType>) -> Self {
        let mut merged = builtin_types();
        for cheat_type in types {
            match merged.iter_mut().find(|t| t.id == cheat_type.id) {
                Some(existing) => *existing = cheat_type,
                None => merged.push(cheat_type),
            }
        }
        Self::new(merged)
    }

    /// Id of the type called `name`.
    ///
    /// The server's type listing carries names only. A name known to the
    /// registry (case-insensitive) maps to its id; anything else is turned
    /// into a lower-case slug.
    pub fn id_for_name(&self, name: &str) -> String {
        let name = name.trim();
        if let Some(known) = self
            .types
            .iter()
            .find(|t| t.info.name.eq_ignore_ascii_case(name))
        {
            return known.info.id.clone();
        }
        slug(name)
    }

    /// Returns the registry holding the built-in cheat types.
    pub fn builtin() -> &'static CheatTypeRegistry {
        &DEFAULT_REGISTRY
    }

    /// All type ids in registration order.
    pub fn type_ids(&self) -> Vec<&str> {
        self.types.iter().map(|t| t.info.id.as_str()).collect()
    }

    pub fn types(&self) -> impl Iterator<Item = &CheatType> {
        self.types.iter().map(|t| &t.info)
    }

    pub fn get(&self, type_id: &str) -> Option<&CheatType> {
        self.find(type_id).map(|t| &t.info)
    }

    pub fn contains(&self, type_id: &str) -> bool {
        self.find(type_id).is_some()
    }

    /// Validation pattern source for a type; unknown types get `^.+$`.
    pub fn pattern(&self, type_id: &str) -> &str {
        self.get(type_id)
            .map(|t| t.pattern.as_str())
            .unwrap_or(FALLBACK_PATTERN)
    }

    /// Tests a code (spaces already removed) against the type's pattern.
    pub fn matches(&self, type_id: &str, code: &str) -> bool {
        match self.find(type_id).and_then(|t| t.regex.as_ref()) {
            Some(regex) => regex.is_match(code),
            None => FALLBACK_REGEX.is_match(code),
        }
    }

    fn find(&self, type_id: &str) -> Option<&CompiledType> {
        self.types.iter().find(|t| t.info.id == type_id)
    }
}

fn slug(name: &str) -> String {
    let mut id = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            id.push(c.to_ascii_lowercase());
        } else if !id.is_empty() && !id.ends_with('_') {
            id.push('_');
        }
    }
    id.trim_end_matches('_').to_string()
}

impl Default for CheatTypeRegistry {
    fn default() -> Self {
        Self::new(builtin_types())
    }
}
