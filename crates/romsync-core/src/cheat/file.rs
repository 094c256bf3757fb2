//! `cheats.txt` flat-file format.
//!
//! A local authoring format for the command-line tool; the server never sees
//! it. Each block becomes one cheat. Several code lines in one block form a
//! multi-line code and are joined with `+`, the separator the typed cheat
//! patterns accept.
//!
//! ```text
//! # Name: Infinite Lives
//! # Description: Never lose a life
//! # Type: game_genie
//! SXYIZVSE
//!
//! # Name: Invincibility
//! AEKZZZIA
//! ```

use super::model::{CheatCode, CheatDraft, RAW_CHEAT_TYPE};
use super::types::CheatTypeRegistry;

const NAME_PREFIX: &str = "# Name:";
const DESCRIPTION_PREFIX: &str = "# Description:";
const TYPE_PREFIX: &str = "# Type:";
const CODE_LINE_SEPARATOR: char = '+';

/// Parses a `cheats.txt` document into drafts, in file order.
///
/// Blocks without a code line are dropped. Unknown `# Type:` values parse
/// as `raw`; other comment lines are ignored. Consecutive code lines are
/// joined with `+`.
pub fn parse_cheat_file(content: &str, registry: &CheatTypeRegistry) -> Vec<CheatDraft> {
    let mut cheats = Vec::new();
    let mut current = CheatDraft::default().with_type(RAW_CHEAT_TYPE);

    for line in content.lines().map(str::trim) {
        if line.is_empty() {
            if !current.code.is_empty() {
                cheats.push(std::mem::replace(
                    &mut current,
                    CheatDraft::default().with_type(RAW_CHEAT_TYPE),
                ));
            }
            continue;
        }

        if let Some(name) = line.strip_prefix(NAME_PREFIX) {
            current.name = name.trim().to_string();
        } else if let Some(description) = line.strip_prefix(DESCRIPTION_PREFIX) {
            current.description = Some(description.trim().to_string());
        } else if let Some(cheat_type) = line.strip_prefix(TYPE_PREFIX) {
            let cheat_type = cheat_type.trim().to_lowercase();
            current.cheat_type = if registry.contains(&cheat_type) {
                cheat_type
            } else {
                RAW_CHEAT_TYPE.to_string()
            };
        } else if !line.starts_with('#') {
            if !current.code.is_empty() {
                current.code.push(CODE_LINE_SEPARATOR);
            }
            current.code.push_str(line);
        }
    }

    if !current.code.is_empty() {
        cheats.push(current);
    }

    cheats
}

/// Renders cheats in `cheats.txt` form.
///
/// Returns an empty string for an empty list, otherwise the blocks joined by
/// blank lines with exactly one trailing newline.
pub fn render_cheat_file<'a, I>(cheats: I) -> String
where
    I: IntoIterator<Item = &'a CheatCode>,
{
    let mut lines: Vec<String> = Vec::new();

    for cheat in cheats {
        if !cheat.name.is_empty() {
            lines.push(format!("{} {}", NAME_PREFIX, cheat.name));
        }
        if let Some(description) = cheat.description.as_deref().filter(|d| !d.is_empty()) {
            lines.push(format!("{} {}", DESCRIPTION_PREFIX, description));
        }
        if !cheat.cheat_type.is_empty() {
            lines.push(format!("{} {}", TYPE_PREFIX, cheat.cheat_type));
        }
        lines.push(cheat.code.clone());
        lines.push(String::new());
    }

    if lines.is_empty() {
        return String::new();
    }

    let mut content = lines.join("\n").trim().to_string();
    content.push('\n');
    content
}
