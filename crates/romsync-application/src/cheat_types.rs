//! Server-side cheat type catalog.

use romsync_core::cheat::{CheatTypeRegistry, CheatTypeSource};

/// Builds the cheat type registry the server validates with: the built-in
/// types overlaid with the server's list.
///
/// A failed request logs a warning and yields the built-in set, so local
/// validation keeps working offline.
pub async fn load_type_registry(source: &dyn CheatTypeSource) -> CheatTypeRegistry {
    match source.list_types().await {
        Ok(types) => {
            tracing::debug!("[CheatTypes] Server lists {} cheat types", types.len());
            CheatTypeRegistry::with_overrides(types)
        }
        Err(e) => {
            tracing::warn!("[CheatTypes] Using built-in cheat types: {}", e);
            CheatTypeRegistry::default()
        }
    }
}
