//! Cheat fetch and native application.
//!
//! Fetching never fails from the caller's point of view: a backend error is
//! logged, surfaced once as a notification and turned into an empty buffer.

use std::sync::Arc;

use romsync_core::cheat::{CheatBuffer, CheatService};
use romsync_core::error::Result;
use romsync_core::host::{Notification, PlayerHost};
use romsync_core::runtime::{EmulatorRuntime, RuntimeMethod, RuntimeMethodKind};
use tokio_util::sync::CancellationToken;

pub struct CheatSync {
    service: Arc<dyn CheatService>,
    host: Arc<dyn PlayerHost>,
    notification_timeout_ms: u64,
}

impl CheatSync {
    pub fn new(
        service: Arc<dyn CheatService>,
        host: Arc<dyn PlayerHost>,
        notification_timeout_ms: u64,
    ) -> Self {
        Self {
            service,
            host,
            notification_timeout_ms,
        }
    }

    /// Fetches a game's cheats and projects them into a buffer.
    pub async fn fetch_buffer(&self, rom_id: i64) -> CheatBuffer {
        match self.service.list(rom_id).await {
            Ok(cheats) => {
                tracing::debug!("[CheatSync] Fetched {} cheats for rom {}", cheats.len(), rom_id);
                CheatBuffer::from_cheats(&cheats)
            }
            Err(e) => {
                tracing::warn!("[CheatSync] Failed to fetch cheats for rom {}: {}", rom_id, e);
                self.host.notify(
                    Notification::error("Failed to load cheats").with_timeout(self.notification_timeout_ms),
                );
                CheatBuffer::empty()
            }
        }
    }
}

/// Writes a buffer into the runtime's native cheat table: reset, then one
/// disabled entry per slot in buffer order.
///
/// Returns `Ok(false)` without touching the runtime when it does not expose
/// the cheat-table methods yet, or when `cancel` fires before the first call.
/// Stops between calls once `cancel` fires.
pub async fn apply_to_runtime(
    runtime: &dyn EmulatorRuntime,
    buffer: &CheatBuffer,
    cancel: &CancellationToken,
) -> Result<bool> {
    if !runtime.supports(RuntimeMethodKind::ResetCheatTable)
        || !runtime.supports(RuntimeMethodKind::SetCheat)
    {
        tracing::debug!("[CheatSync] Native cheat table not available, skipping apply");
        return Ok(false);
    }
    if cancel.is_cancelled() {
        return Ok(false);
    }

    runtime.call(RuntimeMethod::ResetCheatTable).await?;
    for (index, slot) in buffer.indexed() {
        if cancel.is_cancelled() {
            tracing::debug!("[CheatSync] Apply cancelled after {} of {} cheats", index, buffer.len());
            return Ok(true);
        }
        runtime
            .call(RuntimeMethod::SetCheat {
                index,
                enabled: false,
                code: slot.code.clone(),
            })
            .await?;
    }

    tracing::debug!("[CheatSync] Applied {} cheats to runtime", buffer.len());
    Ok(true)
}
