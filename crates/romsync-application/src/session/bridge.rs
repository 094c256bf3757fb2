//! Save/state transfer between the backend and the runtime.
//!
//! One bridge exists per mounted session. Pulls and pushes of the same
//! artifact kind are serialized through a per-kind gate; the two kinds are
//! independent of each other.

use std::sync::{Arc, Mutex, PoisonError};

use romsync_core::artifact::{ArtifactKind, ArtifactRecord, ArtifactService, PushRequest};
use romsync_core::error::Result;
use romsync_core::host::{Notification, PlayerHost};
use romsync_core::runtime::{
    ArtifactCapture, EmulatorRuntime, RuntimeMethod, RuntimeMethodKind,
};
use romsync_core::session::Session;
use tokio_util::sync::CancellationToken;

/// How a pull ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullOutcome {
    /// Server blob handed to the runtime.
    Loaded,
    /// Server had nothing; a user-picked file was loaded instead.
    LoadedFromFile,
    /// Server had nothing and the user picked no file.
    NothingSelected,
    /// The runtime does not expose the needed method yet.
    Unavailable,
    /// Backend or runtime call failed; already reported to the user.
    Failed,
    /// The session ended while the pull was in flight.
    Discarded,
}

struct KindSlot {
    gate: tokio::sync::Mutex<()>,
    last: Mutex<Option<ArtifactRecord>>,
}

impl KindSlot {
    fn with_record(record: Option<ArtifactRecord>) -> Self {
        Self {
            gate: tokio::sync::Mutex::new(()),
            last: Mutex::new(record),
        }
    }

    fn last(&self) -> Option<ArtifactRecord> {
        self.last.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn set_last(&self, record: ArtifactRecord) {
        *self.last.lock().unwrap_or_else(PoisonError::into_inner) = Some(record);
    }
}

/// Pull-on-demand and push-on-event for saves and states.
pub struct PersistenceBridge {
    artifacts: Arc<dyn ArtifactService>,
    runtime: Arc<dyn EmulatorRuntime>,
    host: Arc<dyn PlayerHost>,
    rom_id: i64,
    core: String,
    session_alive: CancellationToken,
    notification_timeout_ms: u64,
    save: KindSlot,
    state: KindSlot,
}

impl PersistenceBridge {
    /// Creates the bridge of `session`. `session_alive` is cancelled when the
    /// session is torn down; pulls finishing afterwards are discarded.
    pub fn new(
        artifacts: Arc<dyn ArtifactService>,
        runtime: Arc<dyn EmulatorRuntime>,
        host: Arc<dyn PlayerHost>,
        session: &Session,
        session_alive: CancellationToken,
        notification_timeout_ms: u64,
    ) -> Self {
        Self {
            artifacts,
            runtime,
            host,
            rom_id: session.rom.id,
            core: session.core.clone(),
            session_alive,
            notification_timeout_ms,
            save: KindSlot::with_record(session.initial_save.clone()),
            state: KindSlot::with_record(session.initial_state.clone()),
        }
    }

    fn slot(&self, kind: ArtifactKind) -> &KindSlot {
        match kind {
            ArtifactKind::Save => &self.save,
            ArtifactKind::State => &self.state,
        }
    }

    /// Latest server record known for `kind`: the initial one from the
    /// session request, or the result of the last successful push.
    pub fn last_record(&self, kind: ArtifactKind) -> Option<ArtifactRecord> {
        self.slot(kind).last()
    }

    /// Pulls the latest known record of `kind`, falling back to file
    /// selection when there is none.
    pub async fn pull_latest(&self, kind: ArtifactKind) -> PullOutcome {
        let record = self.last_record(kind);
        self.pull(kind, record.as_ref()).await
    }

    /// Server → runtime.
    ///
    /// A non-empty server blob is loaded directly. Anything else (no record,
    /// 404, empty body) prompts for a local file. A backend error is reported
    /// and does not prompt.
    pub async fn pull(&self, kind: ArtifactKind, record: Option<&ArtifactRecord>) -> PullOutcome {
        let _gate = self.slot(kind).gate.lock().await;
        if self.session_alive.is_cancelled() {
            return PullOutcome::Discarded;
        }

        let fetched = match record {
            Some(record) => {
                tracing::debug!(
                    "[PersistenceBridge] Fetching {} {} for rom {}",
                    kind,
                    record.id,
                    self.rom_id
                );
                self.artifacts.fetch(kind, record).await
            }
            None => Ok(None),
        };
        if self.session_alive.is_cancelled() {
            tracing::debug!("[PersistenceBridge] Session ended, dropping fetched {}", kind);
            return PullOutcome::Discarded;
        }

        match fetched {
            Ok(Some(bytes)) if !bytes.is_empty() => match self.load(kind, bytes).await {
                PullOutcome::Loaded => {
                    self.toast(Notification::success(format!("{} loaded from server", kind.label())));
                    PullOutcome::Loaded
                }
                other => other,
            },
            Ok(_) => self.load_from_file(kind).await,
            Err(e) => {
                tracing::warn!("[PersistenceBridge] Failed to fetch {}: {}", kind, e);
                self.toast(Notification::error(format!("Failed to load {}", kind)));
                PullOutcome::Failed
            }
        }
    }

    async fn load_from_file(&self, kind: ArtifactKind) -> PullOutcome {
        if !self.runtime.supports(RuntimeMethodKind::SelectFile) {
            tracing::debug!("[PersistenceBridge] File selection not available");
            return PullOutcome::Unavailable;
        }

        let picked = match self.runtime.call(RuntimeMethod::SelectFile).await {
            Ok(reply) => reply.into_bytes(),
            Err(e) => {
                tracing::warn!("[PersistenceBridge] File selection failed: {}", e);
                self.toast(Notification::error(format!("Failed to load {}", kind)));
                return PullOutcome::Failed;
            }
        };
        if self.session_alive.is_cancelled() {
            return PullOutcome::Discarded;
        }

        match picked {
            Some(bytes) => match self.load(kind, bytes).await {
                PullOutcome::Loaded => PullOutcome::LoadedFromFile,
                other => other,
            },
            None => PullOutcome::NothingSelected,
        }
    }

    async fn load(&self, kind: ArtifactKind, bytes: Vec<u8>) -> PullOutcome {
        if !self.runtime.supports(RuntimeMethodKind::load(kind)) {
            tracing::debug!("[PersistenceBridge] Runtime cannot load {} yet", kind);
            return PullOutcome::Unavailable;
        }
        match self.runtime.call(RuntimeMethod::load(kind, bytes)).await {
            Ok(_) => PullOutcome::Loaded,
            Err(e) => {
                tracing::warn!("[PersistenceBridge] Runtime rejected {}: {}", kind, e);
                self.toast(Notification::error(format!("Failed to load {}", kind)));
                PullOutcome::Failed
            }
        }
    }

    /// Runtime → server.
    ///
    /// Uploads the capture (overwriting the last known record when there is
    /// one), then writes the raw blob into the runtime's local storage whether
    /// or not the upload worked. Failures are reported, never retried, and
    /// leave the last known record untouched.
    pub async fn push(&self, kind: ArtifactKind, capture: ArtifactCapture) -> Result<ArtifactRecord> {
        let slot = self.slot(kind);
        let _gate = slot.gate.lock().await;

        let prior = slot.last();
        let file_name = format!("{}.{}", capture.base_name, kind.local_extension());
        let request = PushRequest {
            kind,
            rom_id: self.rom_id,
            emulator: Some(self.core.as_str()),
            prior: prior.as_ref(),
            file_name: &file_name,
            artifact: &capture.artifact,
        };

        let uploaded = self.artifacts.push(request).await;
        self.write_local_copy(&file_name, capture.artifact.data).await;

        match uploaded {
            Ok(record) => {
                tracing::info!(
                    "[PersistenceBridge] Uploaded {} {} for rom {}",
                    kind,
                    record.id,
                    self.rom_id
                );
                slot.set_last(record.clone());
                self.toast(Notification::success(format!("{} uploaded", kind.label())));
                Ok(record)
            }
            Err(e) => {
                tracing::error!(
                    "[PersistenceBridge] Failed to upload {} for rom {}: {}",
                    kind,
                    self.rom_id,
                    e
                );
                self.toast(Notification::error(format!("Failed to upload {}", kind)));
                Err(e)
            }
        }
    }

    async fn write_local_copy(&self, key: &str, data: Vec<u8>) {
        if !self.runtime.supports(RuntimeMethodKind::WriteLocalStorage) {
            tracing::debug!("[PersistenceBridge] Local storage not available for {}", key);
            return;
        }
        let method = RuntimeMethod::WriteLocalStorage {
            key: key.to_string(),
            data,
        };
        if let Err(e) = self.runtime.call(method).await {
            tracing::warn!("[PersistenceBridge] Failed to write local copy {}: {}", key, e);
        }
    }

    fn toast(&self, notification: Notification) {
        self.host
            .notify(notification.with_timeout(self.notification_timeout_ms));
    }
}
