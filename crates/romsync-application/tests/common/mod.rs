#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use romsync_application::{RuntimeBootstrap, SessionController, SessionServices};
use romsync_core::RomsyncError;
use romsync_core::artifact::{ArtifactKind, ArtifactRecord, ArtifactService, PushRequest};
use romsync_core::cheat::{CheatCode, CheatDraft, CheatService};
use romsync_core::config::PlayerConfig;
use romsync_core::error::Result;
use romsync_core::host::{Notification, NotificationLevel, PlayerHost};
use romsync_core::runtime::{
    EmulatorRuntime, EventSender, RuntimeConfig, RuntimeEvent, RuntimeMethod, RuntimeMethodKind,
    RuntimeReply, SubscriptionId,
};
use romsync_core::session::{RomRef, SelectionKey, SelectionRepository};

// ---------------------------------------------------------------------------
// Runtime
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MockRuntime {
    pub configs: Mutex<Vec<RuntimeConfig>>,
    pub calls: Mutex<Vec<RuntimeMethod>>,
    pub unsubscribed: Mutex<Vec<SubscriptionId>>,
    pub launches: AtomicUsize,
    pub unsupported: Mutex<HashSet<RuntimeMethodKind>>,
    pub selected_file: Mutex<Option<Vec<u8>>>,
    pub failing_launch: AtomicBool,
    sender: Mutex<Option<EventSender>>,
    next_subscription: AtomicU64,
}

impl MockRuntime {
    pub fn emit(&self, event: RuntimeEvent) {
        let sender = self.sender.lock().unwrap().clone();
        sender
            .expect("runtime has no subscriber")
            .send(event)
            .expect("event loop is gone");
    }

    pub fn disable(&self, kind: RuntimeMethodKind) {
        self.unsupported.lock().unwrap().insert(kind);
    }

    pub fn select_file(&self, bytes: Option<Vec<u8>>) {
        *self.selected_file.lock().unwrap() = bytes;
    }

    pub fn subscriptions(&self) -> u64 {
        self.next_subscription.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<RuntimeMethod> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_of(&self, kind: RuntimeMethodKind) -> Vec<RuntimeMethod> {
        self.calls()
            .into_iter()
            .filter(|call| call.kind() == kind)
            .collect()
    }

    /// Native cheat-table calls in order.
    pub fn cheat_table_calls(&self) -> Vec<RuntimeMethod> {
        self.calls()
            .into_iter()
            .filter(|call| {
                matches!(
                    call.kind(),
                    RuntimeMethodKind::ResetCheatTable | RuntimeMethodKind::SetCheat
                )
            })
            .collect()
    }

    pub fn last_config(&self) -> RuntimeConfig {
        self.configs
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("runtime was never configured")
    }
}

#[async_trait]
impl EmulatorRuntime for MockRuntime {
    fn configure(&self, config: &RuntimeConfig) -> Result<()> {
        self.configs.lock().unwrap().push(config.clone());
        Ok(())
    }

    fn subscribe(&self, events: EventSender) -> Result<SubscriptionId> {
        *self.sender.lock().unwrap() = Some(events);
        let id = self.next_subscription.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(SubscriptionId(id))
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.unsubscribed.lock().unwrap().push(id);
    }

    async fn launch(&self) -> Result<()> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        if self.failing_launch.load(Ordering::SeqCst) {
            return Err(RomsyncError::RuntimeUnavailable("emulator failed to boot".to_string()));
        }
        Ok(())
    }

    fn supports(&self, method: RuntimeMethodKind) -> bool {
        !self.unsupported.lock().unwrap().contains(&method)
    }

    async fn call(&self, method: RuntimeMethod) -> Result<RuntimeReply> {
        let reply = match &method {
            RuntimeMethod::SelectFile => {
                RuntimeReply::Bytes(self.selected_file.lock().unwrap().clone())
            }
            RuntimeMethod::CurrentSave | RuntimeMethod::CurrentState | RuntimeMethod::Screenshot => {
                RuntimeReply::Bytes(None)
            }
            _ => RuntimeReply::Unit,
        };
        self.calls.lock().unwrap().push(method);
        Ok(reply)
    }
}

// ---------------------------------------------------------------------------
// Cheats
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MockCheats {
    lists: Mutex<HashMap<i64, Vec<CheatCode>>>,
    delays: Mutex<HashMap<i64, Duration>>,
    pub failing: Mutex<bool>,
    pub requests: Mutex<Vec<i64>>,
}

impl MockCheats {
    pub fn set(&self, rom_id: i64, cheats: Vec<CheatCode>) {
        self.lists.lock().unwrap().insert(rom_id, cheats);
    }

    pub fn delay(&self, rom_id: i64, delay: Duration) {
        self.delays.lock().unwrap().insert(rom_id, delay);
    }

    pub fn fail(&self) {
        *self.failing.lock().unwrap() = true;
    }
}

#[async_trait]
impl CheatService for MockCheats {
    async fn list(&self, rom_id: i64) -> Result<Vec<CheatCode>> {
        self.requests.lock().unwrap().push(rom_id);
        let delay = self.delays.lock().unwrap().get(&rom_id).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if *self.failing.lock().unwrap() {
            return Err(RomsyncError::network(None, "connection refused"));
        }
        Ok(self
            .lists
            .lock()
            .unwrap()
            .get(&rom_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn create(&self, _: i64, _: &CheatDraft) -> Result<CheatCode> {
        Err(RomsyncError::internal("not used"))
    }

    async fn update(&self, _: i64, _: i64, _: &CheatDraft) -> Result<CheatCode> {
        Err(RomsyncError::internal("not used"))
    }

    async fn delete(&self, _: i64, _: i64) -> Result<()> {
        Err(RomsyncError::internal("not used"))
    }
}

// ---------------------------------------------------------------------------
// Artifacts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedPush {
    pub kind: ArtifactKind,
    pub rom_id: i64,
    pub prior: Option<i64>,
    pub file_name: String,
    pub emulator: Option<String>,
    pub data: Vec<u8>,
}

#[derive(Default)]
pub struct MockArtifacts {
    blobs: Mutex<HashMap<i64, Result<Option<Vec<u8>>>>>,
    pub fetch_delay: Mutex<Option<Duration>>,
    pub failing_push: Mutex<bool>,
    pub fetches: Mutex<Vec<(ArtifactKind, i64)>>,
    pub pushes: Mutex<Vec<RecordedPush>>,
    pub timeline: Mutex<Vec<String>>,
    next_id: AtomicI64,
}

impl MockArtifacts {
    pub fn new() -> Self {
        let artifacts = Self::default();
        artifacts.next_id.store(100, Ordering::SeqCst);
        artifacts
    }

    pub fn store(&self, record_id: i64, response: Result<Option<Vec<u8>>>) {
        self.blobs.lock().unwrap().insert(record_id, response);
    }

    pub fn fail_pushes(&self) {
        *self.failing_push.lock().unwrap() = true;
    }

    pub fn fetches(&self) -> Vec<(ArtifactKind, i64)> {
        self.fetches.lock().unwrap().clone()
    }

    pub fn pushes(&self) -> Vec<RecordedPush> {
        self.pushes.lock().unwrap().clone()
    }

    pub fn timeline(&self) -> Vec<String> {
        self.timeline.lock().unwrap().clone()
    }
}

#[async_trait]
impl ArtifactService for MockArtifacts {
    async fn fetch(&self, kind: ArtifactKind, record: &ArtifactRecord) -> Result<Option<Vec<u8>>> {
        self.fetches.lock().unwrap().push((kind, record.id));
        self.timeline.lock().unwrap().push(format!("fetch:{}:start", kind));
        let delay = *self.fetch_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.timeline.lock().unwrap().push(format!("fetch:{}:end", kind));
        self.blobs
            .lock()
            .unwrap()
            .get(&record.id)
            .cloned()
            .unwrap_or(Ok(None))
    }

    async fn push(&self, request: PushRequest<'_>) -> Result<ArtifactRecord> {
        self.timeline.lock().unwrap().push(format!("push:{}", request.kind));
        self.pushes.lock().unwrap().push(RecordedPush {
            kind: request.kind,
            rom_id: request.rom_id,
            prior: request.prior.map(|r| r.id),
            file_name: request.file_name.to_string(),
            emulator: request.emulator.map(str::to_string),
            data: request.artifact.data.clone(),
        });
        if *self.failing_push.lock().unwrap() {
            return Err(RomsyncError::network(Some(500), "upload failed"));
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(record(request.kind, id, request.rom_id))
    }
}

// ---------------------------------------------------------------------------
// Host and selections
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MockHost {
    pub notifications: Mutex<Vec<Notification>>,
    pub playing: Mutex<Vec<bool>>,
    pub fullscreen: Mutex<Vec<bool>>,
}

impl MockHost {
    pub fn count(&self, level: NotificationLevel) -> usize {
        self.notifications
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.level == level)
            .count()
    }
}

impl PlayerHost for MockHost {
    fn notify(&self, notification: Notification) {
        self.notifications.lock().unwrap().push(notification);
    }

    fn set_playing(&self, playing: bool) {
        self.playing.lock().unwrap().push(playing);
    }

    fn set_fullscreen(&self, fullscreen: bool) {
        self.fullscreen.lock().unwrap().push(fullscreen);
    }
}

#[derive(Default)]
pub struct MemorySelections(pub Mutex<HashMap<String, String>>);

#[async_trait]
impl SelectionRepository for MemorySelections {
    async fn get(&self, key: &SelectionKey) -> Result<Option<String>> {
        Ok(self.0.lock().unwrap().get(&key.storage_key()).cloned())
    }

    async fn set(&self, key: &SelectionKey, value: Option<String>) -> Result<()> {
        let mut map = self.0.lock().unwrap();
        match value {
            Some(v) => map.insert(key.storage_key(), v),
            None => map.remove(&key.storage_key()),
        };
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub struct Harness {
    pub controller: SessionController,
    pub runtime: Arc<MockRuntime>,
    pub cheats: Arc<MockCheats>,
    pub artifacts: Arc<MockArtifacts>,
    pub selections: Arc<MemorySelections>,
    pub host: Arc<MockHost>,
}

pub fn harness() -> Harness {
    let runtime = Arc::new(MockRuntime::default());
    let cheats = Arc::new(MockCheats::default());
    let artifacts = Arc::new(MockArtifacts::new());
    let selections = Arc::new(MemorySelections::default());
    let host = Arc::new(MockHost::default());

    let player = PlayerConfig::default();
    let services = SessionServices {
        runtime: runtime.clone(),
        cheats: cheats.clone(),
        artifacts: artifacts.clone(),
        selections: selections.clone(),
        host: host.clone(),
    };
    let controller = SessionController::new(
        services,
        RuntimeBootstrap::new("http://localhost:8080", player.clone()),
        player,
    );

    Harness {
        controller,
        runtime,
        cheats,
        artifacts,
        selections,
        host,
    }
}

pub fn rom(id: i64) -> RomRef {
    RomRef {
        id,
        name: format!("Game {}", id),
        file_name: format!("game-{}.nes", id),
        platform_slug: "nes".to_string(),
    }
}

pub fn cheat(id: i64, rom_id: i64, name: &str, code: &str) -> CheatCode {
    CheatCode {
        id,
        rom_id,
        name: name.to_string(),
        code: code.to_string(),
        description: None,
        cheat_type: "game_genie".to_string(),
    }
}

pub fn zelda_cheats(rom_id: i64) -> Vec<CheatCode> {
    vec![
        cheat(1, rom_id, "Infinite Lives", "SXYIZVSE"),
        cheat(2, rom_id, "Invincibility", "AEKZZZIA"),
    ]
}

pub fn record(kind: ArtifactKind, id: i64, rom_id: i64) -> ArtifactRecord {
    let ext = kind.local_extension();
    ArtifactRecord {
        id,
        rom_id,
        file_name: format!("game-{}.{}", rom_id, ext),
        download_path: format!("/api/{}/{}/content/game-{}.{}", kind.collection(), id, rom_id, ext),
        emulator: Some("fceumm".to_string()),
        updated_at: None,
    }
}

pub fn set_cheat(index: usize, code: &str) -> RuntimeMethod {
    RuntimeMethod::SetCheat {
        index,
        enabled: false,
        code: code.to_string(),
    }
}

pub async fn advance(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}
