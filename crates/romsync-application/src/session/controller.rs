//! Session lifecycle controller.
//!
//! Owns the mounted session, the runtime subscription and every task spawned
//! on behalf of the session. The sequence after the runtime reports a
//! started game is:
//!
//! 1. wait `game_start_delay`
//! 2. restore the initial save, then the initial state (when supplied)
//! 3. force the runtime's save location to the browser
//! 4. re-fetch cheats
//! 5. after `cheat_apply_delay`, write them into the native cheat table
//!
//! Tearing down cancels all of it. Results that arrive for a session that is
//! no longer mounted are dropped.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use romsync_core::RomsyncError;
use romsync_core::artifact::{ArtifactKind, ArtifactService};
use romsync_core::cheat::{CheatBuffer, CheatService};
use romsync_core::config::PlayerConfig;
use romsync_core::error::Result;
use romsync_core::host::{Notification, PlayerHost};
use romsync_core::runtime::{
    ArtifactCapture, EmulatorRuntime, RuntimeConfig, RuntimeEvent, RuntimeMethod,
    RuntimeMethodKind, SaveLocation, SubscriptionId,
};
use romsync_core::session::{
    RomRef, SelectionRepository, Session, SessionId, SessionPhase, SessionRequest,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::bridge::PersistenceBridge;
use super::timer::PendingSyncTimer;
use crate::bootstrap::RuntimeBootstrap;
use crate::cheat_sync::{CheatSync, apply_to_runtime};
use crate::selection_service::SelectionService;

/// Collaborators of the controller.
#[derive(Clone)]
pub struct SessionServices {
    pub runtime: Arc<dyn EmulatorRuntime>,
    pub cheats: Arc<dyn CheatService>,
    pub artifacts: Arc<dyn ArtifactService>,
    pub selections: Arc<dyn SelectionRepository>,
    pub host: Arc<dyn PlayerHost>,
}

struct LiveSession {
    session: Session,
    config: RuntimeConfig,
    buffer: CheatBuffer,
    bridge: Arc<PersistenceBridge>,
    alive: CancellationToken,
    subscription: Option<SubscriptionId>,
    event_loop: Option<JoinHandle<()>>,
    startup: Option<JoinHandle<()>>,
    game_started: bool,
}

struct ControllerState {
    phase: SessionPhase,
    live: Option<LiveSession>,
}

struct Inner {
    runtime: Arc<dyn EmulatorRuntime>,
    artifacts: Arc<dyn ArtifactService>,
    host: Arc<dyn PlayerHost>,
    bootstrap: RuntimeBootstrap,
    player: PlayerConfig,
    cheat_sync: CheatSync,
    selections: SelectionService,
    timer: PendingSyncTimer,
    cheat_generation: AtomicU64,
    state: Mutex<ControllerState>,
}

/// Drives one embedded runtime through mount, game changes and unmount.
///
/// Dropping the controller unmounts the live session.
pub struct SessionController {
    inner: Arc<Inner>,
}

impl SessionController {
    pub fn new(services: SessionServices, bootstrap: RuntimeBootstrap, player: PlayerConfig) -> Self {
        let cheat_sync = CheatSync::new(
            services.cheats,
            Arc::clone(&services.host),
            player.notification_timeout_ms,
        );
        Self {
            inner: Arc::new(Inner {
                runtime: services.runtime,
                artifacts: services.artifacts,
                host: services.host,
                bootstrap,
                player,
                cheat_sync,
                selections: SelectionService::new(services.selections),
                timer: PendingSyncTimer::new(),
                cheat_generation: AtomicU64::new(0),
                state: Mutex::new(ControllerState {
                    phase: SessionPhase::Uninitialized,
                    live: None,
                }),
            }),
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.inner.state().phase
    }

    /// The mounted session, if any.
    pub fn session(&self) -> Option<Session> {
        self.inner.state().live.as_ref().map(|live| live.session.clone())
    }

    /// Cheat buffer of the mounted session (empty while a refresh runs).
    pub fn cheat_buffer(&self) -> CheatBuffer {
        self.inner
            .state()
            .live
            .as_ref()
            .map(|live| live.buffer.clone())
            .unwrap_or_default()
    }

    /// Configuration last written to the runtime.
    pub fn runtime_config(&self) -> Option<RuntimeConfig> {
        self.inner.state().live.as_ref().map(|live| live.config.clone())
    }

    /// Whether a deferred native cheat apply is waiting to run.
    pub fn has_pending_cheat_apply(&self) -> bool {
        self.inner.timer.is_pending()
    }

    /// Mounts a session for `request`, tearing down any live one first.
    ///
    /// Bootstraps the runtime, remembers the player selection, loads the
    /// cheat list into the runtime configuration, subscribes to runtime
    /// events and launches the runtime.
    ///
    /// # Errors
    ///
    /// - `UnsupportedPlatform` when the platform cannot be bootstrapped
    /// - errors from configuring, subscribing to or launching the runtime;
    ///   a session that fails after bootstrap is torn down again
    /// - `InvalidState` when the session was torn down while mounting
    pub async fn mount(&self, request: SessionRequest) -> Result<SessionId> {
        let inner = &self.inner;
        inner.unmount();

        let config = inner.bootstrap.apply(inner.runtime.as_ref(), &request)?;
        let session = Session::new(request.clone(), config.core.clone());
        let session_id = session.id;
        let alive = CancellationToken::new();

        let bridge = Arc::new(PersistenceBridge::new(
            Arc::clone(&inner.artifacts),
            Arc::clone(&inner.runtime),
            Arc::clone(&inner.host),
            &session,
            alive.clone(),
            inner.player.notification_timeout_ms,
        ));

        tracing::info!(
            "[Controller] Mounting session {} (rom {}, core {})",
            session_id,
            session.rom.id,
            session.core
        );
        {
            let mut state = inner.state();
            state.phase = SessionPhase::Bootstrapped;
            state.live = Some(LiveSession {
                session,
                config,
                buffer: CheatBuffer::empty(),
                bridge,
                alive: alive.clone(),
                subscription: None,
                event_loop: None,
                startup: None,
                game_started: false,
            });
        }

        if let Err(e) = inner.selections.remember(&request).await {
            tracing::warn!("[Controller] Failed to remember player selection: {}", e);
        }

        inner.refresh_cheats(session_id, false).await;
        if alive.is_cancelled() {
            return Err(RomsyncError::invalid_state("session was torn down while mounting"));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let subscription = match inner.runtime.subscribe(tx) {
            Ok(subscription) => subscription,
            Err(e) => {
                inner.unmount_session(session_id);
                return Err(e);
            }
        };
        let event_loop = tokio::spawn(event_loop(
            Arc::downgrade(&self.inner),
            session_id,
            alive.clone(),
            rx,
        ));
        {
            let mut state = inner.state();
            match state.live.as_mut() {
                Some(live) if live.session.id == session_id => {
                    live.subscription = Some(subscription);
                    live.event_loop = Some(event_loop);
                }
                _ => {
                    event_loop.abort();
                    inner.runtime.unsubscribe(subscription);
                    return Err(RomsyncError::invalid_state(
                        "session was torn down while mounting",
                    ));
                }
            }
        }

        if let Err(e) = inner.runtime.launch().await {
            tracing::error!("[Controller] Runtime failed to launch: {}", e);
            inner.host.notify(
                Notification::error("Failed to start the emulator")
                    .with_timeout(inner.player.notification_timeout_ms),
            );
            inner.unmount_session(session_id);
            return Err(e);
        }

        {
            let mut state = inner.state();
            if !state.is_current(session_id) {
                return Err(RomsyncError::invalid_state(
                    "session was torn down while mounting",
                ));
            }
            state.phase = SessionPhase::Running;
        }
        inner.host.set_playing(true);
        tracing::info!("[Controller] Session {} running", session_id);
        Ok(session_id)
    }

    /// Switches the mounted session to another game id without
    /// re-bootstrapping; only the cheats are re-fetched (and re-applied
    /// natively once the game has started). Saves and states pushed from
    /// now on belong to the new game and start without a prior record.
    pub async fn change_game(&self, rom: RomRef) -> Result<()> {
        let session_id = {
            let mut state = self.inner.state();
            let live = state
                .live
                .as_mut()
                .ok_or_else(|| RomsyncError::invalid_state("no session is mounted"))?;
            tracing::info!(
                "[Controller] Game changed {} -> {} in session {}",
                live.session.rom.id,
                rom.id,
                live.session.id
            );
            live.config.game_id = rom.id;
            live.session.rom = rom;
            // Records of the previous game must not be restored or overwritten.
            live.session.initial_save = None;
            live.session.initial_state = None;
            live.bridge = Arc::new(PersistenceBridge::new(
                Arc::clone(&self.inner.artifacts),
                Arc::clone(&self.inner.runtime),
                Arc::clone(&self.inner.host),
                &live.session,
                live.alive.clone(),
                self.inner.player.notification_timeout_ms,
            ));
            live.session.id
        };

        self.inner.refresh_cheats(session_id, true).await;
        Ok(())
    }

    /// Tears the session down. Safe to call any number of times.
    pub fn unmount(&self) {
        self.inner.unmount();
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.inner.unmount();
    }
}

impl ControllerState {
    fn is_current(&self, session_id: SessionId) -> bool {
        self.live
            .as_ref()
            .is_some_and(|live| live.session.id == session_id && !live.alive.is_cancelled())
    }
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn unmount(&self) {
        let live = {
            let mut state = self.state();
            let live = state.live.take();
            if live.is_some() {
                state.phase = SessionPhase::TornDown;
            }
            live
        };
        self.tear_down(live);
    }

    /// Tears down `session_id` only if it is still the mounted session.
    fn unmount_session(&self, session_id: SessionId) {
        let live = {
            let mut state = self.state();
            if !state
                .live
                .as_ref()
                .is_some_and(|live| live.session.id == session_id)
            {
                return;
            }
            state.phase = SessionPhase::TornDown;
            state.live.take()
        };
        self.tear_down(live);
    }

    fn tear_down(&self, live: Option<LiveSession>) {
        self.timer.cancel();
        let Some(mut live) = live else {
            return;
        };

        live.alive.cancel();
        if let Some(startup) = live.startup.take() {
            startup.abort();
        }
        if let Some(event_loop) = live.event_loop.take() {
            event_loop.abort();
        }
        if let Some(subscription) = live.subscription.take() {
            self.runtime.unsubscribe(subscription);
        }
        self.host.set_playing(false);
        self.host.set_fullscreen(false);

        tracing::info!("[Controller] Session {} torn down", live.session.id);
    }

    /// Clears the buffer, fetches the current game's cheats and installs the
    /// result if no newer refresh started meanwhile. With `apply_native` and
    /// a started game, schedules the deferred native apply.
    async fn refresh_cheats(&self, session_id: SessionId, apply_native: bool) {
        let generation = self.cheat_generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.timer.cancel();

        let rom_id = {
            let mut state = self.state();
            if !state.is_current(session_id) {
                return;
            }
            if state.phase == SessionPhase::Running {
                state.phase = SessionPhase::CheatsSyncing;
            }
            let Some(live) = state.live.as_mut() else {
                return;
            };
            live.buffer = CheatBuffer::empty();
            live.session.rom.id
        };

        let buffer = self.cheat_sync.fetch_buffer(rom_id).await;

        let (alive, schedule) = {
            let mut state = self.state();
            if !state.is_current(session_id)
                || self.cheat_generation.load(Ordering::SeqCst) != generation
            {
                tracing::debug!(
                    "[Controller] Dropping stale cheat list #{} for rom {}",
                    generation,
                    rom_id
                );
                return;
            }
            if state.phase == SessionPhase::CheatsSyncing {
                state.phase = SessionPhase::Running;
            }
            let Some(live) = state.live.as_mut() else {
                return;
            };
            live.buffer = buffer.clone();
            live.config.cheats = buffer.clone();
            if let Err(e) = self.runtime.configure(&live.config) {
                tracing::warn!("[Controller] Failed to write cheat list to runtime: {}", e);
            }
            (live.alive.clone(), apply_native && live.game_started)
        };

        if schedule {
            let runtime = Arc::clone(&self.runtime);
            tracing::debug!(
                "[Controller] Scheduling native apply of {} cheats",
                buffer.len()
            );
            self.timer
                .schedule_child(&alive, self.player.cheat_apply_delay(), move |cancel| async move {
                    if let Err(e) = apply_to_runtime(runtime.as_ref(), &buffer, &cancel).await {
                        tracing::warn!("[Controller] Native cheat apply failed: {}", e);
                    }
                });
        }
    }

    /// Post-start sequence; runs in its own task.
    async fn run_startup(self: Arc<Self>, session_id: SessionId) {
        let (bridge, alive, initial_save, initial_state) = {
            let state = self.state();
            if !state.is_current(session_id) {
                return;
            }
            let Some(live) = state.live.as_ref() else {
                return;
            };
            (
                Arc::clone(&live.bridge),
                live.alive.clone(),
                live.session.initial_save.clone(),
                live.session.initial_state.clone(),
            )
        };

        tokio::select! {
            _ = alive.cancelled() => return,
            _ = tokio::time::sleep(self.player.game_start_delay()) => {}
        }

        if let Some(record) = initial_save {
            let outcome = bridge.pull(ArtifactKind::Save, Some(&record)).await;
            tracing::debug!("[Controller] Initial save restore: {:?}", outcome);
        }
        if let Some(record) = initial_state {
            let outcome = bridge.pull(ArtifactKind::State, Some(&record)).await;
            tracing::debug!("[Controller] Initial state restore: {:?}", outcome);
        }
        if alive.is_cancelled() {
            return;
        }

        if self.runtime.supports(RuntimeMethodKind::SetSaveLocation) {
            let method = RuntimeMethod::SetSaveLocation(SaveLocation::Browser);
            if let Err(e) = self.runtime.call(method).await {
                tracing::warn!("[Controller] Failed to set save location: {}", e);
            }
        } else {
            tracing::debug!("[Controller] Save location not configurable yet");
        }

        self.refresh_cheats(session_id, true).await;
    }

    fn handle_event(self: &Arc<Self>, session_id: SessionId, event: RuntimeEvent) {
        let mut state = self.state();
        if !state.is_current(session_id) {
            return;
        }
        let Some(live) = state.live.as_mut() else {
            return;
        };
        match event {
            RuntimeEvent::GameStarted => {
                tracing::info!("[Controller] Game started in session {}", session_id);
                live.game_started = true;
                if let Some(previous) = live.startup.take() {
                    previous.abort();
                }
                live.startup = Some(tokio::spawn(Arc::clone(self).run_startup(session_id)));
            }
            RuntimeEvent::SaveRequested(capture) => {
                spawn_push(&live.bridge, ArtifactKind::Save, capture);
            }
            RuntimeEvent::SaveStateRequested(capture) => {
                spawn_push(&live.bridge, ArtifactKind::State, capture);
            }
            RuntimeEvent::LoadSaveRequested => {
                spawn_pull(&live.bridge, ArtifactKind::Save);
            }
            RuntimeEvent::LoadStateRequested => {
                spawn_pull(&live.bridge, ArtifactKind::State);
            }
        }
    }
}

/// Uploads run detached: they finish even if the session is torn down.
fn spawn_push(bridge: &Arc<PersistenceBridge>, kind: ArtifactKind, capture: ArtifactCapture) {
    let bridge = Arc::clone(bridge);
    tokio::spawn(async move {
        let _ = bridge.push(kind, capture).await;
    });
}

fn spawn_pull(bridge: &Arc<PersistenceBridge>, kind: ArtifactKind) {
    let bridge = Arc::clone(bridge);
    tokio::spawn(async move {
        let outcome = bridge.pull_latest(kind).await;
        tracing::debug!("[Controller] {} load request: {:?}", kind, outcome);
    });
}

async fn event_loop(
    inner: Weak<Inner>,
    session_id: SessionId,
    alive: CancellationToken,
    mut events: mpsc::UnboundedReceiver<RuntimeEvent>,
) {
    loop {
        let event = tokio::select! {
            _ = alive.cancelled() => break,
            event = events.recv() => event,
        };
        let Some(event) = event else {
            tracing::debug!("[Controller] Runtime event channel closed");
            break;
        };
        let Some(controller) = inner.upgrade() else {
            break;
        };
        controller.handle_event(session_id, event);
    }
}
