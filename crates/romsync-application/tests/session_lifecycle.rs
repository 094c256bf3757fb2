mod common;

use common::*;
use romsync_core::RomsyncError;
use romsync_core::artifact::{Artifact, ArtifactKind};
use romsync_core::cheat::CheatSlot;
use romsync_core::host::NotificationLevel;
use romsync_core::runtime::{
    ArtifactCapture, RuntimeEvent, RuntimeMethod, RuntimeMethodKind, SaveLocation,
};
use romsync_core::session::{SelectionKey, SelectionRepository, SessionPhase, SessionRequest};
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn mount_bootstraps_subscribes_and_runs() {
    let h = harness();
    h.cheats.set(1, zelda_cheats(1));

    h.controller
        .mount(SessionRequest::new(rom(1)).with_core("nestopia"))
        .await
        .unwrap();

    assert_eq!(h.controller.phase(), SessionPhase::Running);
    assert_eq!(h.runtime.subscriptions(), 1);
    assert_eq!(h.runtime.launches.load(std::sync::atomic::Ordering::SeqCst), 1);
    assert_eq!(*h.host.playing.lock().unwrap(), vec![true]);

    let configs = h.runtime.configs.lock().unwrap().clone();
    assert!(configs[0].cheats.is_empty());
    assert_eq!(configs[0].core, "nestopia");
    let last = configs.last().unwrap();
    assert_eq!(
        last.cheats.slots(),
        [
            CheatSlot::new("Infinite Lives", "SXYIZVSE"),
            CheatSlot::new("Invincibility", "AEKZZZIA"),
        ]
    );

    assert_eq!(
        h.selections.get(&SelectionKey::core("nes")).await.unwrap().as_deref(),
        Some("nestopia")
    );
    assert!(h.runtime.cheat_table_calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn game_started_applies_cheats_in_order() {
    let h = harness();
    h.cheats.set(1, zelda_cheats(1));
    h.controller.mount(SessionRequest::new(rom(1))).await.unwrap();

    h.runtime.emit(RuntimeEvent::GameStarted);

    advance(1500).await;
    assert_eq!(
        h.runtime.calls_of(RuntimeMethodKind::SetSaveLocation),
        vec![RuntimeMethod::SetSaveLocation(SaveLocation::Browser)]
    );
    assert!(h.runtime.cheat_table_calls().is_empty());
    assert!(h.controller.has_pending_cheat_apply());

    advance(1000).await;
    assert_eq!(
        h.runtime.cheat_table_calls(),
        vec![
            RuntimeMethod::ResetCheatTable,
            set_cheat(0, "SXYIZVSE"),
            set_cheat(1, "AEKZZZIA"),
        ]
    );
    assert!(!h.controller.has_pending_cheat_apply());
    assert_eq!(h.controller.phase(), SessionPhase::Running);
}

#[tokio::test(start_paused = true)]
async fn unmount_before_timer_fires_prevents_native_writes() {
    let h = harness();
    h.cheats.set(1, zelda_cheats(1));
    h.controller.mount(SessionRequest::new(rom(1))).await.unwrap();

    h.runtime.emit(RuntimeEvent::GameStarted);
    advance(1500).await;
    assert!(h.controller.has_pending_cheat_apply());

    h.controller.unmount();
    advance(5000).await;

    assert!(h.runtime.cheat_table_calls().is_empty());
    assert_eq!(h.controller.phase(), SessionPhase::TornDown);
}

#[tokio::test(start_paused = true)]
async fn unmount_during_start_delay_skips_restore() {
    let h = harness();
    h.artifacts.store(10, Ok(Some(vec![1, 2, 3])));
    h.controller
        .mount(SessionRequest::new(rom(1)).with_initial_save(record(ArtifactKind::Save, 10, 1)))
        .await
        .unwrap();

    h.runtime.emit(RuntimeEvent::GameStarted);
    advance(500).await;
    h.controller.unmount();
    advance(5000).await;

    assert!(h.artifacts.fetches().is_empty());
    assert!(h.runtime.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn second_apply_replaces_pending_one() {
    let h = harness();
    h.cheats.set(1, zelda_cheats(1));
    h.cheats.set(2, vec![cheat(9, 2, "Max Rupees", "ZEXPYGLA")]);
    h.controller.mount(SessionRequest::new(rom(1))).await.unwrap();

    h.runtime.emit(RuntimeEvent::GameStarted);
    advance(1500).await;
    h.controller.change_game(rom(2)).await.unwrap();

    advance(3000).await;
    assert_eq!(
        h.runtime.cheat_table_calls(),
        vec![RuntimeMethod::ResetCheatTable, set_cheat(0, "ZEXPYGLA")]
    );
}

#[tokio::test(start_paused = true)]
async fn rapid_game_changes_keep_only_latest_list() {
    let h = harness();
    h.cheats.set(2, zelda_cheats(2));
    h.cheats.delay(2, Duration::from_millis(500));
    h.cheats.set(3, vec![cheat(9, 3, "Moon Jump", "AAAAAAAA")]);
    h.controller.mount(SessionRequest::new(rom(1))).await.unwrap();

    let (first, second) = tokio::join!(
        h.controller.change_game(rom(2)),
        h.controller.change_game(rom(3)),
    );
    first.unwrap();
    second.unwrap();

    let expected = [CheatSlot::new("Moon Jump", "AAAAAAAA")];
    assert_eq!(h.controller.cheat_buffer().slots(), expected);
    assert_eq!(h.runtime.last_config().cheats.slots(), expected);
    assert_eq!(h.runtime.last_config().game_id, 3);
    assert_eq!(h.controller.phase(), SessionPhase::Running);
}

#[tokio::test(start_paused = true)]
async fn change_game_before_start_only_updates_config() {
    let h = harness();
    h.cheats.set(2, zelda_cheats(2));
    h.controller.mount(SessionRequest::new(rom(1))).await.unwrap();

    h.controller.change_game(rom(2)).await.unwrap();
    advance(3000).await;

    assert_eq!(h.controller.cheat_buffer().len(), 2);
    assert!(h.runtime.cheat_table_calls().is_empty());
    assert_eq!(*h.cheats.requests.lock().unwrap(), vec![1, 2]);
}

#[tokio::test(start_paused = true)]
async fn cheat_fetch_error_degrades_to_empty_buffer() {
    let h = harness();
    h.cheats.fail();

    h.controller.mount(SessionRequest::new(rom(1))).await.unwrap();

    assert_eq!(h.controller.phase(), SessionPhase::Running);
    assert!(h.controller.cheat_buffer().is_empty());
    assert_eq!(h.host.count(NotificationLevel::Error), 1);
}

#[tokio::test(start_paused = true)]
async fn mount_without_artifacts_pulls_nothing() {
    let h = harness();
    h.controller.mount(SessionRequest::new(rom(1))).await.unwrap();

    h.runtime.emit(RuntimeEvent::GameStarted);
    advance(3000).await;

    assert!(h.artifacts.fetches().is_empty());
    assert!(h.runtime.calls_of(RuntimeMethodKind::SelectFile).is_empty());
    assert!(h.runtime.calls_of(RuntimeMethodKind::LoadSave).is_empty());
    assert!(h.runtime.calls_of(RuntimeMethodKind::LoadState).is_empty());
}

#[tokio::test(start_paused = true)]
async fn mount_with_save_and_state_restores_both_in_order() {
    let h = harness();
    h.artifacts.store(10, Ok(Some(vec![0xAA])));
    h.artifacts.store(11, Ok(Some(vec![0xBB])));
    let request = SessionRequest::new(rom(1))
        .with_initial_save(record(ArtifactKind::Save, 10, 1))
        .with_initial_state(record(ArtifactKind::State, 11, 1));
    h.controller.mount(request).await.unwrap();

    h.runtime.emit(RuntimeEvent::GameStarted);
    advance(999).await;
    assert!(h.artifacts.fetches().is_empty());

    advance(500).await;
    assert_eq!(
        h.artifacts.fetches(),
        vec![(ArtifactKind::Save, 10), (ArtifactKind::State, 11)]
    );
    let loads: Vec<_> = h
        .runtime
        .calls()
        .into_iter()
        .filter(|c| matches!(c, RuntimeMethod::LoadSave(_) | RuntimeMethod::LoadState(_)))
        .collect();
    assert_eq!(
        loads,
        vec![RuntimeMethod::LoadSave(vec![0xAA]), RuntimeMethod::LoadState(vec![0xBB])]
    );
    assert_eq!(h.host.count(NotificationLevel::Success), 2);
}

#[tokio::test(start_paused = true)]
async fn save_events_push_with_prior_record() {
    let h = harness();
    h.controller
        .mount(SessionRequest::new(rom(1)).with_initial_save(record(ArtifactKind::Save, 10, 1)))
        .await
        .unwrap();

    let capture = |byte: u8| ArtifactCapture {
        artifact: Artifact::new(vec![byte]).with_screenshot(vec![0x89]),
        base_name: "game-1".to_string(),
    };
    h.runtime.emit(RuntimeEvent::SaveRequested(capture(1)));
    advance(10).await;
    h.runtime.emit(RuntimeEvent::SaveRequested(capture(2)));
    advance(10).await;

    let pushes = h.artifacts.pushes();
    assert_eq!(pushes.len(), 2);
    assert_eq!(pushes[0].prior, Some(10));
    assert_eq!(pushes[0].file_name, "game-1.srm");
    assert_eq!(pushes[0].emulator.as_deref(), Some("fceumm"));
    assert_eq!(pushes[1].prior, Some(101));

    assert_eq!(
        h.runtime.calls_of(RuntimeMethodKind::WriteLocalStorage),
        vec![
            RuntimeMethod::WriteLocalStorage {
                key: "game-1.srm".to_string(),
                data: vec![1],
            },
            RuntimeMethod::WriteLocalStorage {
                key: "game-1.srm".to_string(),
                data: vec![2],
            },
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn push_started_before_unmount_still_completes() {
    let h = harness();
    h.controller.mount(SessionRequest::new(rom(1))).await.unwrap();

    h.runtime.emit(RuntimeEvent::SaveStateRequested(ArtifactCapture {
        artifact: Artifact::new(vec![5]),
        base_name: "game-1".to_string(),
    }));
    advance(1).await;
    h.controller.unmount();
    advance(10).await;

    let pushes = h.artifacts.pushes();
    assert_eq!(pushes.len(), 1);
    assert_eq!(pushes[0].kind, ArtifactKind::State);
    assert_eq!(pushes[0].file_name, "game-1.state");
}

#[tokio::test(start_paused = true)]
async fn load_state_without_record_prompts_for_file() {
    let h = harness();
    h.runtime.select_file(Some(vec![7, 7]));
    h.controller.mount(SessionRequest::new(rom(1))).await.unwrap();

    h.runtime.emit(RuntimeEvent::LoadStateRequested);
    advance(10).await;

    assert!(h.artifacts.fetches().is_empty());
    assert_eq!(
        h.runtime.calls(),
        vec![RuntimeMethod::SelectFile, RuntimeMethod::LoadState(vec![7, 7])]
    );
}

#[tokio::test(start_paused = true)]
async fn missing_cheat_table_is_skipped_silently() {
    let h = harness();
    h.cheats.set(1, zelda_cheats(1));
    h.runtime.disable(RuntimeMethodKind::ResetCheatTable);
    h.controller.mount(SessionRequest::new(rom(1))).await.unwrap();

    h.runtime.emit(RuntimeEvent::GameStarted);
    advance(3000).await;

    assert!(h.runtime.cheat_table_calls().is_empty());
    assert_eq!(h.host.count(NotificationLevel::Error), 0);
}

#[tokio::test(start_paused = true)]
async fn unmount_is_idempotent() {
    let h = harness();
    h.controller.mount(SessionRequest::new(rom(1))).await.unwrap();

    h.controller.unmount();
    h.controller.unmount();

    assert_eq!(h.runtime.unsubscribed.lock().unwrap().len(), 1);
    assert_eq!(*h.host.playing.lock().unwrap(), vec![true, false]);
    assert_eq!(*h.host.fullscreen.lock().unwrap(), vec![false]);
    assert_eq!(h.controller.phase(), SessionPhase::TornDown);
    assert!(h.controller.session().is_none());
}

#[tokio::test(start_paused = true)]
async fn mounting_again_tears_down_prior_session() {
    let h = harness();
    let first = h.controller.mount(SessionRequest::new(rom(1))).await.unwrap();
    let second = h.controller.mount(SessionRequest::new(rom(2))).await.unwrap();

    assert_ne!(first, second);
    assert_eq!(h.runtime.subscriptions(), 2);
    assert_eq!(h.runtime.unsubscribed.lock().unwrap().len(), 1);
    assert_eq!(h.controller.session().unwrap().rom.id, 2);
    assert_eq!(h.controller.phase(), SessionPhase::Running);
    assert_eq!(h.runtime.last_config().game_id, 2);
}

#[tokio::test(start_paused = true)]
async fn unknown_platform_is_rejected_before_configuring() {
    let h = harness();
    let mut rom = rom(1);
    rom.platform_slug = "unknown-console".to_string();

    let err = h.controller.mount(SessionRequest::new(rom)).await.unwrap_err();

    assert!(matches!(err, RomsyncError::UnsupportedPlatform(_)));
    assert_eq!(h.controller.phase(), SessionPhase::Uninitialized);
    assert!(h.runtime.configs.lock().unwrap().is_empty());
    assert_eq!(h.runtime.subscriptions(), 0);
}

#[tokio::test(start_paused = true)]
async fn change_game_without_session_is_invalid() {
    let h = harness();
    let err = h.controller.change_game(rom(1)).await.unwrap_err();
    assert!(matches!(err, RomsyncError::InvalidState(_)));
}

#[tokio::test(start_paused = true)]
async fn changed_game_uploads_under_new_identity() {
    let h = harness();
    h.controller
        .mount(
            SessionRequest::new(rom(1))
                .with_initial_save(record(ArtifactKind::Save, 10, 1))
                .with_initial_state(record(ArtifactKind::State, 20, 1)),
        )
        .await
        .unwrap();

    h.controller.change_game(rom(2)).await.unwrap();
    h.runtime.emit(RuntimeEvent::SaveRequested(ArtifactCapture {
        artifact: Artifact::new(vec![9]),
        base_name: "game-2".to_string(),
    }));
    advance(10).await;

    let pushes = h.artifacts.pushes();
    assert_eq!(pushes.len(), 1);
    assert_eq!(pushes[0].rom_id, 2);
    assert_eq!(pushes[0].prior, None);

    h.runtime.emit(RuntimeEvent::GameStarted);
    advance(1500).await;
    assert!(h.artifacts.fetches().is_empty());
}

#[tokio::test(start_paused = true)]
async fn launch_failure_releases_the_runtime() {
    let h = harness();
    h.runtime
        .failing_launch
        .store(true, std::sync::atomic::Ordering::SeqCst);

    let err = h.controller.mount(SessionRequest::new(rom(1))).await.unwrap_err();

    assert!(matches!(err, RomsyncError::RuntimeUnavailable(_)));
    assert_eq!(h.controller.phase(), SessionPhase::TornDown);
    assert!(h.controller.session().is_none());
    assert_eq!(h.runtime.subscriptions(), 1);
    assert_eq!(h.runtime.unsubscribed.lock().unwrap().len(), 1);
    assert_eq!(*h.host.playing.lock().unwrap(), vec![false]);
    assert_eq!(h.host.count(NotificationLevel::Error), 1);

    h.controller.unmount();
    assert_eq!(h.runtime.unsubscribed.lock().unwrap().len(), 1);
}
