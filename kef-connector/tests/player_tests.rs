//! End-to-end behaviour of the media player against a fake speaker

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use helpers::{empty_registry, player, player_with, song, FakeSpeaker, TestSessions};
use kef_connector::{
    setup_platform_with, Attribute, Command, ConnectorError, InMemoryRegistry, PlayerState,
    PollerConfig, PollingTask, SpeakerConfig,
};
use rstest::rstest;
use tokio::time::Instant;

// State derivation

#[tokio::test]
async fn test_standby_is_off_regardless_of_other_fields() {
    let speaker = FakeSpeaker::new();
    speaker.play("Song A");
    speaker.set(|s| s.status = "standby".to_string());

    let snap = player(&speaker).update().await.unwrap();

    assert_eq!(snap.state, Some(PlayerState::Off));
    assert_eq!(snap.progress, None);
    assert_eq!(snap.media_title(), Some("Song A"));
    assert_eq!(snap.media_artist(), Some("Artist"));
    assert_eq!(snap.media_album_name(), Some("Album"));
    assert_eq!(snap.media_image_url(), Some("http://covers/a.jpg"));
}

#[rstest]
#[case("optical")]
#[case("tv")]
#[case("coaxial")]
#[case("analog")]
#[case("usb")]
#[tokio::test]
async fn test_passthrough_source_is_on(#[case] source: &str) {
    let speaker = FakeSpeaker::new();
    speaker.play("Song A");
    speaker.set(|s| s.source = source.to_string());

    let snap = player(&speaker).update().await.unwrap();

    assert_eq!(snap.state, Some(PlayerState::On));
    assert_eq!(snap.source.as_deref(), Some(source));
    assert!(!speaker.read_log().contains(&Attribute::IsPlaying));
    assert_eq!(snap.media_title(), Some("Song A"));
    assert_eq!(snap.media_artist(), Some("Artist"));
    assert_eq!(snap.media_image_url(), Some("http://covers/a.jpg"));
}

#[tokio::test]
async fn test_wifi_playing() {
    let speaker = FakeSpeaker::new();
    speaker.play("Song A");

    let before = chrono::Utc::now();
    let snap = player(&speaker).update().await.unwrap();

    assert_eq!(snap.state, Some(PlayerState::Playing));
    assert_eq!(snap.media_title(), Some("Song A"));
    assert_eq!(snap.media_artist(), Some("Artist"));
    assert_eq!(snap.media_album_name(), Some("Album"));
    assert_eq!(snap.media_image_url(), Some("http://covers/a.jpg"));
    assert_eq!(snap.media_duration(), Some(215));
    assert_eq!(snap.media_position(), Some(42));
    assert!(snap.media_position_updated_at().unwrap() >= before);
}

#[tokio::test]
async fn test_wifi_paused_when_title_known() {
    let speaker = FakeSpeaker::new();
    let player = player(&speaker);

    speaker.play("Song A");
    player.update().await.unwrap();

    speaker.set(|s| s.playing = false);
    let snap = player.update().await.unwrap();

    assert_eq!(snap.state, Some(PlayerState::Paused));
    // Leaving PLAYING clears the progress fields in the same update
    assert_eq!(snap.media_position(), None);
    assert_eq!(snap.media_duration(), None);
    assert_eq!(snap.media_position_updated_at(), None);
}

#[tokio::test]
async fn test_metadata_follows_track_change_while_paused() {
    let speaker = FakeSpeaker::new();
    let player = player(&speaker);

    speaker.play("Song A");
    player.update().await.unwrap();
    speaker.set(|s| s.playing = false);
    player.update().await.unwrap();

    speaker.set(|s| {
        s.song = song("Song B");
        s.song.artist = Some("Other Artist".to_string());
        s.song.cover_url = Some("http://covers/b.jpg".to_string());
    });
    let snap = player.update().await.unwrap();

    assert_eq!(snap.state, Some(PlayerState::Paused));
    assert_eq!(snap.media_title(), Some("Song B"));
    assert_eq!(snap.media_artist(), Some("Other Artist"));
    assert_eq!(snap.media_image_url(), Some("http://covers/b.jpg"));
}

#[tokio::test]
async fn test_wifi_idle_without_title() {
    let speaker = FakeSpeaker::new();

    let snap = player(&speaker).update().await.unwrap();

    assert_eq!(snap.state, Some(PlayerState::Idle));
    assert_eq!(snap.media_title(), None);
}

#[tokio::test]
async fn test_bluetooth_is_media_capable() {
    let speaker = FakeSpeaker::new();
    speaker.set(|s| {
        s.source = "bluetooth".to_string();
        s.playing = true;
    });

    let snap = player(&speaker).update().await.unwrap();
    assert_eq!(snap.state, Some(PlayerState::Playing));
    assert_eq!(snap.media_position(), Some(0));
    assert_eq!(snap.media_duration(), None);
}

#[rstest]
#[case(0, 0.0, true)]
#[case(50, 0.5, false)]
#[case(100, 1.0, false)]
#[tokio::test]
async fn test_volume_normalization(#[case] raw: i64, #[case] level: f64, #[case] muted: bool) {
    let speaker = FakeSpeaker::new();
    speaker.set(|s| s.volume = raw);

    let snap = player(&speaker).update().await.unwrap();

    assert_eq!(snap.volume_level, Some(level));
    assert_eq!(snap.is_volume_muted, Some(muted));
}

#[tokio::test]
async fn test_identity_resolved_once() {
    let speaker = FakeSpeaker::new();
    let player = player(&speaker);

    let snap = player.update().await.unwrap();
    assert_eq!(snap.name.as_deref(), Some("Living Room KEF"));
    assert_eq!(snap.unique_id.as_deref(), Some("KEF_SPEAKER_aabbccddeeff"));

    player.update().await.unwrap();
    let log = speaker.read_log();
    assert_eq!(log.iter().filter(|a| **a == Attribute::SpeakerName).count(), 1);
    assert_eq!(log.iter().filter(|a| **a == Attribute::MacAddress).count(), 1);
}

#[tokio::test]
async fn test_malformed_mac_does_not_block_state() {
    let speaker = FakeSpeaker::new();
    speaker.set(|s| {
        s.mac = "84:17:15:0A:0B".to_string();
        s.source = "optical".to_string();
    });
    let player = player(&speaker);

    for _ in 0..3 {
        let snap = player.update().await.unwrap();
        assert_eq!(snap.state, Some(PlayerState::On));
        assert_eq!(snap.unique_id.as_deref(), Some("KEF_SPEAKER_8417150a0b"));
    }

    let log = speaker.read_log();
    assert_eq!(log.iter().filter(|a| **a == Attribute::MacAddress).count(), 1);
}

#[tokio::test]
async fn test_blank_mac_leaves_unique_id_unset() {
    let speaker = FakeSpeaker::new();
    speaker.set(|s| s.mac = String::new());
    let player = player(&speaker);

    let snap = player.update().await.unwrap();
    assert_eq!(snap.state, Some(PlayerState::Idle));
    assert_eq!(snap.unique_id, None);

    speaker.set(|s| s.mac = "AA:BB:CC:DD:EE:FF".to_string());
    let snap = player.update().await.unwrap();
    assert_eq!(snap.unique_id.as_deref(), Some("KEF_SPEAKER_aabbccddeeff"));
}

#[tokio::test]
async fn test_configured_name_is_kept() {
    let speaker = FakeSpeaker::new();
    let config = SpeakerConfig::new("192.168.1.20").with_name("Office");

    let snap = player_with(&speaker, &config).update().await.unwrap();

    assert_eq!(snap.name.as_deref(), Some("Office"));
    assert!(!speaker.read_log().contains(&Attribute::SpeakerName));
}

#[tokio::test]
async fn test_failed_poll_keeps_previous_snapshot() {
    let speaker = FakeSpeaker::new();
    let player = player(&speaker);
    let mut updates = player.subscribe();

    let good = player.update().await.unwrap();
    updates.borrow_and_update();

    speaker.set_offline(true);
    let err = player.update().await.unwrap_err();

    assert!(matches!(err, ConnectorError::Transport(_)));
    assert!(Arc::ptr_eq(&player.snapshot(), &good));
    assert!(!updates.has_changed().unwrap());
}

#[tokio::test]
async fn test_subscribers_see_new_snapshots() {
    let speaker = FakeSpeaker::new();
    let player = player(&speaker);
    let mut updates = player.subscribe();

    player.update().await.unwrap();

    assert!(updates.has_changed().unwrap());
    assert_eq!(updates.borrow_and_update().state, Some(PlayerState::Idle));
}

// Source memory and power-on

#[tokio::test]
async fn test_power_on_defaults_to_wifi() {
    let speaker = FakeSpeaker::new();
    speaker.set(|s| {
        s.status = "standby".to_string();
        s.source = "standby".to_string();
    });
    let player = player(&speaker);

    assert_eq!(player.resume_source(), "wifi");
    player.turn_on().await.unwrap();

    assert_eq!(speaker.commands(), vec![Command::SetSource("wifi".to_string())]);
}

#[tokio::test]
async fn test_last_real_source_survives_standby() {
    let speaker = FakeSpeaker::new();
    speaker.set(|s| s.source = "optical".to_string());
    let player = player(&speaker);

    player.update().await.unwrap();
    assert_eq!(player.resume_source(), "optical");

    // Shutdown reports "standby" as the source; it must not overwrite memory
    speaker.set(|s| {
        s.status = "standby".to_string();
        s.source = "standby".to_string();
    });
    player.update().await.unwrap();

    // Neither does a transient source outside the catalog
    speaker.set(|s| {
        s.status = "powerOn".to_string();
        s.source = "airplay".to_string();
    });
    player.update().await.unwrap();
    assert_eq!(player.resume_source(), "optical");

    player.turn_on().await.unwrap();
    assert_eq!(
        speaker.commands().last(),
        Some(&Command::SetSource("optical".to_string()))
    );
}

#[tokio::test]
async fn test_out_of_catalog_source_for_model() {
    let speaker = FakeSpeaker::new();
    // LSX2LT has no coaxial input
    let config = SpeakerConfig::new("192.168.1.20").with_model("LSX2LT");
    let player = player_with(&speaker, &config);

    speaker.set(|s| s.source = "usb".to_string());
    player.update().await.unwrap();
    speaker.set(|s| s.source = "coaxial".to_string());
    player.update().await.unwrap();

    assert_eq!(player.resume_source(), "usb");
}

#[tokio::test]
async fn test_explicit_power_on_model() {
    let speaker = FakeSpeaker::new();
    let config = SpeakerConfig::new("192.168.1.20").with_model("XIO");
    let player = player_with(&speaker, &config);

    player.turn_on().await.unwrap();

    assert_eq!(speaker.commands(), vec![Command::PowerOn]);
}

// Delayed refresh after commands

async fn assert_refresh_after(
    expected: Duration,
    issue: impl std::future::Future<Output = kef_connector::Result<kef_connector::PendingRefresh>>,
    speaker: &FakeSpeaker,
) {
    let started = Instant::now();
    let reads_before = speaker.reads();

    let pending = issue.await.unwrap();
    assert!(pending.is_scheduled());
    assert_eq!(speaker.reads(), reads_before);

    pending.settled().await;

    let elapsed = started.elapsed();
    assert!(elapsed >= expected, "refreshed after {:?}", elapsed);
    assert!(elapsed < expected + Duration::from_millis(100), "refreshed after {:?}", elapsed);
    assert!(speaker.reads() > reads_before);
}

#[tokio::test(start_paused = true)]
async fn test_power_commands_refresh_after_five_seconds() {
    let speaker = FakeSpeaker::new();
    let player = player(&speaker);

    assert_refresh_after(Duration::from_secs(5), player.turn_off(), &speaker).await;
    assert_eq!(player.snapshot().state, Some(PlayerState::Off));

    assert_refresh_after(Duration::from_secs(5), player.turn_on(), &speaker).await;
    assert_eq!(player.snapshot().state, Some(PlayerState::Idle));
}

#[tokio::test(start_paused = true)]
async fn test_select_source_refreshes_after_half_second() {
    let speaker = FakeSpeaker::new();
    let player = player(&speaker);

    assert_refresh_after(Duration::from_millis(500), player.select_source("tv"), &speaker).await;
    assert_eq!(player.snapshot().state, Some(PlayerState::On));
    assert_eq!(player.snapshot().source.as_deref(), Some("tv"));
}

#[tokio::test(start_paused = true)]
async fn test_play_pause_refresh_after_quarter_second() {
    let speaker = FakeSpeaker::new();
    speaker.set(|s| s.song = song("Song A"));
    let player = player(&speaker);

    assert_refresh_after(Duration::from_millis(250), player.media_play(), &speaker).await;
    assert_eq!(player.snapshot().state, Some(PlayerState::Playing));

    assert_refresh_after(Duration::from_millis(250), player.media_pause(), &speaker).await;
    assert_eq!(player.snapshot().state, Some(PlayerState::Paused));

    assert_refresh_after(Duration::from_millis(250), player.media_play_pause(), &speaker).await;
    assert_eq!(player.snapshot().state, Some(PlayerState::Playing));

    assert_eq!(speaker.commands(), vec![Command::TogglePlayPause; 3]);
}

#[tokio::test(start_paused = true)]
async fn test_track_skip_refreshes_after_one_and_a_half_seconds() {
    let speaker = FakeSpeaker::new();
    let player = player(&speaker);

    assert_refresh_after(Duration::from_millis(1500), player.media_next_track(), &speaker).await;
    assert_refresh_after(Duration::from_millis(1500), player.media_previous_track(), &speaker).await;

    assert_eq!(
        speaker.commands(),
        vec![Command::NextTrack, Command::PreviousTrack]
    );
}

#[tokio::test(start_paused = true)]
async fn test_volume_and_mute_do_not_refresh() {
    let speaker = FakeSpeaker::new();
    let player = player(&speaker);
    player.update().await.unwrap();
    let reads_before = speaker.reads();

    player.set_volume_level(0.4).await.unwrap();
    player.mute_volume(true).await.unwrap();
    player.mute_volume(false).await.unwrap();
    tokio::time::sleep(Duration::from_secs(10)).await;

    assert_eq!(speaker.reads(), reads_before);
    assert_eq!(
        speaker.commands(),
        vec![Command::SetVolume(40), Command::Mute, Command::Unmute]
    );
}

#[tokio::test(start_paused = true)]
async fn test_refresh_dropped_when_player_removed() {
    let speaker = FakeSpeaker::new();
    let player = player(&speaker);

    let pending = player.turn_off().await.unwrap();
    drop(player);
    let reads_before = speaker.reads();

    pending.settled().await;

    assert_eq!(speaker.reads(), reads_before);
}

#[tokio::test]
async fn test_failed_command_is_not_retried() {
    let speaker = FakeSpeaker::new();
    let player = player(&speaker);
    speaker.set_offline(true);

    let result = player.select_source("optical").await;

    assert!(matches!(result, Err(ConnectorError::Transport(_))));
    assert!(speaker.commands().is_empty());
}

// Volume commands

#[tokio::test]
async fn test_set_volume_respects_maximum() {
    let speaker = FakeSpeaker::new();
    let config = SpeakerConfig::new("192.168.1.20").with_maximum_volume(0.5);
    let player = player_with(&speaker, &config);

    player.set_volume_level(0.8).await.unwrap();

    assert_eq!(speaker.commands(), vec![Command::SetVolume(50)]);
    assert_eq!(player.snapshot().volume_level, Some(0.5));
    assert_eq!(player.snapshot().is_volume_muted, Some(false));
}

#[tokio::test]
async fn test_volume_steps() {
    let speaker = FakeSpeaker::new();
    let player = player(&speaker);

    player.volume_up().await.unwrap();
    assert_eq!(speaker.commands().last(), Some(&Command::SetVolume(33)));
    assert_eq!(player.snapshot().volume_level, Some(0.33));

    speaker.set(|s| s.volume = 1);
    player.volume_down().await.unwrap();
    assert_eq!(speaker.commands().last(), Some(&Command::SetVolume(0)));
    assert_eq!(player.snapshot().is_volume_muted, Some(true));
}

#[tokio::test]
async fn test_volume_up_capped_at_maximum() {
    let speaker = FakeSpeaker::new();
    speaker.set(|s| s.volume = 59);
    let config = SpeakerConfig::new("192.168.1.20").with_maximum_volume(0.6);
    let player = player_with(&speaker, &config);

    player.volume_up().await.unwrap();

    assert_eq!(speaker.commands(), vec![Command::SetVolume(60)]);
}

#[tokio::test]
async fn test_mute_keeps_flag_derived_from_volume() {
    let speaker = FakeSpeaker::new();
    let player = player(&speaker);
    let before = player.update().await.unwrap();

    player.mute_volume(true).await.unwrap();

    assert_eq!(speaker.commands(), vec![Command::Mute]);
    assert!(Arc::ptr_eq(&player.snapshot(), &before));
    assert_eq!(player.snapshot().is_volume_muted, Some(false));
    assert_eq!(player.snapshot().volume_level, Some(0.3));
}

#[tokio::test]
async fn test_non_finite_volume_level_is_rejected() {
    let speaker = FakeSpeaker::new();
    let player = player(&speaker);
    let before = player.update().await.unwrap();

    for level in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
        let result = player.set_volume_level(level).await;
        assert!(matches!(result, Err(ConnectorError::Configuration(_))));
    }

    assert!(speaker.commands().is_empty());
    assert!(Arc::ptr_eq(&player.snapshot(), &before));
}

// Platform setup and polling

#[tokio::test]
async fn test_setup_unknown_model_uses_default_sources() {
    let speaker = FakeSpeaker::new();
    let config = SpeakerConfig::new("192.168.1.20").with_model("FOOBAR");
    let mut registry = empty_registry();

    let player = setup_platform_with(&config, speaker.clone(), Arc::new(TestSessions), None, &mut registry)
        .await
        .unwrap();

    assert_eq!(
        player.snapshot().source_list,
        vec!["wifi", "bluetooth", "tv", "optical", "coaxial", "analog", "usb"]
    );
    // setup runs the first update before handing the entity over
    assert_eq!(player.snapshot().state, Some(PlayerState::Idle));
}

#[tokio::test]
async fn test_setup_lowercase_model() {
    let speaker = FakeSpeaker::new();
    let config = SpeakerConfig::new("192.168.1.20").with_model("ls50w2");

    let player = setup_platform_with(
        &config,
        speaker.clone(),
        Arc::new(TestSessions),
        None,
        &mut empty_registry(),
    )
    .await
    .unwrap();

    assert_eq!(player.catalog().model(), "LS50W2");
}

#[tokio::test]
async fn test_setup_without_host_fails() {
    let speaker = FakeSpeaker::new();
    let config = SpeakerConfig::new("");

    let result = setup_platform_with(
        &config,
        speaker.clone(),
        Arc::new(TestSessions),
        None,
        &mut empty_registry(),
    )
    .await;

    assert!(matches!(result, Err(ConnectorError::Configuration(_))));
    assert_eq!(speaker.reads(), 0);
}

#[tokio::test]
async fn test_setup_migrates_legacy_ids() {
    let speaker = FakeSpeaker::new();
    let mut registry = InMemoryRegistry::new();
    registry.register("media_player.kef", "kef_connector", "KEFLS50W2_AA:BB:CC:DD:EE:FF");

    let player = setup_platform_with(
        &SpeakerConfig::new("192.168.1.20"),
        speaker.clone(),
        Arc::new(TestSessions),
        None,
        &mut registry,
    )
    .await
    .unwrap();

    let entry = registry.get("media_player.kef").unwrap();
    assert_eq!(entry.unique_id, "KEF_SPEAKER_aabbccddeeff");
    assert_eq!(player.snapshot().unique_id.as_deref(), Some(entry.unique_id.as_str()));
}

#[tokio::test]
async fn test_setup_survives_offline_speaker() {
    let speaker = FakeSpeaker::new();
    speaker.set_offline(true);

    let player = setup_platform_with(
        &SpeakerConfig::new("192.168.1.20"),
        speaker.clone(),
        Arc::new(TestSessions),
        None,
        &mut empty_registry(),
    )
    .await
    .unwrap();

    assert_eq!(player.snapshot().state, None);
}

#[tokio::test(start_paused = true)]
async fn test_polling_task_ticks_at_interval() {
    let speaker = FakeSpeaker::new();
    let player = player(&speaker);
    let poller = PollingTask::start(&player, &PollerConfig::default());

    tokio::time::sleep(Duration::from_secs(25)).await;

    assert_eq!(poller.poll_count(), 3);
    assert_eq!(poller.error_count(), 0);
    assert_eq!(player.snapshot().state, Some(PlayerState::Idle));

    poller.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_polling_task_counts_errors_and_recovers() {
    let speaker = FakeSpeaker::new();
    speaker.set_offline(true);
    let player = player(&speaker);
    let poller = PollingTask::start(&player, &PollerConfig::with_scan_interval(Duration::from_secs(10)));

    tokio::time::sleep(Duration::from_secs(15)).await;
    assert_eq!(poller.error_count(), 2);
    assert_eq!(player.snapshot().state, None);

    speaker.set_offline(false);
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(poller.error_count(), 0);
    assert_eq!(player.snapshot().state, Some(PlayerState::Idle));

    poller.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_polling_task_stops_when_player_dropped() {
    let speaker = FakeSpeaker::new();
    let player = player(&speaker);
    let poller = PollingTask::start(&player, &PollerConfig::default());

    tokio::time::sleep(Duration::from_secs(1)).await;
    drop(player);
    tokio::time::sleep(Duration::from_secs(11)).await;

    assert!(poller.is_finished());
}
