//! End-to-end properties of the idle-timeout workflow, driven through the
//! app coordinator under a paused clock.

use proxydeck::app::{App, AppMessage};
use proxydeck::client::{parse_proxy_url, ProxyClient};
use proxydeck::idle::TimerPhase;
use proxydeck::models::{
    AppStatus, BusyStatus, EnvConfig, SessionStatus, StatusResponse,
};
use proxydeck::overlay::OverlayChoice;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

fn status_doc(status: AppStatus, busy: BusyStatus) -> StatusResponse {
    StatusResponse {
        session: SessionStatus {
            status,
            busy_status: busy,
            version: None,
        },
        licensing: Some(proxydeck::models::LicensingInfo::ExistingLicense),
        error: None,
        ws_env: None,
    }
}

fn env_config(idle_timeout_secs: Option<u64>) -> EnvConfig {
    let timeout = match idle_timeout_secs {
        Some(secs) => format!("{secs}"),
        None => "null".to_string(),
    };
    serde_json::from_str(&format!(
        r#"{{
            "authentication": {{"enabled": false, "status": false}},
            "idleTimeoutDuration": {timeout}
        }}"#
    ))
    .unwrap()
}

/// App wired to an unroutable backend; every proxy call the app makes on its
/// own resolves as an error message, which the tests either consume or
/// ignore. Timer-relevant responses are injected synthetically.
fn test_app(buffer: Duration) -> (App, mpsc::UnboundedReceiver<AppMessage>) {
    let (url, _) = parse_proxy_url("http://127.0.0.1:1/").unwrap();
    let (tx, rx) = mpsc::unbounded_channel();
    let app = App::with_buffer_timeout(Arc::new(ProxyClient::new(url)), tx, None, buffer);
    (app, rx)
}

async fn expect_idle_expired(rx: &mut mpsc::UnboundedReceiver<AppMessage>) -> u64 {
    loop {
        match rx.recv().await {
            Some(AppMessage::IdleExpired { generation }) => return generation,
            Some(_) => continue,
            None => panic!("channel closed while waiting for IdleExpired"),
        }
    }
}

async fn expect_buffer_expired(rx: &mut mpsc::UnboundedReceiver<AppMessage>) -> u64 {
    loop {
        match rx.recv().await {
            Some(AppMessage::BufferExpired { generation }) => return generation,
            Some(_) => continue,
            None => panic!("channel closed while waiting for BufferExpired"),
        }
    }
}

/// Walk the app into the warning phase: arm via env config, expire the idle
/// countdown and answer the busy probe with "idle".
async fn reach_warning(app: &mut App, rx: &mut mpsc::UnboundedReceiver<AppMessage>) {
    app.handle_message(AppMessage::EnvConfigFetched(Ok(env_config(Some(1)))));
    app.handle_message(AppMessage::StatusFetched(Ok(status_doc(
        AppStatus::Up,
        BusyStatus::Idle,
    ))));

    let generation = expect_idle_expired(rx).await;
    app.handle_message(AppMessage::IdleExpired { generation });
    app.handle_message(AppMessage::BusyProbeResolved {
        generation,
        result: Ok(status_doc(AppStatus::Up, BusyStatus::Idle)),
    });
    assert_eq!(app.sequencer.phase(), TimerPhase::WarningShown);
}

#[tokio::test(start_paused = true)]
async fn test_disabled_timeout_never_warns() {
    let (mut app, mut rx) = test_app(Duration::from_secs(10));
    app.handle_message(AppMessage::EnvConfigFetched(Ok(env_config(None))));
    app.handle_message(AppMessage::StatusFetched(Ok(status_doc(
        AppStatus::Up,
        BusyStatus::Idle,
    ))));

    assert_eq!(app.sequencer.pending_countdowns(), 0);
    tokio::time::advance(Duration::from_secs(24 * 3600)).await;
    while let Ok(message) = rx.try_recv() {
        assert!(
            !matches!(message, AppMessage::IdleExpired { .. }),
            "idle countdown fired with timeout disabled"
        );
    }
    assert_eq!(app.sequencer.phase(), TimerPhase::Idle);
    app.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_idle_session_reaches_warning_and_overlay() {
    let (mut app, mut rx) = test_app(Duration::from_secs(10));
    reach_warning(&mut app, &mut rx).await;

    assert!(app.state.overlay_visible);
    assert_eq!(app.overlay(), OverlayChoice::TerminateWarning);
    app.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_busy_session_stays_idle() {
    let (mut app, mut rx) = test_app(Duration::from_secs(10));
    app.handle_message(AppMessage::EnvConfigFetched(Ok(env_config(Some(1)))));
    app.handle_message(AppMessage::StatusFetched(Ok(status_doc(
        AppStatus::Up,
        BusyStatus::Idle,
    ))));

    let generation = expect_idle_expired(&mut rx).await;
    app.handle_message(AppMessage::IdleExpired { generation });
    // Live probe reports busy: countdown restarts, no warning.
    app.handle_message(AppMessage::BusyProbeResolved {
        generation,
        result: Ok(status_doc(AppStatus::Up, BusyStatus::Busy)),
    });

    assert_eq!(app.sequencer.phase(), TimerPhase::Idle);
    assert_eq!(app.sequencer.pending_countdowns(), 1);
    assert_ne!(app.overlay(), OverlayChoice::TerminateWarning);
    app.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_transitioning_session_gets_grace_period() {
    let (mut app, mut rx) = test_app(Duration::from_secs(10));
    app.handle_message(AppMessage::EnvConfigFetched(Ok(env_config(Some(1)))));
    app.handle_message(AppMessage::StatusFetched(Ok(status_doc(
        AppStatus::Starting,
        BusyStatus::Na,
    ))));

    let generation = expect_idle_expired(&mut rx).await;
    app.handle_message(AppMessage::IdleExpired { generation });

    // No probe needed: countdown restarted outright.
    assert_eq!(app.sequencer.phase(), TimerPhase::Idle);
    assert_eq!(app.sequencer.pending_countdowns(), 1);
    app.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_resume_returns_to_idle_and_rewarns() {
    let (mut app, mut rx) = test_app(Duration::from_secs(10));
    reach_warning(&mut app, &mut rx).await;

    // Resume from the warning dialog.
    app.handle_key(KeyEvent::new(KeyCode::Char('r'), KeyModifiers::NONE));
    assert_eq!(app.sequencer.phase(), TimerPhase::Idle);
    assert!(!app.state.overlay_visible);
    assert_eq!(app.sequencer.pending_countdowns(), 1);

    // A second full inactivity period re-triggers the warning.
    let generation = expect_idle_expired(&mut rx).await;
    app.handle_message(AppMessage::IdleExpired { generation });
    app.handle_message(AppMessage::BusyProbeResolved {
        generation,
        result: Ok(status_doc(AppStatus::Up, BusyStatus::Idle)),
    });
    assert_eq!(app.sequencer.phase(), TimerPhase::WarningShown);
    assert!(app.state.overlay_visible);
    app.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_buffer_expiry_fires_exactly_one_terminate() {
    let (mut app, mut rx) = test_app(Duration::from_millis(100));
    reach_warning(&mut app, &mut rx).await;

    let generation = expect_buffer_expired(&mut rx).await;
    app.handle_message(AppMessage::BufferExpired { generation });
    assert!(app.state.is_submitting);

    // A replayed expiry must not fire a second request.
    app.handle_message(AppMessage::BufferExpired { generation });

    // The terminate against the unroutable backend resolves as an error;
    // exactly one such resolution arrives.
    loop {
        match rx.recv().await {
            Some(AppMessage::TerminateResolved(_)) => break,
            Some(_) => continue,
            None => panic!("channel closed before TerminateResolved"),
        }
    }
    tokio::task::yield_now().await;
    assert!(rx.try_recv().is_err(), "more than one terminate fired");
    app.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_interactions_not_observed_during_warning() {
    let (mut app, mut rx) = test_app(Duration::from_secs(10));
    reach_warning(&mut app, &mut rx).await;

    // An arbitrary (non-resume) key must not dismiss the warning.
    app.handle_key(KeyEvent::new(KeyCode::Char('z'), KeyModifiers::NONE));
    assert_eq!(app.sequencer.phase(), TimerPhase::WarningShown);
    assert_eq!(app.overlay(), OverlayChoice::TerminateWarning);
    app.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_probe_failure_leaves_phase_unchanged() {
    let (mut app, mut rx) = test_app(Duration::from_secs(10));
    app.handle_message(AppMessage::EnvConfigFetched(Ok(env_config(Some(1)))));
    app.handle_message(AppMessage::StatusFetched(Ok(status_doc(
        AppStatus::Up,
        BusyStatus::Idle,
    ))));

    let generation = expect_idle_expired(&mut rx).await;
    app.handle_message(AppMessage::IdleExpired { generation });
    app.handle_message(AppMessage::BusyProbeResolved {
        generation,
        result: Err(proxydeck::error::ProxyError::Server {
            status: 503,
            message: "unavailable".to_string(),
        }),
    });

    assert_eq!(app.sequencer.phase(), TimerPhase::Idle);
    // Cycle is over; a fresh interaction re-arms.
    assert_eq!(app.sequencer.pending_countdowns(), 0);
    app.handle_key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE));
    assert_eq!(app.sequencer.pending_countdowns(), 1);
    app.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_teardown_cancels_all_countdowns_in_every_phase() {
    // Idle phase with an armed countdown.
    let (mut app, mut rx) = test_app(Duration::from_secs(10));
    app.handle_message(AppMessage::EnvConfigFetched(Ok(env_config(Some(1)))));
    assert_eq!(app.sequencer.pending_countdowns(), 1);
    app.shutdown();
    assert_eq!(app.sequencer.pending_countdowns(), 0);
    drop(rx);

    // Warning phase with the buffer countdown running.
    let (mut app, mut rx) = test_app(Duration::from_secs(10));
    reach_warning(&mut app, &mut rx).await;
    assert_eq!(app.sequencer.pending_countdowns(), 1);
    app.shutdown();
    assert_eq!(app.sequencer.pending_countdowns(), 0);

    tokio::time::advance(Duration::from_secs(3600)).await;
    while let Ok(message) = rx.try_recv() {
        assert!(
            !matches!(
                message,
                AppMessage::IdleExpired { .. } | AppMessage::BufferExpired { .. }
            ),
            "countdown fired after teardown"
        );
    }
}
