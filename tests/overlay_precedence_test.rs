//! Overlay-selection precedence, walked top to bottom: start from a state in
//! which every condition holds at once and peel them off one by one.

use proxydeck::idle::TimerPhase;
use proxydeck::models::{Entitlement, ErrorInfo, ErrorKind, LicensingInfo};
use proxydeck::overlay::{select_overlay, ConfirmAction, Modal, OverlayChoice};
use proxydeck::state::{AppState, MAX_STATUS_FETCH_FAILURES};
use std::time::Duration;

/// Every selectable condition active at the same time.
fn everything_state() -> AppState {
    let mut state = AppState::default();
    state.has_fetched_status = true;
    state.timeout.idle_timeout = Some(Duration::from_secs(60));
    state.fetch_fail_count = MAX_STATUS_FETCH_FAILURES;
    state.error = Some(ErrorInfo::new(ErrorKind::Install, "install failed"));
    state.licensing = None;
    state
}

fn unconsumed_entitlements() -> LicensingInfo {
    LicensingInfo::Online {
        email_address: "user@example.com".to_string(),
        entitlements: vec![Entitlement {
            id: "e1".to_string(),
            label: "Standard".to_string(),
            license_number: None,
        }],
        entitlement_id: None,
    }
}

#[test]
fn test_full_precedence_walk() {
    let mut state = everything_state();
    let modal = Some(Modal::Confirmation(ConfirmAction::Terminate));

    // 1. Warning preempts everything.
    assert_eq!(
        select_overlay(&state, TimerPhase::WarningShown, modal),
        OverlayChoice::TerminateWarning
    );

    // 2. Back in the idle phase, errors come next.
    assert_eq!(
        select_overlay(&state, TimerPhase::Idle, modal),
        OverlayChoice::Error
    );

    // 3. Errors cleared: the pending modal shows.
    state.fetch_fail_count = 0;
    state.error = None;
    assert_eq!(
        select_overlay(&state, TimerPhase::Idle, modal),
        OverlayChoice::Confirmation
    );

    // 4. No modal: the licensing gate.
    assert_eq!(
        select_overlay(&state, TimerPhase::Idle, None),
        OverlayChoice::LicensingGatherer
    );

    // 5. Licensing provided but unconsumed: the entitlement selector.
    state.licensing = Some(unconsumed_entitlements());
    assert_eq!(
        select_overlay(&state, TimerPhase::Idle, None),
        OverlayChoice::EntitlementSelector
    );

    // 6. Entitled: the information panel.
    state.licensing = Some(LicensingInfo::Online {
        email_address: "user@example.com".to_string(),
        entitlements: vec![Entitlement {
            id: "e1".to_string(),
            label: "Standard".to_string(),
            license_number: None,
        }],
        entitlement_id: Some("e1".to_string()),
    });
    assert_eq!(
        select_overlay(&state, TimerPhase::Idle, None),
        OverlayChoice::Information
    );
}

#[test]
fn test_gatherer_wins_over_entitlement_selector() {
    // Licensing missing and entitlement data conceptually pending: the
    // gatherer is chosen, never the selector.
    let mut state = AppState::default();
    state.has_fetched_status = true;
    state.licensing = None;
    assert_eq!(
        select_overlay(&state, TimerPhase::Idle, None),
        OverlayChoice::LicensingGatherer
    );
}

#[test]
fn test_warning_needs_enabled_timeout() {
    let mut state = AppState::default();
    state.has_fetched_status = true;
    state.licensing = Some(LicensingInfo::ExistingLicense);
    state.timeout.idle_timeout = None;
    assert_eq!(
        select_overlay(&state, TimerPhase::WarningShown, None),
        OverlayChoice::Information
    );
}

#[test]
fn test_hidden_overlay_yields_none_except_warning() {
    let mut state = AppState::default();
    state.has_fetched_status = true;
    state.licensing = Some(LicensingInfo::ExistingLicense);
    state.overlay_visible = false;
    assert_eq!(
        select_overlay(&state, TimerPhase::Idle, None),
        OverlayChoice::None
    );

    state.timeout.idle_timeout = Some(Duration::from_secs(60));
    assert_eq!(
        select_overlay(&state, TimerPhase::WarningShown, None),
        OverlayChoice::TerminateWarning
    );
}

#[test]
fn test_auth_gate_holds_back_licensing_prompt() {
    let mut state = AppState::default();
    state.has_fetched_status = true;
    state.licensing = None;
    state.auth.enabled = true;
    state.auth.status = false;
    assert_eq!(
        select_overlay(&state, TimerPhase::Idle, None),
        OverlayChoice::Information
    );
}
