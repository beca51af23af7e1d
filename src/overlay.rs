//! Overlay selection.
//!
//! [`select_overlay`] is a pure function from store state (plus the timer
//! phase and any pending modal request) to the single overlay to display.
//! The precedence order is load-bearing: the termination warning preempts
//! everything, errors preempt modals, and the auth/licensing gates must
//! resolve before any session-control UI is offered.

use crate::idle::TimerPhase;
use crate::state::AppState;

/// An explicit modal requested by the user from the controls panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modal {
    Confirmation(ConfirmAction),
    Help,
}

/// What a pending confirmation dialog will do when confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmAction {
    StartSession,
    StopSession,
    Terminate,
    UnsetLicensing,
}

impl ConfirmAction {
    /// Prompt shown in the confirmation dialog.
    pub fn prompt(&self) -> &'static str {
        match self {
            ConfirmAction::StartSession => "Start the session?",
            ConfirmAction::StopSession => "Stop the session?",
            ConfirmAction::Terminate => "Terminate the session and shut down the proxy?",
            ConfirmAction::UnsetLicensing => "Discard the current licensing configuration?",
        }
    }
}

/// Exactly one overlay is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayChoice {
    None,
    Confirmation,
    Help,
    Error,
    LicensingGatherer,
    EntitlementSelector,
    Information,
    TerminateWarning,
}

/// Pick the overlay for the current state. First match wins.
pub fn select_overlay(
    state: &AppState,
    phase: TimerPhase,
    modal: Option<Modal>,
) -> OverlayChoice {
    // 1. The impending-termination warning draws above all other windows and
    //    must not be dismissible by ordinary visibility toggling.
    if state.timeout.enabled() && phase == TimerPhase::WarningShown {
        return OverlayChoice::TerminateWarning;
    }

    // A hidden overlay shows nothing else; the session view stays in front.
    if !state.overlay_visible {
        return OverlayChoice::None;
    }

    // 2. Terminal error conditions.
    if state.is_connection_error() || state.is_install_error() {
        return OverlayChoice::Error;
    }

    // 3. Explicit modal requests.
    match modal {
        Some(Modal::Confirmation(_)) => return OverlayChoice::Confirmation,
        Some(Modal::Help) => return OverlayChoice::Help,
        None => {}
    }

    // 4. Licensing gate: token auth resolves first, then licensing input.
    if !state.licensing_provided() && state.has_fetched_status && state.auth_satisfied() {
        return OverlayChoice::LicensingGatherer;
    }

    // 5. Entitlement selection, only once licensing itself is in place.
    if let Some(licensing) = &state.licensing {
        if licensing.has_unconsumed_entitlements() && !licensing.is_entitled() {
            return OverlayChoice::EntitlementSelector;
        }
    }

    // 6. Default status/control panel.
    OverlayChoice::Information
}
