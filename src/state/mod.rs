//! Application state store.
//!
//! One serializable [`AppState`] struct owned by the app coordinator, updated
//! exclusively through [`reduce`] with discrete named [`Event`]s. Everything
//! else (sequencer, overlay selector, UI) only reads. This keeps the
//! single-writer / many-readers discipline of the original store without a
//! framework: each `Event` arm below corresponds to one reducer case.

use crate::models::{
    AppStatus, BusyStatus, EnvConfig, ErrorInfo, LicensingInfo, StatusResponse,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Consecutive poll failures after which the proxy is considered gone and
/// the connection-error view takes over.
pub const MAX_STATUS_FETCH_FAILURES: u32 = 5;

/// Token-authentication state, set once from the environment config. The
/// token itself may arrive later through the URL side-channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthConfig {
    pub enabled: bool,
    pub status: bool,
    pub token: Option<String>,
}

/// Idle-timeout configuration, immutable after the env-config fetch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeoutConfig {
    pub idle_timeout: Option<Duration>,
}

impl TimeoutConfig {
    pub fn enabled(&self) -> bool {
        self.idle_timeout.is_some()
    }
}

/// The whole application state. Created once with defaults at startup;
/// session fields are replaced wholesale on each successful poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppState {
    pub app_status: AppStatus,
    pub busy_status: BusyStatus,
    pub session_version: Option<String>,
    pub licensing: Option<LicensingInfo>,
    pub error: Option<ErrorInfo>,
    pub auth: AuthConfig,
    pub timeout: TimeoutConfig,
    pub env_config: Option<EnvConfig>,
    pub has_fetched_env_config: bool,
    pub has_fetched_status: bool,
    pub is_submitting: bool,
    pub fetch_fail_count: u32,
    pub load_url: Option<String>,
    pub overlay_visible: bool,
    pub ws_env: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            app_status: AppStatus::Down,
            busy_status: BusyStatus::Na,
            session_version: None,
            licensing: None,
            error: None,
            auth: AuthConfig::default(),
            timeout: TimeoutConfig::default(),
            env_config: None,
            has_fetched_env_config: false,
            has_fetched_status: false,
            is_submitting: false,
            fetch_fail_count: 0,
            load_url: None,
            // Visible up front so the licensing/startup flow shows on first
            // render; auto-hidden once the session comes up.
            overlay_visible: true,
            ws_env: None,
        }
    }
}

impl AppState {
    /// Licensing has been provided in some form.
    pub fn licensing_provided(&self) -> bool {
        self.licensing.is_some()
    }

    /// Auth is either disabled or the token has been accepted.
    pub fn auth_satisfied(&self) -> bool {
        !self.auth.enabled || self.auth.status
    }

    /// The poll target has been unreachable for too long.
    pub fn is_connection_error(&self) -> bool {
        self.fetch_fail_count >= MAX_STATUS_FETCH_FAILURES
    }

    /// Backend reported that the managed application failed to install/start.
    pub fn is_install_error(&self) -> bool {
        matches!(&self.error, Some(e) if e.kind == crate::models::ErrorKind::Install)
    }

    pub fn session_up(&self) -> bool {
        self.app_status == AppStatus::Up
    }

    /// The session is on its way up or down; a poll snapshot taken now says
    /// nothing about idleness.
    pub fn session_transitioning(&self) -> bool {
        self.app_status.is_transitioning()
    }
}

/// Discrete named events the store reduces. One variant per state change;
/// nothing mutates `AppState` except `reduce`.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Environment config fetched (once, at startup).
    EnvConfigReceived(EnvConfig),
    /// A status document arrived (poll, or the idle-expiry busy probe).
    /// `previous_pending` is snapshotted from the store just before this
    /// event is reduced and drives the one-shot overlay auto-hide.
    StatusReceived {
        status: StatusResponse,
        previous_pending: bool,
    },
    /// A request toward the proxy failed outright.
    RequestFailed(ErrorInfo),
    /// A licensing / session-control / terminate request went out.
    /// `optimistic_status` mirrors the original store's immediate status
    /// flip on start/stop requests.
    SubmitRequested {
        optimistic_status: Option<AppStatus>,
    },
    /// Refreshed status document from a licensing or session-control call.
    SubmitReceived(StatusResponse),
    /// The terminate endpoint answered with the farewell URL.
    TerminateReceived { load_url: Option<String> },
    /// Token validation finished (query-parameter side-channel).
    AuthStatusUpdated {
        status: bool,
        error: Option<ErrorInfo>,
    },
    /// The token itself was consumed from the URL.
    AuthTokenSet(String),
    /// Overlay toggled by the user or forced by the warning flow.
    OverlayVisibilitySet(bool),
}

/// Apply one event to the state. Total: every event kind reduces, unknown
/// situations degrade to no-ops on the untouched fields.
pub fn reduce(state: &mut AppState, event: Event) {
    match event {
        Event::EnvConfigReceived(config) => {
            state.auth.enabled = config.authentication.enabled;
            state.auth.status = config.authentication.status;
            state.timeout.idle_timeout =
                config.idle_timeout_duration.map(Duration::from_secs);
            state.session_version = config.session.version.clone();
            state.env_config = Some(config);
            state.has_fetched_env_config = true;
        }
        Event::StatusReceived {
            status,
            previous_pending,
        } => {
            apply_status(state, status);
            // Auto-hide exactly once on the pending -> up transition so the
            // freshly started session is immediately visible.
            if previous_pending && state.app_status == AppStatus::Up {
                state.overlay_visible = false;
            }
        }
        Event::RequestFailed(error) => {
            state.fetch_fail_count += 1;
            state.is_submitting = false;
            state.error = Some(error);
        }
        Event::SubmitRequested { optimistic_status } => {
            state.is_submitting = true;
            if let Some(status) = optimistic_status {
                state.app_status = status;
                state.busy_status = BusyStatus::Na;
            }
        }
        Event::SubmitReceived(status) => {
            state.is_submitting = false;
            apply_status(state, status);
        }
        Event::TerminateReceived { load_url } => {
            state.is_submitting = false;
            state.app_status = AppStatus::Down;
            state.busy_status = BusyStatus::Na;
            state.load_url = load_url;
        }
        Event::AuthStatusUpdated { status, error } => {
            state.auth.status = status;
            state.error = error;
        }
        Event::AuthTokenSet(token) => {
            state.auth.token = Some(token);
        }
        Event::OverlayVisibilitySet(visible) => {
            state.overlay_visible = visible;
        }
    }
}

/// Replace the session block wholesale from a status document. Success also
/// clears the failure counter; a reported error sticks until the next
/// successful document without one.
fn apply_status(state: &mut AppState, status: StatusResponse) {
    state.app_status = status.session.status;
    state.busy_status = status.session.busy_status;
    if status.session.version.is_some() {
        state.session_version = status.session.version;
    }
    state.licensing = status.licensing;
    state.error = status.error;
    state.ws_env = status.ws_env;
    state.has_fetched_status = true;
    state.fetch_fail_count = 0;
}
