//! Application coordinator.
//!
//! [`App`] owns the state store, the idle sequencer and the transient UI
//! state (pending modal, licensing form, entitlement cursor). All async work
//! reports back through one mpsc channel of [`AppMessage`]; `handle_message`
//! reduces each message into the store and then runs its side effects, so a
//! poll response is always fully applied before the overlay selector runs
//! again.

mod input;
mod messages;

pub use messages::AppMessage;

use crate::client::ProxyClient;
use crate::idle::{IdleExpiry, IdleSequencer, ProbeOutcome};
use crate::models::{AppStatus, BusyStatus, LicensingRequest};
use crate::overlay::{select_overlay, ConfirmAction, Modal, OverlayChoice};
use crate::state::{reduce, AppState, Event};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

/// Which input mode the licensing gatherer is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LicensingField {
    ExistingLicense,
    NetworkLicenseManager,
}

/// Transient state of the licensing gatherer form.
#[derive(Debug, Clone)]
pub struct LicensingForm {
    pub field: LicensingField,
    pub conn_str: String,
}

impl Default for LicensingForm {
    fn default() -> Self {
        Self {
            field: LicensingField::ExistingLicense,
            conn_str: String::new(),
        }
    }
}

impl LicensingForm {
    pub fn toggle_field(&mut self) {
        self.field = match self.field {
            LicensingField::ExistingLicense => LicensingField::NetworkLicenseManager,
            LicensingField::NetworkLicenseManager => LicensingField::ExistingLicense,
        };
    }

    /// Build the request for the current form contents, if submittable.
    pub fn to_request(&self) -> Option<LicensingRequest> {
        match self.field {
            LicensingField::ExistingLicense => Some(LicensingRequest::ExistingLicense),
            LicensingField::NetworkLicenseManager => {
                let conn_str = self.conn_str.trim();
                if conn_str.is_empty() {
                    None
                } else {
                    Some(LicensingRequest::NetworkLicenseManager {
                        conn_str: conn_str.to_string(),
                    })
                }
            }
        }
    }
}

/// The application coordinator.
pub struct App {
    pub state: AppState,
    pub sequencer: IdleSequencer,
    pub modal: Option<Modal>,
    pub licensing_form: LicensingForm,
    pub entitlement_cursor: usize,
    pub should_quit: bool,
    /// URL to print after teardown (the browser would navigate there).
    pub farewell_url: Option<String>,
    client: Arc<ProxyClient>,
    tx: UnboundedSender<AppMessage>,
    /// Token consumed from the proxy URL, validated once the env config
    /// tells us whether auth is enabled.
    pending_token: Option<String>,
}

impl App {
    pub fn new(
        client: Arc<ProxyClient>,
        tx: UnboundedSender<AppMessage>,
        pending_token: Option<String>,
    ) -> Self {
        Self {
            state: AppState::default(),
            sequencer: IdleSequencer::new(tx.clone()),
            modal: None,
            licensing_form: LicensingForm::default(),
            entitlement_cursor: 0,
            should_quit: false,
            farewell_url: None,
            client,
            tx,
            pending_token,
        }
    }

    /// Construct with a custom buffer timeout (tests shorten it).
    pub fn with_buffer_timeout(
        client: Arc<ProxyClient>,
        tx: UnboundedSender<AppMessage>,
        pending_token: Option<String>,
        buffer_timeout: Duration,
    ) -> Self {
        let mut app = Self::new(client, tx.clone(), pending_token);
        app.sequencer = IdleSequencer::with_buffer_timeout(tx, buffer_timeout);
        app
    }

    /// The overlay to render right now.
    pub fn overlay(&self) -> OverlayChoice {
        select_overlay(&self.state, self.sequencer.phase(), self.modal)
    }

    /// The proxy origin the session is served from (token already stripped).
    pub fn client_origin(&self) -> String {
        self.client.base_url().as_str().trim_end_matches('/').to_string()
    }

    /// Kick off the startup fetches (env config, then first status).
    pub fn start(&self) {
        self.fetch_env_config();
        self.fetch_status();
    }

    /// Cancel all pending countdowns. Must be called before the terminal is
    /// torn down.
    pub fn shutdown(&mut self) {
        self.sequencer.shutdown();
    }

    fn fetch_env_config(&self) {
        let client = Arc::clone(&self.client);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = client.get_env_config().await;
            let _ = tx.send(AppMessage::EnvConfigFetched(result));
        });
    }

    fn fetch_status(&self) {
        let client = Arc::clone(&self.client);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = client.get_status().await;
            let _ = tx.send(AppMessage::StatusFetched(result));
        });
    }

    fn probe_busy(&self, generation: u64) {
        let client = Arc::clone(&self.client);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = client.get_status().await;
            let _ = tx.send(AppMessage::BusyProbeResolved { generation, result });
        });
    }

    fn authenticate(&self, token: String) {
        let client = Arc::clone(&self.client);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = client.authenticate(&token).await;
            let _ = tx.send(AppMessage::AuthResolved { token, result });
        });
    }

    pub(crate) fn submit_licensing(&mut self, request: LicensingRequest) {
        reduce(
            &mut self.state,
            Event::SubmitRequested {
                optimistic_status: None,
            },
        );
        let client = Arc::clone(&self.client);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = client.set_licensing(&request).await;
            let _ = tx.send(AppMessage::LicensingResolved(result));
        });
    }

    pub(crate) fn submit_unset_licensing(&mut self) {
        reduce(
            &mut self.state,
            Event::SubmitRequested {
                optimistic_status: None,
            },
        );
        let client = Arc::clone(&self.client);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = client.unset_licensing().await;
            let _ = tx.send(AppMessage::LicensingResolved(result));
        });
    }

    pub(crate) fn submit_entitlement(&mut self, entitlement_id: String) {
        reduce(
            &mut self.state,
            Event::SubmitRequested {
                optimistic_status: None,
            },
        );
        let client = Arc::clone(&self.client);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = client.update_entitlement(&entitlement_id).await;
            let _ = tx.send(AppMessage::LicensingResolved(result));
        });
    }

    pub(crate) fn submit_start_session(&mut self) {
        reduce(
            &mut self.state,
            Event::SubmitRequested {
                optimistic_status: Some(AppStatus::Starting),
            },
        );
        let client = Arc::clone(&self.client);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = client.start_session().await;
            let _ = tx.send(AppMessage::SessionControlResolved(result));
        });
    }

    pub(crate) fn submit_stop_session(&mut self) {
        reduce(
            &mut self.state,
            Event::SubmitRequested {
                optimistic_status: Some(AppStatus::Stopping),
            },
        );
        let client = Arc::clone(&self.client);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = client.stop_session().await;
            let _ = tx.send(AppMessage::SessionControlResolved(result));
        });
    }

    /// Fire the terminate request. Invoked by the buffer expiry or by the
    /// user from the warning / controls.
    pub(crate) fn submit_terminate(&mut self) {
        reduce(
            &mut self.state,
            Event::SubmitRequested {
                optimistic_status: None,
            },
        );
        let client = Arc::clone(&self.client);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = client.terminate().await;
            let _ = tx.send(AppMessage::TerminateResolved(result));
        });
    }

    /// Re-apply the auth/timeout gate to the sequencer. Called whenever the
    /// env config arrives or the auth status flips.
    fn reconfigure_sequencer(&mut self) {
        self.sequencer
            .configure(self.state.timeout.idle_timeout, self.state.auth_satisfied());
    }

    /// Apply one message to the store and run its side effects.
    pub fn handle_message(&mut self, message: AppMessage) {
        match message {
            AppMessage::EnvConfigFetched(Ok(config)) => {
                reduce(&mut self.state, Event::EnvConfigReceived(config));
                self.reconfigure_sequencer();
                // The URL side-channel token is only worth validating when
                // the proxy actually enforces auth.
                if self.state.auth.enabled && !self.state.auth.status {
                    if let Some(token) = self.pending_token.take() {
                        self.authenticate(token);
                    }
                }
            }
            AppMessage::EnvConfigFetched(Err(error)) => {
                warn!("environment config fetch failed: {error}");
                reduce(&mut self.state, Event::RequestFailed(error.to_error_info()));
            }
            AppMessage::StatusFetched(Ok(status)) => {
                let previous_pending = self.state.app_status == AppStatus::Starting;
                reduce(
                    &mut self.state,
                    Event::StatusReceived {
                        status,
                        previous_pending,
                    },
                );
            }
            AppMessage::StatusFetched(Err(error)) => {
                debug!("status poll failed: {error}");
                reduce(&mut self.state, Event::RequestFailed(error.to_error_info()));
            }
            AppMessage::IdleExpired { generation } => {
                let transitioning = self.state.session_transitioning();
                match self.sequencer.on_idle_expired(generation, transitioning) {
                    IdleExpiry::ProbeBusy => self.probe_busy(generation),
                    IdleExpiry::Restarted => {
                        debug!("idle expiry during session transition; grace period granted")
                    }
                    IdleExpiry::Stale => {}
                }
            }
            AppMessage::BusyProbeResolved { generation, result } => match result {
                Ok(status) => {
                    let busy = status.session.busy_status == BusyStatus::Busy;
                    let previous_pending = self.state.app_status == AppStatus::Starting;
                    // The probe is a status document like any other; reduce
                    // it before acting on the outcome.
                    reduce(
                        &mut self.state,
                        Event::StatusReceived {
                            status,
                            previous_pending,
                        },
                    );
                    match self.sequencer.on_busy_probe(generation, busy) {
                        ProbeOutcome::WarningStarted => {
                            reduce(&mut self.state, Event::OverlayVisibilitySet(true));
                        }
                        ProbeOutcome::Restarted | ProbeOutcome::Stale => {}
                    }
                }
                Err(error) => {
                    debug!("busy probe failed: {error}");
                    self.sequencer.on_probe_failed(generation);
                    reduce(&mut self.state, Event::RequestFailed(error.to_error_info()));
                }
            },
            AppMessage::BufferExpired { generation } => {
                if self.sequencer.on_buffer_expired(generation) {
                    self.submit_terminate();
                }
            }
            AppMessage::AuthResolved { token, result } => {
                match result {
                    Ok(response) => {
                        let accepted = response.status;
                        reduce(
                            &mut self.state,
                            Event::AuthStatusUpdated {
                                status: response.status,
                                error: response.error,
                            },
                        );
                        if accepted {
                            reduce(&mut self.state, Event::AuthTokenSet(token));
                        }
                    }
                    Err(error) => {
                        warn!("token validation failed: {error}");
                        reduce(
                            &mut self.state,
                            Event::AuthStatusUpdated {
                                status: false,
                                error: Some(error.to_error_info()),
                            },
                        );
                    }
                }
                self.reconfigure_sequencer();
            }
            AppMessage::LicensingResolved(Ok(status)) => {
                reduce(&mut self.state, Event::SubmitReceived(status));
                self.entitlement_cursor = 0;
            }
            AppMessage::LicensingResolved(Err(error)) => {
                warn!("licensing request failed: {error}");
                reduce(&mut self.state, Event::RequestFailed(error.to_error_info()));
            }
            AppMessage::SessionControlResolved(Ok(status)) => {
                reduce(&mut self.state, Event::SubmitReceived(status));
            }
            AppMessage::SessionControlResolved(Err(error)) => {
                warn!("session control request failed: {error}");
                reduce(&mut self.state, Event::RequestFailed(error.to_error_info()));
            }
            AppMessage::TerminateResolved(Ok(response)) => {
                reduce(
                    &mut self.state,
                    Event::TerminateReceived {
                        load_url: response.load_url.clone(),
                    },
                );
                self.farewell_url = response.load_url;
                self.should_quit = true;
            }
            AppMessage::TerminateResolved(Err(error)) => {
                warn!("terminate request failed: {error}");
                reduce(&mut self.state, Event::RequestFailed(error.to_error_info()));
            }
        }
    }

    /// Run a confirmed action from the confirmation dialog.
    pub(crate) fn run_confirmed(&mut self, action: ConfirmAction) {
        match action {
            ConfirmAction::StartSession => self.submit_start_session(),
            ConfirmAction::StopSession => self.submit_stop_session(),
            ConfirmAction::Terminate => self.submit_terminate(),
            ConfirmAction::UnsetLicensing => self.submit_unset_licensing(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{parse_proxy_url, ProxyClient};
    use crate::models::{ErrorInfo, ErrorKind, SessionStatus, StatusResponse};
    use tokio::sync::mpsc;

    fn test_app() -> (App, mpsc::UnboundedReceiver<AppMessage>) {
        let (url, _) = parse_proxy_url("http://127.0.0.1:1/").unwrap();
        let (tx, rx) = mpsc::unbounded_channel();
        (App::new(Arc::new(ProxyClient::new(url)), tx, None), rx)
    }

    fn status_doc(status: AppStatus, busy: BusyStatus) -> StatusResponse {
        StatusResponse {
            session: SessionStatus {
                status,
                busy_status: busy,
                version: None,
            },
            licensing: None,
            error: None,
            ws_env: None,
        }
    }

    #[tokio::test]
    async fn test_status_fetch_reduces_into_store() {
        let (mut app, _rx) = test_app();
        app.handle_message(AppMessage::StatusFetched(Ok(status_doc(
            AppStatus::Up,
            BusyStatus::Idle,
        ))));
        assert_eq!(app.state.app_status, AppStatus::Up);
        assert!(app.state.has_fetched_status);
    }

    #[tokio::test]
    async fn test_pending_to_up_hides_overlay() {
        let (mut app, _rx) = test_app();
        app.handle_message(AppMessage::StatusFetched(Ok(status_doc(
            AppStatus::Starting,
            BusyStatus::Na,
        ))));
        assert!(app.state.overlay_visible);

        app.handle_message(AppMessage::StatusFetched(Ok(status_doc(
            AppStatus::Up,
            BusyStatus::Idle,
        ))));
        assert!(!app.state.overlay_visible);
    }

    #[tokio::test]
    async fn test_env_config_arms_sequencer() {
        let (mut app, _rx) = test_app();
        let config: crate::models::EnvConfig = serde_json::from_str(
            r#"{
                "authentication": {"enabled": false, "status": false},
                "idleTimeoutDuration": 600
            }"#,
        )
        .unwrap();
        app.handle_message(AppMessage::EnvConfigFetched(Ok(config)));
        assert!(app.state.timeout.enabled());
        assert_eq!(app.sequencer.pending_countdowns(), 1);

        app.shutdown();
        assert_eq!(app.sequencer.pending_countdowns(), 0);
    }

    #[tokio::test]
    async fn test_auth_gate_keeps_sequencer_disarmed() {
        let (mut app, _rx) = test_app();
        let config: crate::models::EnvConfig = serde_json::from_str(
            r#"{
                "authentication": {"enabled": true, "status": false},
                "idleTimeoutDuration": 600
            }"#,
        )
        .unwrap();
        app.handle_message(AppMessage::EnvConfigFetched(Ok(config)));
        assert_eq!(app.sequencer.pending_countdowns(), 0);
    }

    #[tokio::test]
    async fn test_terminate_resolution_quits_with_farewell() {
        let (mut app, _rx) = test_app();
        app.handle_message(AppMessage::TerminateResolved(Ok(
            crate::models::TerminateResponse {
                load_url: Some("../".to_string()),
            },
        )));
        assert!(app.should_quit);
        assert_eq!(app.farewell_url.as_deref(), Some("../"));
        assert_eq!(app.state.load_url.as_deref(), Some("../"));
    }

    #[tokio::test]
    async fn test_auth_rejection_recorded() {
        let (mut app, _rx) = test_app();
        app.state.auth.enabled = true;
        app.handle_message(AppMessage::AuthResolved {
            token: "bad".to_string(),
            result: Ok(crate::client::AuthResponse {
                status: false,
                error: Some(ErrorInfo::new(ErrorKind::Auth, "token rejected")),
            }),
        });
        assert!(!app.state.auth_satisfied());
        assert!(app.state.auth.token.is_none());
        assert_eq!(app.state.error.as_ref().unwrap().kind, ErrorKind::Auth);
    }

    #[tokio::test]
    async fn test_licensing_form_requests() {
        let mut form = LicensingForm::default();
        assert_eq!(form.to_request(), Some(LicensingRequest::ExistingLicense));

        form.toggle_field();
        assert_eq!(form.field, LicensingField::NetworkLicenseManager);
        assert_eq!(form.to_request(), None);

        form.conn_str = " 27000@host ".to_string();
        assert_eq!(
            form.to_request(),
            Some(LicensingRequest::NetworkLicenseManager {
                conn_str: "27000@host".to_string()
            })
        );
    }
}
