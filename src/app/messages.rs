//! AppMessage enum for async communication within the application.

use crate::client::AuthResponse;
use crate::error::ProxyError;
use crate::models::{EnvConfig, StatusResponse, TerminateResponse};

/// Messages received from spawned tasks (fetches, countdowns). The event
/// loop is the only consumer; every message is applied to the store before
/// the overlay is next evaluated.
#[derive(Debug)]
pub enum AppMessage {
    /// Environment config fetch finished.
    EnvConfigFetched(Result<EnvConfig, ProxyError>),
    /// A periodic (or initial) status poll finished.
    StatusFetched(Result<StatusResponse, ProxyError>),
    /// The idle countdown fired.
    IdleExpired { generation: u64 },
    /// The live busy probe issued after an idle expiry finished.
    BusyProbeResolved {
        generation: u64,
        result: Result<StatusResponse, ProxyError>,
    },
    /// The warning-phase buffer countdown fired.
    BufferExpired { generation: u64 },
    /// Token validation against the proxy finished.
    AuthResolved {
        token: String,
        result: Result<AuthResponse, ProxyError>,
    },
    /// A licensing call (set/unset/entitlement) finished.
    LicensingResolved(Result<StatusResponse, ProxyError>),
    /// A start/stop session call finished.
    SessionControlResolved(Result<StatusResponse, ProxyError>),
    /// The terminate call finished.
    TerminateResolved(Result<TerminateResponse, ProxyError>),
}
