//! Wire types for the session proxy's JSON-over-HTTP API.
//!
//! Field spellings follow the proxy's wire format (camelCase documents, a
//! `matlab` key for the managed session block), while the Rust-side names
//! stay domain-neutral. All of these are plain serde structs; they carry no
//! behavior beyond a few convenience predicates used by the store and the
//! overlay selector.

use serde::{Deserialize, Serialize};

/// Lifecycle status of the managed application session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppStatus {
    Down,
    Starting,
    Up,
    Stopping,
}

impl AppStatus {
    /// True while the session is mid-transition (starting up or shutting
    /// down). The idle timer grants a grace period in these states.
    pub fn is_transitioning(&self) -> bool {
        matches!(self, AppStatus::Starting | AppStatus::Stopping)
    }
}

/// Whether the managed application is currently executing work.
///
/// `Na` is reported while the session is down or the backend cannot tell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BusyStatus {
    Busy,
    Idle,
    Na,
}

/// A license entitlement the account may consume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entitlement {
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_number: Option<String>,
}

/// Licensing configuration reported by the proxy, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LicensingInfo {
    /// Online licensing against the vendor's license service.
    #[serde(rename = "mhlm")]
    Online {
        #[serde(rename = "emailAddress")]
        email_address: String,
        #[serde(default)]
        entitlements: Vec<Entitlement>,
        #[serde(rename = "entitlementId", default)]
        entitlement_id: Option<String>,
    },
    /// A network license manager reachable at `conn_str`.
    #[serde(rename = "nlm")]
    NetworkLicenseManager {
        #[serde(rename = "connectionString")]
        conn_str: String,
    },
    /// License is baked into the existing application installation.
    #[serde(rename = "existing_license")]
    ExistingLicense,
}

impl LicensingInfo {
    /// Online licensing with entitlements fetched but none consumed yet.
    pub fn has_unconsumed_entitlements(&self) -> bool {
        matches!(
            self,
            LicensingInfo::Online { entitlements, .. } if !entitlements.is_empty()
        )
    }

    /// An entitlement has been selected (or the licensing kind needs none).
    pub fn is_entitled(&self) -> bool {
        match self {
            LicensingInfo::Online { entitlement_id, .. } => entitlement_id.is_some(),
            LicensingInfo::NetworkLicenseManager { .. } | LicensingInfo::ExistingLicense => true,
        }
    }
}

/// Classification of a backend-reported error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    #[serde(rename = "ConnectionError")]
    Connection,
    #[serde(rename = "InstallError")]
    Install,
    #[serde(rename = "AuthError")]
    Auth,
    #[serde(other)]
    Other,
}

/// An error reported inside a status document or auth response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorInfo {
    #[serde(rename = "type", default = "ErrorInfo::default_kind")]
    pub kind: ErrorKind,
    pub message: String,
    #[serde(default)]
    pub logs: Option<Vec<String>>,
}

impl ErrorInfo {
    fn default_kind() -> ErrorKind {
        ErrorKind::Other
    }

    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            logs: None,
        }
    }
}

/// The managed-session block of a status document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStatus {
    pub status: AppStatus,
    #[serde(rename = "busyStatus", default = "SessionStatus::default_busy")]
    pub busy_status: BusyStatus,
    #[serde(default)]
    pub version: Option<String>,
}

impl SessionStatus {
    fn default_busy() -> BusyStatus {
        BusyStatus::Na
    }
}

/// Response of `GET /get_status` — the document the poller delivers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    #[serde(rename = "matlab")]
    pub session: SessionStatus,
    #[serde(default)]
    pub licensing: Option<LicensingInfo>,
    #[serde(default)]
    pub error: Option<ErrorInfo>,
    #[serde(rename = "wsEnv", default)]
    pub ws_env: Option<String>,
}

/// Authentication block of the environment config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AuthInfo {
    pub enabled: bool,
    pub status: bool,
}

/// Version block of the environment config.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SessionVersionInfo {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub supported_versions: Option<Vec<String>>,
}

/// Response of `GET /get_env_config` — fetched once at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvConfig {
    pub authentication: AuthInfo,
    /// Idle timeout in seconds; absent or null disables the idle timer.
    #[serde(rename = "idleTimeoutDuration", default)]
    pub idle_timeout_duration: Option<u64>,
    /// Select the single-session embed HTML variant.
    #[serde(rename = "useMOS", default)]
    pub use_mos: bool,
    /// Append the fully-qualified origin as an `mre` parameter.
    #[serde(rename = "useMRE", default)]
    pub use_mre: bool,
    #[serde(rename = "matlab", default)]
    pub session: SessionVersionInfo,
}

impl EnvConfig {
    /// Relative URL of the embed variant selected by the feature flags.
    ///
    /// An iframe has no TUI equivalent, but the variant choice and URL shape
    /// are preserved and surfaced on the information panel.
    pub fn embed_url(&self, origin: &str) -> String {
        let html = if self.use_mos {
            "index-matlabonlineserver.html"
        } else {
            "index-jsd-cr.html"
        };
        if self.use_mre {
            format!("./{html}?mre={origin}")
        } else {
            format!("./{html}")
        }
    }
}

/// Response of `DELETE /terminate_integration`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerminateResponse {
    #[serde(rename = "loadUrl", default)]
    pub load_url: Option<String>,
}

/// Body of `PUT /set_licensing`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LicensingRequest {
    #[serde(rename = "nlm")]
    NetworkLicenseManager {
        #[serde(rename = "connectionString")]
        conn_str: String,
    },
    #[serde(rename = "existing_license")]
    ExistingLicense,
}
