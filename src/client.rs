//! HTTP client for the session proxy backend.
//!
//! Thin wrapper over a reusable [`reqwest::Client`]: one method per endpoint,
//! JSON in and out, non-2xx responses mapped to [`ProxyError::Server`]. The
//! auth token, when present, rides along as the `mwi_auth_token` header on
//! every request.

use crate::error::ProxyError;
use crate::models::{
    EnvConfig, LicensingRequest, StatusResponse, TerminateResponse,
};
use reqwest::{Client, Method, Url};
use serde::Deserialize;

/// Name of both the auth query parameter and the auth request header.
pub const AUTH_TOKEN_PARAM: &str = "mwi_auth_token";

/// Response of `POST /authenticate`.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub status: bool,
    #[serde(default)]
    pub error: Option<crate::models::ErrorInfo>,
}

/// Client for the session-management proxy API.
#[derive(Debug, Clone)]
pub struct ProxyClient {
    base_url: Url,
    token: Option<String>,
    client: Client,
}

/// Split an auth token out of a raw proxy URL.
///
/// The token arrives as a `mwi_auth_token` query parameter; it is consumed
/// here and stripped from the URL we keep, so the token never shows up in
/// logs or on the information panel (the replace-state analogue of the
/// browser flow).
pub fn parse_proxy_url(raw: &str) -> Result<(Url, Option<String>), ProxyError> {
    let url = Url::parse(raw).map_err(|e| ProxyError::InvalidUrl {
        url: raw.to_string(),
        message: e.to_string(),
    })?;

    let token = url
        .query_pairs()
        .find(|(k, _)| k == AUTH_TOKEN_PARAM)
        .map(|(_, v)| v.into_owned());

    if token.is_none() {
        return Ok((url, None));
    }

    let mut stripped = url.clone();
    let remaining: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != AUTH_TOKEN_PARAM)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if remaining.is_empty() {
        stripped.set_query(None);
    } else {
        stripped
            .query_pairs_mut()
            .clear()
            .extend_pairs(remaining)
            .finish();
    }

    Ok((stripped, token))
}

impl ProxyClient {
    /// Create a new client for the proxy at `base_url`.
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            token: None,
            client: Client::new(),
        }
    }

    /// Build a client from a raw proxy URL. Any embedded `mwi_auth_token`
    /// is consumed from the URL, attached to every subsequent request, and
    /// also returned so the caller can validate it against the proxy.
    pub fn from_url(raw: &str) -> Result<(Self, Option<String>), ProxyError> {
        let (base_url, token) = parse_proxy_url(raw)?;
        let mut client = Self::new(base_url);
        if let Some(ref token) = token {
            client = client.with_token(token.clone());
        }
        Ok((client, token))
    }

    /// Attach an auth token to all subsequent requests.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        format!("{base}/{path}")
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self.client.request(method, self.endpoint(path));
        if let Some(ref token) = self.token {
            builder = builder.header(AUTH_TOKEN_PARAM, token);
        }
        builder
    }

    async fn expect_json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ProxyError> {
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(ProxyError::Server { status, message });
        }
        Ok(response.json().await?)
    }

    /// Fetch the current status document (`GET /get_status`).
    pub async fn get_status(&self) -> Result<StatusResponse, ProxyError> {
        let response = self.request(Method::GET, "get_status").send().await?;
        Self::expect_json(response).await
    }

    /// Fetch the environment configuration (`GET /get_env_config`).
    pub async fn get_env_config(&self) -> Result<EnvConfig, ProxyError> {
        let response = self.request(Method::GET, "get_env_config").send().await?;
        Self::expect_json(response).await
    }

    /// Validate an auth token against the proxy (`POST /authenticate`).
    pub async fn authenticate(&self, token: &str) -> Result<AuthResponse, ProxyError> {
        let response = self
            .request(Method::POST, "authenticate")
            .header(AUTH_TOKEN_PARAM, token)
            .send()
            .await?;
        Self::expect_json(response).await
    }

    /// Submit licensing input (`PUT /set_licensing`). Returns the refreshed
    /// status document.
    pub async fn set_licensing(
        &self,
        request: &LicensingRequest,
    ) -> Result<StatusResponse, ProxyError> {
        let response = self
            .request(Method::PUT, "set_licensing")
            .json(request)
            .send()
            .await?;
        Self::expect_json(response).await
    }

    /// Discard the configured licensing (`DELETE /set_licensing`).
    pub async fn unset_licensing(&self) -> Result<StatusResponse, ProxyError> {
        let response = self.request(Method::DELETE, "set_licensing").send().await?;
        Self::expect_json(response).await
    }

    /// Consume an entitlement (`PUT /update_entitlement`).
    pub async fn update_entitlement(
        &self,
        entitlement_id: &str,
    ) -> Result<StatusResponse, ProxyError> {
        let body = serde_json::json!({ "entitlement_id": entitlement_id });
        let response = self
            .request(Method::PUT, "update_entitlement")
            .json(&body)
            .send()
            .await?;
        Self::expect_json(response).await
    }

    /// Start the managed application (`PUT /start_matlab`).
    pub async fn start_session(&self) -> Result<StatusResponse, ProxyError> {
        let response = self.request(Method::PUT, "start_matlab").send().await?;
        Self::expect_json(response).await
    }

    /// Stop the managed application (`DELETE /stop_matlab`).
    pub async fn stop_session(&self) -> Result<StatusResponse, ProxyError> {
        let response = self.request(Method::DELETE, "stop_matlab").send().await?;
        Self::expect_json(response).await
    }

    /// Terminate the whole integration (`DELETE /terminate_integration`).
    ///
    /// Sent with no body; the response carries the URL the caller should
    /// navigate to once the proxy is gone.
    pub async fn terminate(&self) -> Result<TerminateResponse, ProxyError> {
        let response = self
            .request(Method::DELETE, "terminate_integration")
            .send()
            .await?;
        Self::expect_json(response).await
    }
}
