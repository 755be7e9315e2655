use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use console_logging::console_debug;
use fleet_core::{classify, Action, CategorizedError, RawFailure};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::fetch::{Gateway, GatewayError, GatewayRequest, GatewayResponse};
use crate::{ConfigValidation, ConnectorInfo, ConnectorStatus, PluginInfo};

/// Per-operation deadlines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiTimeouts {
    pub list: Duration,
    pub status: Duration,
    pub action: Duration,
}

impl Default for ApiTimeouts {
    fn default() -> Self {
        Self {
            list: Duration::from_secs(30),
            status: Duration::from_secs(15),
            action: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    /// Non-2xx response.
    #[error("{message}")]
    Http {
        status: u16,
        /// Parsed JSON body, the raw text as a string, or null when empty.
        data: Value,
        message: String,
    },
    /// The request never produced a response.
    #[error("{}", .categorized.message)]
    Transport {
        categorized: CategorizedError,
        #[source]
        source: GatewayError,
    },
    #[error("unexpected response from {url}: {reason}")]
    Decode { url: String, reason: String },
    #[error("invalid request url: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Diagnosis for this failure, without re-classifying transport errors.
    pub fn categorized(&self) -> CategorizedError {
        match self {
            ApiError::Transport { categorized, .. } => categorized.clone(),
            ApiError::Http {
                status, message, ..
            } => classify(&RawFailure::Response {
                status: *status,
                status_text: message.clone(),
            }),
            ApiError::Decode { .. } | ApiError::InvalidUrl(_) => {
                classify(&RawFailure::Other(self.to_string()))
            }
        }
    }

    /// Short text suitable for a per-connector failure list.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Http { message, .. } => message.clone(),
            ApiError::Transport { categorized, .. } => categorized.message.clone(),
            other => other.to_string(),
        }
    }

    fn transport(source: GatewayError) -> Self {
        let categorized = classify(&source.to_raw_failure());
        ApiError::Transport {
            categorized,
            source,
        }
    }

    fn from_response(response: &GatewayResponse) -> Self {
        let data = if response.body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&response.body).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&response.body).into_owned())
            })
        };
        let message = data
            .get("message")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|message| !message.is_empty())
            .map(ToOwned::to_owned)
            .unwrap_or_else(|| {
                if response.status_text.is_empty() {
                    format!("HTTP {}", response.status)
                } else {
                    response.status_text.clone()
                }
            });
        ApiError::Http {
            status: response.status,
            data,
            message,
        }
    }
}

/// Typed operations against the control-plane REST API.
#[derive(Clone)]
pub struct ApiClient {
    gateway: Arc<dyn Gateway>,
    base_url: Url,
    timeouts: ApiTimeouts,
    cancel: CancellationToken,
}

impl ApiClient {
    pub fn new(
        gateway: Arc<dyn Gateway>,
        base_url: &str,
        timeouts: ApiTimeouts,
    ) -> Result<Self, ApiError> {
        let base_url =
            Url::parse(base_url).map_err(|err| ApiError::InvalidUrl(format!("{base_url}: {err}")))?;
        if !matches!(base_url.scheme(), "http" | "https") || base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(format!(
                "{base_url}: expected an http(s) base url"
            )));
        }
        Ok(Self {
            gateway,
            base_url,
            timeouts,
            cancel: CancellationToken::new(),
        })
    }

    /// Token shared by every request of this client; cancelling it aborts
    /// all in-flight calls.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn timeouts(&self) -> ApiTimeouts {
        self.timeouts
    }

    pub async fn list_connectors(&self, cluster: &str) -> Result<Vec<String>, ApiError> {
        let url = self.url(&["api", cluster, "connectors"])?;
        self.get_json(url, self.timeouts.list).await
    }

    pub async fn connector_status(
        &self,
        cluster: &str,
        name: &str,
    ) -> Result<ConnectorStatus, ApiError> {
        let url = self.url(&["api", cluster, "connectors", name, "status"])?;
        self.get_json(url, self.timeouts.status).await
    }

    pub async fn connector_info(
        &self,
        cluster: &str,
        name: &str,
    ) -> Result<ConnectorInfo, ApiError> {
        let url = self.url(&["api", cluster, "connectors", name])?;
        self.get_json(url, self.timeouts.status).await
    }

    /// Issues a control action. Any 2xx, including an empty 204, is success.
    pub async fn act(&self, cluster: &str, name: &str, action: Action) -> Result<(), ApiError> {
        let (method, url) = match action {
            Action::Pause => (
                Method::PUT,
                self.url(&["api", cluster, "connectors", name, "pause"])?,
            ),
            Action::Resume => (
                Method::PUT,
                self.url(&["api", cluster, "connectors", name, "resume"])?,
            ),
            Action::Restart => (
                Method::POST,
                self.url(&["api", cluster, "connectors", name, "restart"])?,
            ),
            Action::Delete => (
                Method::DELETE,
                self.url(&["api", cluster, "connectors", name])?,
            ),
        };
        self.execute(GatewayRequest::new(method, url), self.timeouts.action)
            .await
            .map(|_| ())
    }

    pub async fn list_plugins(&self, cluster: &str) -> Result<Vec<PluginInfo>, ApiError> {
        let url = self.url(&["api", cluster, "connector-plugins"])?;
        self.get_json(url, self.timeouts.list).await
    }

    /// Which of `desired` plugin classes are installed on the cluster.
    pub async fn available_plugins(
        &self,
        cluster: &str,
        desired: &[String],
    ) -> Result<BTreeSet<String>, ApiError> {
        let installed: BTreeSet<String> = self
            .list_plugins(cluster)
            .await?
            .into_iter()
            .map(|plugin| plugin.class_name)
            .collect();
        Ok(desired
            .iter()
            .filter(|class_name| installed.contains(*class_name))
            .cloned()
            .collect())
    }

    pub async fn validate_config(
        &self,
        cluster: &str,
        plugin_class: &str,
        config: &BTreeMap<String, String>,
    ) -> Result<ConfigValidation, ApiError> {
        let url = self.url(&[
            "api",
            cluster,
            "connector-plugins",
            plugin_class,
            "config",
            "validate",
        ])?;
        let body = serde_json::to_vec(config).map_err(|err| ApiError::Decode {
            url: url.to_string(),
            reason: err.to_string(),
        })?;
        let request =
            GatewayRequest::new(Method::PUT, url.clone()).with_json_body(Bytes::from(body));
        let payload = self.execute(request, self.timeouts.action).await?;
        decode(&url, payload)
    }

    fn url(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        timeout: Duration,
    ) -> Result<T, ApiError> {
        let payload = self
            .execute(GatewayRequest::new(Method::GET, url.clone()), timeout)
            .await?;
        decode(&url, payload)
    }

    /// Returns the body of a successful response, or `None` when it is empty.
    async fn execute(
        &self,
        request: GatewayRequest,
        timeout: Duration,
    ) -> Result<Option<Bytes>, ApiError> {
        let method = request.method.clone();
        let path = request.url.path().to_string();
        let response = match self.gateway.send(request, timeout, &self.cancel).await {
            Ok(response) => response,
            Err(err) => {
                let err = ApiError::transport(err);
                console_debug!("{method} {path} failed: {err}");
                return Err(err);
            }
        };

        if !response.ok() {
            let err = ApiError::from_response(&response);
            console_debug!("{method} {path} -> {}: {err}", response.status);
            return Err(err);
        }
        if response.status == 204 || response.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        Ok(Some(response.body))
    }
}

fn decode<T: DeserializeOwned>(url: &Url, payload: Option<Bytes>) -> Result<T, ApiError> {
    let body = payload.ok_or_else(|| ApiError::Decode {
        url: url.path().to_string(),
        reason: "empty response body".to_string(),
    })?;
    serde_json::from_slice(&body).map_err(|err| ApiError::Decode {
        url: url.path().to_string(),
        reason: err.to_string(),
    })
}
