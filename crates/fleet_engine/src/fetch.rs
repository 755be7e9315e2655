use std::error::Error as _;
use std::time::Duration;

use bytes::Bytes;
use fleet_core::RawFailure;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Method;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use url::Url;

#[derive(Debug, Clone)]
pub struct GatewaySettings {
    pub connect_timeout: Duration,
    pub user_agent: String,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            user_agent: concat!("fleet-console/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GatewayRequest {
    pub method: Method,
    pub url: Url,
    /// Pre-serialized JSON body.
    pub body: Option<Bytes>,
}

impl GatewayRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            body: None,
        }
    }

    pub fn with_json_body(mut self, body: Bytes) -> Self {
        self.body = Some(body);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayResponse {
    pub status: u16,
    pub status_text: String,
    pub body: Bytes,
}

impl GatewayResponse {
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Raw transport failure. Classification happens in the API layer.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("request exceeded its {}ms deadline", .after.as_millis())]
    Timeout { after: Duration },
    #[error("request cancelled")]
    Cancelled,
    #[error("{}", describe_transport(.0))]
    Transport(#[source] reqwest::Error),
}

impl GatewayError {
    pub fn to_raw_failure(&self) -> RawFailure {
        match self {
            GatewayError::Timeout { .. } | GatewayError::Cancelled => RawFailure::Aborted {
                message: self.to_string(),
            },
            GatewayError::Transport(err) if err.is_timeout() => RawFailure::Aborted {
                message: self.to_string(),
            },
            GatewayError::Transport(_) => RawFailure::Exception {
                name: None,
                message: self.to_string(),
            },
        }
    }
}

/// One HTTP exchange with a deadline and a cancellation token.
#[async_trait::async_trait]
pub trait Gateway: Send + Sync {
    async fn send(
        &self,
        request: GatewayRequest,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<GatewayResponse, GatewayError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestGateway {
    client: reqwest::Client,
}

impl ReqwestGateway {
    pub fn new(settings: &GatewaySettings) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .user_agent(settings.user_agent.clone())
            .build()
            .map_err(GatewayError::Transport)?;
        Ok(Self { client })
    }

    async fn exchange(&self, request: GatewayRequest) -> Result<GatewayResponse, GatewayError> {
        let mut builder = self
            .client
            .request(request.method, request.url)
            .header(ACCEPT, "application/json");
        if let Some(body) = request.body {
            builder = builder.header(CONTENT_TYPE, "application/json").body(body);
        }

        let response = builder.send().await.map_err(GatewayError::Transport)?;
        let status = response.status();
        let body = response.bytes().await.map_err(GatewayError::Transport)?;

        Ok(GatewayResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            body,
        })
    }
}

#[async_trait::async_trait]
impl Gateway for ReqwestGateway {
    async fn send(
        &self,
        request: GatewayRequest,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<GatewayResponse, GatewayError> {
        // Dropping the losing branch drops the in-flight request and its connection.
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(GatewayError::Cancelled),
            outcome = tokio::time::timeout(timeout, self.exchange(request)) => match outcome {
                Ok(result) => result,
                Err(_) => Err(GatewayError::Timeout { after: timeout }),
            },
        }
    }
}

/// Describes a transport error without the request URL, so connector names
/// never leak into classification.
fn describe_transport(err: &reqwest::Error) -> String {
    let stage = if err.is_connect() {
        "connect error"
    } else if err.is_timeout() {
        "operation timed out"
    } else if err.is_body() || err.is_decode() {
        "error reading response body"
    } else if err.is_request() {
        "error sending request"
    } else {
        "transport error"
    };

    let mut parts = vec![stage.to_string()];
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !text.is_empty() && parts.last() != Some(&text) {
            parts.push(text);
        }
        source = cause.source();
    }
    parts.join(": ")
}
