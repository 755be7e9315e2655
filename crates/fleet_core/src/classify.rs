//! Turns raw failures into a [`CategorizedError`].
//!
//! Everything here is pure: no logging, no IO. The engine converts transport
//! errors into a [`RawFailure`] and calls [`classify`]; tests can do the same
//! with literal inputs.

use std::fmt;

/// A failure as observed at the edge, before any interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawFailure {
    /// The call was cancelled or hit its deadline.
    Aborted { message: String },
    /// An error value with an optional type name and a message.
    Exception { name: Option<String>, message: String },
    /// The remote answered with an HTTP status.
    Response { status: u16, status_text: String },
    /// Anything else (a bare string, an unrecognised value rendered as text).
    Other(String),
}

impl RawFailure {
    /// Convenience for an unnamed error carrying only a message.
    pub fn message(message: impl Into<String>) -> Self {
        RawFailure::Exception {
            name: None,
            message: message.into(),
        }
    }

    fn text(&self) -> String {
        match self {
            RawFailure::Aborted { message } => message.clone(),
            RawFailure::Exception { name, message } => match name {
                Some(name) if !name.is_empty() => format!("{name}: {message}"),
                _ => message.clone(),
            },
            RawFailure::Response {
                status,
                status_text,
            } => format!("HTTP {status}: {status_text}"),
            RawFailure::Other(text) => text.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ConnectionRefused,
    Timeout,
    DnsFailure,
    SslTlsError,
    NetworkError,
    HttpError { status: u16 },
    Unknown,
}

impl ErrorKind {
    /// Whether an operator retry has a reasonable chance of succeeding.
    pub fn is_retryable(self) -> bool {
        match self {
            ErrorKind::Timeout | ErrorKind::ConnectionRefused | ErrorKind::NetworkError => true,
            ErrorKind::HttpError { status } => matches!(status, 500 | 502 | 503 | 504),
            ErrorKind::DnsFailure | ErrorKind::SslTlsError | ErrorKind::Unknown => false,
        }
    }

    /// Fixed remediation hints for this kind.
    pub fn troubleshooting(self) -> &'static [&'static str] {
        match self {
            ErrorKind::ConnectionRefused => &[
                "Check that the control-plane API is running",
                "Verify the configured base URL and port",
                "Check firewall rules between this host and the API",
            ],
            ErrorKind::Timeout => &[
                "The API did not answer in time; it may be overloaded",
                "Retry in a few seconds",
                "Consider raising the request timeout",
            ],
            ErrorKind::DnsFailure => &[
                "Check the hostname in the configured base URL",
                "Verify DNS resolution from this host",
            ],
            ErrorKind::SslTlsError => &[
                "Verify the server certificate is valid and trusted",
                "Check whether the base URL should use http or https",
            ],
            ErrorKind::NetworkError => &[
                "Check network connectivity to the API host",
                "Retry once the network is reachable",
            ],
            ErrorKind::HttpError { status } => http_troubleshooting(status),
            ErrorKind::Unknown => &[
                "Check the console log for details",
                "Retry the operation",
            ],
        }
    }

    fn headline(self) -> &'static str {
        match self {
            ErrorKind::ConnectionRefused => "Connection refused by the control-plane API",
            ErrorKind::Timeout => "Request timed out",
            ErrorKind::DnsFailure => "Could not resolve the API host",
            ErrorKind::SslTlsError => "TLS handshake with the API failed",
            ErrorKind::NetworkError => "Network error while contacting the API",
            ErrorKind::HttpError { .. } => "HTTP error",
            ErrorKind::Unknown => "Unknown error",
        }
    }
}

fn http_troubleshooting(status: u16) -> &'static [&'static str] {
    match status {
        400 => &[
            "The request was rejected as malformed",
            "Check the connector name and submitted configuration",
        ],
        401 | 403 => &[
            "Check your credentials and permissions for this cluster",
            "Sign in again if your session expired",
        ],
        404 => &[
            "The connector or cluster no longer exists",
            "Refresh the fleet view",
        ],
        409 => &[
            "The connector is in a conflicting state or a rebalance is in progress",
            "Refresh and retry once the state settles",
        ],
        500..=599 => &[
            "The API reported a server-side failure",
            "Retry in a few seconds",
            "Check the control-plane logs if the failure persists",
        ],
        _ => &["Check the response details and the API documentation"],
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::ConnectionRefused => write!(f, "connection refused"),
            ErrorKind::Timeout => write!(f, "timeout"),
            ErrorKind::DnsFailure => write!(f, "dns failure"),
            ErrorKind::SslTlsError => write!(f, "ssl/tls error"),
            ErrorKind::NetworkError => write!(f, "network error"),
            ErrorKind::HttpError { status } => write!(f, "http {status}"),
            ErrorKind::Unknown => write!(f, "unknown"),
        }
    }
}

/// Structured diagnosis of one failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorizedError {
    pub kind: ErrorKind,
    pub message: String,
    pub troubleshooting: &'static [&'static str],
    pub retryable: bool,
    pub http_status: Option<u16>,
    /// Text of the underlying failure.
    pub cause: String,
}

impl CategorizedError {
    pub fn new(kind: ErrorKind, message: impl Into<String>, cause: impl Into<String>) -> Self {
        let http_status = match kind {
            ErrorKind::HttpError { status } => Some(status),
            _ => None,
        };
        Self {
            kind,
            message: message.into(),
            troubleshooting: kind.troubleshooting(),
            retryable: kind.is_retryable(),
            http_status,
            cause: cause.into(),
        }
    }
}

impl fmt::Display for CategorizedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.kind)
    }
}

const REFUSED_PATTERNS: &[&str] = &["econnrefused", "connection refused"];

const DNS_PATTERNS: &[&str] = &[
    "enotfound",
    "eai_again",
    "getaddrinfo",
    "dns error",
    "failed to lookup address",
    "name or service not known",
    "nodename nor servname",
    "no such host",
];

const TLS_PATTERNS: &[&str] = &[
    "certificate",
    "ssl",
    "tls",
    "handshake",
    "self signed",
    "self-signed",
];

const NETWORK_PATTERNS: &[&str] = &[
    "network",
    "econnreset",
    "enetunreach",
    "ehostunreach",
    "unreachable",
    "connection reset",
    "connection closed",
    "broken pipe",
    "socket",
    "error sending request",
    "failed to fetch",
];

const ABORT_NAMES: &[&str] = &["aborterror", "timeouterror"];

/// Classifies a raw failure. First match wins:
/// abort, received response, refused, dns, tls, embedded http status,
/// network, unknown.
pub fn classify(raw: &RawFailure) -> CategorizedError {
    let text = raw.text();
    let lowered = text.to_ascii_lowercase();

    if is_abort(raw) {
        return CategorizedError::new(ErrorKind::Timeout, ErrorKind::Timeout.headline(), text);
    }
    // A received response is classified by its status alone; the status
    // text may quote server messages that mention ssl or dns.
    if let RawFailure::Response {
        status,
        status_text,
    } = raw
    {
        let message = if status_text.trim().is_empty() {
            format!("HTTP {status}")
        } else {
            format!("HTTP {status}: {status_text}")
        };
        let status = *status;
        return CategorizedError::new(ErrorKind::HttpError { status }, message, text);
    }
    for (patterns, kind) in [
        (REFUSED_PATTERNS, ErrorKind::ConnectionRefused),
        (DNS_PATTERNS, ErrorKind::DnsFailure),
        (TLS_PATTERNS, ErrorKind::SslTlsError),
    ] {
        if contains_any(&lowered, patterns) {
            return CategorizedError::new(kind, kind.headline(), text);
        }
    }

    if let Some(status) = embedded_http_status(&text) {
        return CategorizedError::new(ErrorKind::HttpError { status }, text.clone(), text);
    }

    if contains_any(&lowered, NETWORK_PATTERNS) {
        return CategorizedError::new(
            ErrorKind::NetworkError,
            ErrorKind::NetworkError.headline(),
            text,
        );
    }

    let message = if text.trim().is_empty() {
        ErrorKind::Unknown.headline().to_string()
    } else {
        text.clone()
    };
    CategorizedError::new(ErrorKind::Unknown, message, text)
}

fn is_abort(raw: &RawFailure) -> bool {
    match raw {
        RawFailure::Aborted { .. } => true,
        RawFailure::Exception {
            name: Some(name), ..
        } => ABORT_NAMES.contains(&name.to_ascii_lowercase().as_str()),
        _ => false,
    }
}

fn contains_any(haystack: &str, patterns: &[&str]) -> bool {
    patterns.iter().any(|pattern| haystack.contains(pattern))
}

/// Finds `HTTP <ddd>` (case-insensitive) with exactly three digits.
fn embedded_http_status(text: &str) -> Option<u16> {
    let bytes = text.as_bytes();
    let mut start = 0;
    while start + 4 <= bytes.len() {
        let window = &bytes[start..start + 4];
        if window.eq_ignore_ascii_case(b"http") {
            let mut cursor = start + 4;
            while cursor < bytes.len() && bytes[cursor] == b' ' {
                cursor += 1;
            }
            let digits = bytes[cursor..]
                .iter()
                .take_while(|b| b.is_ascii_digit())
                .count();
            if cursor > start + 4 && digits == 3 {
                let code = std::str::from_utf8(&bytes[cursor..cursor + 3]).ok()?;
                return code.parse().ok();
            }
        }
        start += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_status_requires_three_digits() {
        assert_eq!(embedded_http_status("HTTP 500: boom"), Some(500));
        assert_eq!(embedded_http_status("got http  404"), Some(404));
        assert_eq!(embedded_http_status("HTTP 5000"), None);
        assert_eq!(embedded_http_status("HTTP/1.1 502"), None);
        assert_eq!(embedded_http_status("https://example.com"), None);
    }

    #[test]
    fn abort_names_are_case_insensitive() {
        let raw = RawFailure::Exception {
            name: Some("AbortError".into()),
            message: "The operation was aborted".into(),
        };
        assert!(is_abort(&raw));
    }
}
