use fleet_core::{classify, ErrorKind, RawFailure};
use pretty_assertions::assert_eq;

#[test]
fn http_status_embedded_in_message() {
    let error = classify(&RawFailure::message("HTTP 500: Internal Server Error"));
    assert_eq!(error.kind, ErrorKind::HttpError { status: 500 });
    assert_eq!(error.http_status, Some(500));
    assert!(error.retryable);
    assert_eq!(error.message, "HTTP 500: Internal Server Error");
}

#[test]
fn unresolved_host_is_dns_failure() {
    let error = classify(&RawFailure::message("ENOTFOUND example.com"));
    assert_eq!(error.kind, ErrorKind::DnsFailure);
    assert!(!error.retryable);
    assert!(!error.troubleshooting.is_empty());
}

#[test]
fn abort_takes_precedence_over_message_patterns() {
    let error = classify(&RawFailure::Exception {
        name: Some("AbortError".to_string()),
        message: "connection refused while aborting".to_string(),
    });
    assert_eq!(error.kind, ErrorKind::Timeout);
    assert!(error.retryable);

    let error = classify(&RawFailure::Aborted {
        message: "deadline of 15s elapsed".to_string(),
    });
    assert_eq!(error.kind, ErrorKind::Timeout);
}

#[test]
fn refused_beats_embedded_status() {
    let error = classify(&RawFailure::message(
        "HTTP 503 after connect ECONNREFUSED 127.0.0.1:8083",
    ));
    assert_eq!(error.kind, ErrorKind::ConnectionRefused);
    assert!(error.retryable);
    assert_eq!(error.http_status, None);
}

#[test]
fn tls_failures_are_not_retryable() {
    let error = classify(&RawFailure::message(
        "invalid peer certificate: UnknownIssuer",
    ));
    assert_eq!(error.kind, ErrorKind::SslTlsError);
    assert!(!error.retryable);
}

#[test]
fn response_status_mapping() {
    let cases = [
        (400, false),
        (401, false),
        (403, false),
        (404, false),
        (409, false),
        (500, true),
        (502, true),
        (503, true),
    ];
    for (status, retryable) in cases {
        let error = classify(&RawFailure::Response {
            status,
            status_text: "status".to_string(),
        });
        assert_eq!(error.kind, ErrorKind::HttpError { status }, "status {status}");
        assert_eq!(error.retryable, retryable, "status {status}");
    }
}

#[test]
fn response_status_wins_over_text_patterns() {
    let error = classify(&RawFailure::Response {
        status: 400,
        status_text: "Invalid value for ssl.truststore.location".to_string(),
    });
    assert_eq!(error.kind, ErrorKind::HttpError { status: 400 });
    assert_eq!(error.http_status, Some(400));
    assert!(!error.retryable);
    assert_eq!(
        error.message,
        "HTTP 400: Invalid value for ssl.truststore.location"
    );

    let error = classify(&RawFailure::Response {
        status: 503,
        status_text: "Worker could not reach broker: connection refused".to_string(),
    });
    assert_eq!(error.kind, ErrorKind::HttpError { status: 503 });
    assert!(error.retryable);
}

#[test]
fn generic_network_failures() {
    let error = classify(&RawFailure::message("read ECONNRESET"));
    assert_eq!(error.kind, ErrorKind::NetworkError);
    assert!(error.retryable);
}

#[test]
fn non_exception_values_are_unknown() {
    let error = classify(&RawFailure::Other("something odd".to_string()));
    assert_eq!(error.kind, ErrorKind::Unknown);
    assert_eq!(error.message, "something odd");
    assert!(!error.retryable);

    let error = classify(&RawFailure::Other(String::new()));
    assert_eq!(error.kind, ErrorKind::Unknown);
    assert_eq!(error.message, "Unknown error");
}

#[test]
fn classification_is_deterministic() {
    let inputs = [
        RawFailure::message("HTTP 404: Not Found"),
        RawFailure::message("getaddrinfo ENOTFOUND api.internal"),
        RawFailure::Response {
            status: 409,
            status_text: "Conflict".to_string(),
        },
        RawFailure::Other("?".to_string()),
    ];
    for input in &inputs {
        assert_eq!(classify(input), classify(input));
    }
    assert!(!classify(&inputs[0]).retryable);
}
