use std::time::Duration;

use fleet_core::{classify, ErrorKind};
use fleet_engine::{Gateway, GatewayError, GatewayRequest, GatewaySettings, ReqwestGateway};
use reqwest::Method;
use tokio_util::sync::CancellationToken;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn request(url: &str) -> GatewayRequest {
    GatewayRequest::new(Method::GET, Url::parse(url).unwrap())
}

#[tokio::test]
async fn passes_non_success_responses_through() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("nope"))
        .mount(&server)
        .await;

    let gateway = ReqwestGateway::new(&GatewaySettings::default()).unwrap();
    let response = gateway
        .send(
            request(&format!("{}/missing", server.uri())),
            Duration::from_secs(5),
            &CancellationToken::new(),
        )
        .await
        .expect("response");

    assert!(!response.ok());
    assert_eq!(response.status, 404);
    assert_eq!(response.status_text, "Not Found");
    assert_eq!(&response.body[..], b"nope");
}

#[tokio::test]
async fn deadline_cancels_slow_call() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(500))
                .set_body_string("[]"),
        )
        .mount(&server)
        .await;

    let gateway = ReqwestGateway::new(&GatewaySettings::default()).unwrap();
    let err = gateway
        .send(
            request(&format!("{}/slow", server.uri())),
            Duration::from_millis(50),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::Timeout { after } if after == Duration::from_millis(50)));
    assert_eq!(classify(&err.to_raw_failure()).kind, ErrorKind::Timeout);
}

#[tokio::test]
async fn cancelled_token_aborts_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let gateway = ReqwestGateway::new(&GatewaySettings::default()).unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = gateway
        .send(
            request(&format!("{}/any", server.uri())),
            Duration::from_secs(5),
            &cancel,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::Cancelled));
    assert_eq!(classify(&err.to_raw_failure()).kind, ErrorKind::Timeout);
}

#[tokio::test]
async fn closed_port_is_connection_refused() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let gateway = ReqwestGateway::new(&GatewaySettings::default()).unwrap();
    let err = gateway
        .send(
            request(&format!("http://127.0.0.1:{port}/api/tls-cluster/connectors")),
            Duration::from_secs(5),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    let categorized = classify(&err.to_raw_failure());
    assert_eq!(categorized.kind, ErrorKind::ConnectionRefused, "{err}");
    assert!(categorized.retryable);
}
