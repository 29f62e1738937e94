use bytes::Bytes;
use std::time::Duration;
use threadcount_http::{Auth, HttpClient, HttpError, RequestOpts};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn flaky_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/value"))
        .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/value"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn default_budget_fails_on_first_server_error() {
    let server = flaky_server().await;
    let client = HttpClient::new(&server.uri()).unwrap();

    let err = client
        .get_bytes("value", RequestOpts::default())
        .await
        .unwrap_err();
    match err {
        HttpError::Api {
            status, message, ..
        } => {
            assert_eq!(status.as_u16(), 503);
            assert_eq!(message, "busy");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn retry_budget_recovers_from_server_error() {
    let server = flaky_server().await;
    let client = HttpClient::new(&server.uri()).unwrap().with_retries(1);

    let body = client
        .get_bytes("value", RequestOpts::default())
        .await
        .unwrap();
    assert_eq!(body, Bytes::from_static(b"ok"));
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let client = HttpClient::new(&server.uri()).unwrap().with_retries(3);

    let err = client
        .get_bytes("missing", RequestOpts::default())
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn bearer_token_is_sanitized_before_sending() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("authorization", "Bearer abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .expect(1)
        .mount(&server)
        .await;
    let client = HttpClient::new(&server.uri())
        .unwrap()
        .with_timeout(Duration::from_secs(5));

    let _: serde_json::Value = client
        .get_json(
            "me",
            RequestOpts {
                auth: Some(Auth::Bearer("\"abc123\"\n")),
                ..Default::default()
            },
        )
        .await
        .unwrap();
}
