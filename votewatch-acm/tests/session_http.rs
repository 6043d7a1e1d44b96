mod helpers;

use std::time::Duration;

use helpers::*;
use httpmock::prelude::*;
use votewatch_acm::{AcmConnector, SessionState};
use votewatch_core::{AuthFailure, ErrorKind, SnapshotSource, VoteError};

async fn login_mocks(server: &MockServer) {
    server
        .mock_async(|when, then| {
            when.method(GET).path(LOGIN_PAGE);
            then.status(200)
                .header("Set-Cookie", "PHPSESSID=abc123; Path=/")
                .header("content-type", "text/html; charset=utf-8")
                .body(LOGIN_FORM);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path(LOGIN_ACTION)
                .body_includes("userpassword=s3cret")
                .body_includes("_token=csrf-abc");
            then.status(302).header("Location", HOME);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(HOME);
            then.status(200).body("<html>welcome</html>");
        })
        .await;
}

fn real_connector(server: &MockServer, timeout: Duration, with_creds: bool) -> AcmConnector {
    let config = session_config(&server.base_url()).with_request_timeout(timeout);
    AcmConnector::builder(config)
        .credentials(with_creds.then(creds))
        .build()
        .expect("connector")
}

#[tokio::test]
async fn logs_in_over_http_and_extracts_chart() {
    let server = MockServer::start_async().await;
    login_mocks(&server).await;
    let data = server
        .mock_async(|when, then| {
            when.method(GET).path(DATA).query_param("tpid", "4");
            then.status(200).body(CHART_PAGE);
        })
        .await;

    let mut c = real_connector(&server, Duration::from_secs(5), true);
    let snap = c.fetch_snapshot().await.expect("snapshot");

    assert_eq!(data.hits_async().await, 1);
    assert_eq!(snap.percentage("YND01"), Some(21.35));
    assert_eq!(snap.category.as_deref(), Some("The Best Couple"));
    assert_eq!(snap.candidates["YND06"].series, "Fourever You");
    assert_eq!(c.session().state(), SessionState::LoggedIn);
}

#[tokio::test]
async fn missing_credentials_send_nothing() {
    let server = MockServer::start_async().await;
    let any = server
        .mock_async(|_when, then| {
            then.status(200).body("unexpected");
        })
        .await;

    let mut c = real_connector(&server, Duration::from_secs(5), false);
    let err = c.fetch_snapshot().await.unwrap_err();

    assert_eq!(err, VoteError::auth(AuthFailure::MissingCredentials));
    assert_eq!(any.hits_async().await, 0);
}

#[tokio::test]
async fn persistent_redirect_to_login_is_retried_exactly_once() {
    let server = MockServer::start_async().await;
    login_mocks(&server).await;
    let data = server
        .mock_async(|when, then| {
            when.method(GET).path(DATA);
            then.status(302).header("Location", LOGIN_PAGE);
        })
        .await;

    let mut c = real_connector(&server, Duration::from_secs(5), true);
    let err = c.fetch_snapshot().await.unwrap_err();

    assert_eq!(err, VoteError::auth(AuthFailure::ExpiredAfterRelogin));
    assert_eq!(data.hits_async().await, 2);
    assert_eq!(c.session().state(), SessionState::SessionExpired);
}

#[tokio::test]
async fn slow_vendor_times_out_as_network_error() {
    let server = MockServer::start_async().await;
    login_mocks(&server).await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(DATA);
            then.status(200)
                .delay(Duration::from_secs(3))
                .body(CHART_PAGE);
        })
        .await;

    let mut c = real_connector(&server, Duration::from_millis(300), true);
    let err = c.fetch_snapshot().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Network);
    assert!(err.is_retryable());
    assert_eq!(c.session().state(), SessionState::LoggedIn);
}

#[tokio::test]
async fn unreachable_vendor_is_a_network_error() {
    // Nothing listens on the discard port.
    let config = session_config("http://127.0.0.1:9").with_request_timeout(Duration::from_secs(2));
    let mut c = AcmConnector::builder(config)
        .credentials(Some(creds()))
        .build()
        .unwrap();

    let err = c.fetch_snapshot().await.unwrap_err();
    assert!(matches!(err, VoteError::Network { .. }));
    assert_eq!(c.session().state(), SessionState::LoggedOut);
}

#[tokio::test]
async fn login_abandoned_by_a_cycle_timeout_is_restarted() {
    let server = MockServer::start_async().await;
    let mut slow = server
        .mock_async(|when, then| {
            when.method(GET).path(LOGIN_PAGE);
            then.status(200)
                .delay(Duration::from_secs(3))
                .body(LOGIN_FORM);
        })
        .await;

    let mut c = real_connector(&server, Duration::from_secs(10), true);
    let abandoned = tokio::time::timeout(Duration::from_millis(200), c.fetch_snapshot()).await;
    assert!(abandoned.is_err());
    assert_eq!(c.session().state(), SessionState::LoggingIn);

    slow.delete_async().await;
    login_mocks(&server).await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(DATA);
            then.status(200).body(CHART_PAGE);
        })
        .await;

    let snap = c.fetch_snapshot().await.expect("login restarted");
    assert_eq!(snap.percentage("YND06"), Some(40.1));
    assert_eq!(c.session().state(), SessionState::LoggedIn);
}
