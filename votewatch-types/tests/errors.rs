use votewatch_types::{AuthFailure, ErrorKind, VoteError};

#[test]
fn cycle_taxonomy() {
    assert_eq!(VoteError::auth(AuthFailure::Rejected).kind(), ErrorKind::Auth);
    assert_eq!(VoteError::network("timed out").kind(), ErrorKind::Network);
    assert_eq!(
        VoteError::HttpStatus {
            status: 502,
            url: "https://vendor.test/".into()
        }
        .kind(),
        ErrorKind::Network
    );
    assert_eq!(VoteError::CycleTimeout { timeout_ms: 10 }.kind(), ErrorKind::Network);
    assert_eq!(VoteError::parse("no chart").kind(), ErrorKind::Parse);
    assert_eq!(VoteError::store("disk full").kind(), ErrorKind::Store);
}

#[test]
fn retryability() {
    assert!(!VoteError::auth(AuthFailure::MissingCredentials).is_retryable());
    assert!(!VoteError::auth(AuthFailure::Rejected).is_retryable());
    assert!(VoteError::auth(AuthFailure::ExpiredAfterRelogin).is_retryable());
    assert!(VoteError::network("reset").is_retryable());
    assert!(!VoteError::parse("empty").is_retryable());
    let not_found = VoteError::HttpStatus {
        status: 404,
        url: "https://vendor.test/".into(),
    };
    assert!(!not_found.is_retryable());
}

#[test]
fn error_serde_roundtrip() {
    let e = VoteError::auth(AuthFailure::ExpiredAfterRelogin);
    let json = serde_json::to_string(&e).expect("serialize");
    let de: VoteError = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(de, e);
    assert_eq!(
        e.to_string(),
        "authentication failed: session expired again after re-login"
    );
}
