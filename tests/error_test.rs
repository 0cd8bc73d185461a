//! Tests for error display, classification and status mapping.

use gridscrape::{DialogKind, ScrapeError, ScrapeStatus};

#[test]
fn display_messages() {
    assert_eq!(
        ScrapeError::Http { status: 503 }.to_string(),
        "bad HTTP status code 503"
    );
    assert_eq!(
        ScrapeError::parse("expected value at line 1", None).to_string(),
        "error decoding JSON data: expected value at line 1"
    );
    assert_eq!(
        ScrapeError::RateLimitExceeded { retries: 5 }.to_string(),
        "rate limit still in effect after 5 retries"
    );
    assert_eq!(
        ScrapeError::Download {
            url: "https://cdn/x.png".into(),
            message: "HTTP 404".into()
        }
        .to_string(),
        "asset download failed for https://cdn/x.png: HTTP 404"
    );
}

#[test]
fn only_rate_limits_are_transient() {
    assert!(ScrapeError::RateLimited { attempt: 0 }.is_transient());
    assert!(!ScrapeError::RateLimitExceeded { retries: 5 }.is_transient());
    assert!(!ScrapeError::Http { status: 500 }.is_transient());
    assert!(!ScrapeError::Transport("reset".into()).is_transient());
}

#[test]
fn http_status_is_literal() {
    assert_eq!(ScrapeError::Http { status: 401 }.http_status(), Some(401));
    assert_eq!(ScrapeError::RateLimited { attempt: 1 }.http_status(), Some(429));
    assert_eq!(ScrapeError::Transport("dns".into()).http_status(), None);
    assert_eq!(ScrapeError::parse("bad", None).http_status(), None);
}

#[test]
fn io_errors_convert() {
    let err: ScrapeError = std::io::Error::other("disk full").into();
    assert!(matches!(err, ScrapeError::Io(_)));
    assert!(err.to_string().contains("disk full"));
}

#[test]
fn status_from_error_picks_dialog() {
    let auth = ScrapeStatus::from_error(&ScrapeError::Http { status: 401 });
    assert!(!auth.ok);
    assert_eq!(auth.dialog, Some(DialogKind::Message));

    let offline = ScrapeStatus::from_error(&ScrapeError::Transport("timed out".into()));
    assert_eq!(offline.dialog, Some(DialogKind::Notify));
    assert!(offline.message.contains("timed out"));

    let server = ScrapeStatus::from_error(&ScrapeError::Http { status: 500 });
    assert_eq!(server.dialog, None);
    assert_eq!(server.message, "bad HTTP status code 500");
}
