//! Failed-password lockout through the access service.

mod helpers;

use std::time::Duration;

use aegis_core::ErrorKind;
use aegis_core::config::LimiterConfig;

use helpers::{PASSWORD, TestApp, WRONG_PASSWORD, attempt, relaxed_throttle};

async fn fail_times(app: &TestApp, token: &str, times: usize) {
    for _ in 0..times {
        let err = app
            .access
            .access_shared_file(token, WRONG_PASSWORD, None, &attempt())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authentication);
    }
}

#[tokio::test]
async fn test_sixth_attempt_is_locked_out_even_with_correct_password() {
    let app = TestApp::new().await;
    let share = app.create_share(5).await;

    fail_times(&app, &share.token, 5).await;

    let err = app
        .access
        .access_shared_file(&share.token, PASSWORD, None, &attempt())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::RateLimit);
    assert_eq!(err.message, "Too many attempts, try again later");
}

#[tokio::test(start_paused = true)]
async fn test_lockout_lifts_after_cooldown() {
    let app = TestApp::with_limiter(LimiterConfig {
        max_failed_attempts: 3,
        window_seconds: 600,
        lockout_seconds: 60,
        ..Default::default()
    })
    .await;
    let share = app.create_share(5).await;

    fail_times(&app, &share.token, 3).await;
    let err = app
        .access
        .access_shared_file(&share.token, WRONG_PASSWORD, None, &attempt())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::RateLimit);

    tokio::time::advance(Duration::from_secs(61)).await;
    let grant = app
        .access
        .access_shared_file(&share.token, PASSWORD, None, &attempt())
        .await
        .unwrap();
    assert_eq!(grant.download_count, 1);
}

#[tokio::test]
async fn test_success_resets_the_counter() {
    let app = TestApp::new().await;
    let share = app.create_share(-1).await;

    fail_times(&app, &share.token, 4).await;
    app.access
        .access_shared_file(&share.token, PASSWORD, None, &attempt())
        .await
        .unwrap();
    fail_times(&app, &share.token, 4).await;

    app.access
        .access_shared_file(&share.token, PASSWORD, None, &attempt())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_lockout_is_per_token() {
    let app = TestApp::new().await;
    let locked = app.create_share(5).await;
    let other = app.create_share(5).await;

    fail_times(&app, &locked.token, 5).await;
    let err = app
        .access
        .access_shared_file(&locked.token, PASSWORD, None, &attempt())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::RateLimit);

    app.access
        .access_shared_file(&other.token, PASSWORD, None, &attempt())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_locked_out_attempts_are_audited() {
    let app = TestApp::new().await;
    let share = app.create_share(5).await;
    fail_times(&app, &share.token, 5).await;
    let _ = app
        .access
        .access_shared_file(&share.token, PASSWORD, None, &attempt())
        .await;

    let recent = app
        .access
        .recent_access(app.owner.user_id, share.id, 1)
        .await
        .unwrap();
    assert_eq!(recent[0].failure_reason.as_deref(), Some("rate_limited"));
}

/// Fires `guesses` wrong passwords at one share at once and returns the
/// (authentication, rate limited) outcome counts.
async fn concurrent_wrong_guesses(app: &TestApp, guesses: usize) -> (usize, usize) {
    let share = app.create_share(5).await;
    let tasks: Vec<_> = (0..guesses)
        .map(|_| {
            let access = app.access.clone();
            let token = share.token.clone();
            tokio::spawn(async move {
                access
                    .access_shared_file(&token, WRONG_PASSWORD, None, &attempt())
                    .await
            })
        })
        .collect();

    let mut authentication = 0;
    let mut rate_limited = 0;
    for result in futures::future::join_all(tasks).await {
        let err = result.expect("task panicked").unwrap_err();
        match err.kind {
            ErrorKind::Authentication => authentication += 1,
            ErrorKind::RateLimit => rate_limited += 1,
            other => panic!("unexpected error kind {other}"),
        }
    }
    (authentication, rate_limited)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_guesses_cannot_exceed_threshold() {
    let app = TestApp::new().await;
    let (authentication, rate_limited) = concurrent_wrong_guesses(&app, 40).await;
    assert_eq!(authentication, 5);
    assert_eq!(rate_limited, 35);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_guesses_cannot_exceed_threshold_with_cache_backend() {
    let app = TestApp::build(
        LimiterConfig {
            backend: "cache".into(),
            ..Default::default()
        },
        relaxed_throttle(),
    )
    .await;
    let (authentication, rate_limited) = concurrent_wrong_guesses(&app, 40).await;
    assert_eq!(authentication, 5);
    assert_eq!(rate_limited, 35);
}

#[tokio::test]
async fn test_allow_list_denial_does_not_reset_failures() {
    let app = TestApp::new().await;
    let mut req = app.request(5);
    req.allowed_usernames = Some(vec!["alice".into()]);
    let share = app
        .share_service()
        .create_share(&app.owner, req)
        .await
        .unwrap();

    for _ in 0..4 {
        let err = app
            .access
            .access_shared_file(&share.token, WRONG_PASSWORD, Some("alice"), &attempt())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authentication);
    }
    let err = app
        .access
        .access_shared_file(&share.token, PASSWORD, Some("mallory"), &attempt())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authorization);

    let err = app
        .access
        .access_shared_file(&share.token, WRONG_PASSWORD, Some("alice"), &attempt())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authentication);
    let err = app
        .access
        .access_shared_file(&share.token, PASSWORD, Some("alice"), &attempt())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::RateLimit);
}
