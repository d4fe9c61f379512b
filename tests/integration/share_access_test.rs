//! Recipient-side access: validation order, quota, allow-list, audit.

mod helpers;

use chrono::{Duration, Utc};
use futures::future::join_all;

use aegis_core::ErrorKind;
use aegis_core::config::{LimiterConfig, ThrottleConfig};
use aegis_database::store::ShareStore;
use aegis_service::UpdateShareRequest;

use helpers::{PASSWORD, TestApp, WRONG_PASSWORD, attempt, attempt_from};

#[tokio::test]
async fn test_two_downloads_then_quota_exceeded() {
    let app = TestApp::new().await;
    let share = app.create_share(2).await;
    assert_eq!(share.download_count, 0);

    let first = app
        .access
        .access_shared_file(&share.token, PASSWORD, None, &attempt())
        .await
        .unwrap();
    assert_eq!(first.file_key.as_bytes(), app.file_key.as_bytes());
    assert_eq!(first.download_count, 1);
    assert_eq!(first.remaining_downloads, 1);

    let second = app
        .access
        .access_shared_file(&share.token, PASSWORD, None, &attempt())
        .await
        .unwrap();
    assert_eq!(second.file_key.as_bytes(), app.file_key.as_bytes());
    assert_eq!(second.download_count, 2);
    assert_eq!(second.remaining_downloads, 0);

    let err = app
        .access
        .access_shared_file(&share.token, PASSWORD, None, &attempt())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::QuotaExceeded);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_access_never_exceeds_quota() {
    const ATTEMPTS: usize = 10;
    const MAX_DOWNLOADS: i32 = 3;

    // In-flight attempts hold limiter slots, so leave room for all of them.
    let app = TestApp::with_limiter(LimiterConfig {
        max_failed_attempts: ATTEMPTS as u32,
        ..Default::default()
    })
    .await;
    let share = app.create_share(MAX_DOWNLOADS).await;

    let tasks = (0..ATTEMPTS).map(|_| {
        let access = app.access.clone();
        let token = share.token.clone();
        tokio::spawn(async move {
            access
                .access_shared_file(&token, PASSWORD, None, &attempt())
                .await
        })
    });
    let results: Vec<_> = join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.expect("task panicked"))
        .collect();

    let granted = results.iter().filter(|r| r.is_ok()).count();
    let refused = results
        .iter()
        .filter(|r| matches!(r, Err(e) if e.kind == ErrorKind::QuotaExceeded))
        .count();
    assert_eq!(granted, MAX_DOWNLOADS as usize);
    assert_eq!(refused, ATTEMPTS - MAX_DOWNLOADS as usize);

    let stored = app
        .shares
        .inner
        .find_by_token(&share.token)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.download_count, MAX_DOWNLOADS);
}

#[tokio::test]
async fn test_unlimited_share_keeps_counting() {
    let app = TestApp::new().await;
    let share = app.create_share(-1).await;
    for expected in 1..=4 {
        let grant = app
            .access
            .access_shared_file(&share.token, PASSWORD, None, &attempt())
            .await
            .unwrap();
        assert_eq!(grant.download_count, expected);
        assert_eq!(grant.remaining_downloads, -1);
    }
}

#[tokio::test]
async fn test_malformed_tokens_never_reach_the_store() {
    let app = TestApp::new().await;
    let valid = "ab".repeat(32);
    let malformed = [
        valid[..63].to_string(),
        format!("{valid}a"),
        valid.to_uppercase(),
        format!("{}g", &valid[..63]),
        format!("{}-", &valid[..63]),
    ];

    let err = app.access.validate_share_token("").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    for token in &malformed {
        let err = app.access.validate_share_token(token).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation, "token {token:?}");
        let err = app
            .access
            .access_shared_file(token, PASSWORD, None, &attempt())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }
    assert_eq!(app.shares.lookups(), 0);

    let err = app.access.validate_share_token(&valid).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
    assert_eq!(app.shares.lookups(), 1);
}

#[tokio::test]
async fn test_expiry_boundary() {
    let app = TestApp::new().await;
    let share = app.create_share(5).await;

    let mut past = share.clone();
    past.expires_at = Some(Utc::now() - Duration::seconds(1));
    app.shares.inner.insert_record(past);
    let err = app
        .access
        .validate_share_token(&share.token)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Expired);

    let mut future = share.clone();
    future.expires_at = Some(Utc::now() + Duration::seconds(1));
    app.shares.inner.insert_record(future);
    assert!(app.access.validate_share_token(&share.token).await.is_ok());
}

#[tokio::test]
async fn test_expired_share_fails_before_password_check() {
    let app = TestApp::new().await;
    let mut share = app.create_share(5).await;
    share.expires_at = Some(Utc::now() - Duration::minutes(5));
    app.shares.inner.insert_record(share.clone());

    let err = app
        .access
        .access_shared_file(&share.token, WRONG_PASSWORD, None, &attempt())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Expired);
}

#[tokio::test]
async fn test_empty_and_absent_allow_lists_are_public() {
    let app = TestApp::new().await;
    let service = app.share_service();

    let mut with_empty = app.request(-1);
    with_empty.allowed_usernames = Some(vec![]);
    let empty = service.create_share(&app.owner, with_empty).await.unwrap();
    let absent = app.create_share(-1).await;

    assert_eq!(empty.allowed_usernames, None);
    for share in [&empty, &absent] {
        for requester in [None, Some("anyone")] {
            app.access
                .access_shared_file(&share.token, PASSWORD, requester, &attempt())
                .await
                .unwrap();
        }
    }
}

#[tokio::test]
async fn test_allow_list_denies_before_password() {
    let app = TestApp::new().await;
    let mut request = app.request(-1);
    request.allowed_usernames = Some(vec![" alice ".into(), "bob".into()]);
    let share = app
        .share_service()
        .create_share(&app.owner, request)
        .await
        .unwrap();
    assert_eq!(
        share.allowed_usernames,
        Some(vec!["alice".to_string(), "bob".to_string()])
    );

    for requester in [None, Some("carol")] {
        let err = app
            .access
            .access_shared_file(&share.token, PASSWORD, requester, &attempt())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authorization);
    }

    let grant = app
        .access
        .access_shared_file(&share.token, PASSWORD, Some("alice"), &attempt())
        .await
        .unwrap();
    assert_eq!(grant.download_count, 1);
}

#[tokio::test]
async fn test_wrong_password_is_generic() {
    let app = TestApp::new().await;
    let share = app.create_share(3).await;

    let err = app
        .access
        .access_shared_file(&share.token, WRONG_PASSWORD, None, &attempt())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authentication);
    assert_eq!(err.message, "Invalid password");

    let stored = app
        .shares
        .inner
        .find_by_token(&share.token)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.download_count, 0);
}

#[tokio::test]
async fn test_metadata_exposes_no_secrets() {
    let app = TestApp::new().await;
    let share = app.create_share(4).await;

    let meta = app
        .access
        .get_share_metadata(&share.token, &attempt())
        .await
        .unwrap();
    assert_eq!(meta.filename, "quarterly.pdf");
    assert_eq!(meta.mime_type, "application/pdf");
    assert_eq!(meta.size_bytes, 48_213);
    assert_eq!(meta.max_downloads, 4);
    assert_eq!(meta.remaining_downloads, 4);
    assert!(!meta.restricted);

    let json = serde_json::to_string(&meta).unwrap();
    assert!(!json.contains(&share.token));
    assert!(!json.contains("salt"));
}

#[tokio::test]
async fn test_revoked_share_looks_missing() {
    let app = TestApp::new().await;
    let share = app.create_share(3).await;
    assert!(
        app.share_service()
            .revoke_share(&app.owner, share.id)
            .await
            .unwrap()
    );

    let err = app
        .access
        .access_shared_file(&share.token, PASSWORD, None, &attempt())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_access_attempts_are_audited() {
    let app = TestApp::new().await;
    let share = app.create_share(3).await;

    let _ = app
        .access
        .access_shared_file(&share.token, WRONG_PASSWORD, Some("eve"), &attempt())
        .await;
    app.access
        .access_shared_file(&share.token, PASSWORD, None, &attempt())
        .await
        .unwrap();

    let stats = app
        .access
        .access_stats(app.owner.user_id, share.id)
        .await
        .unwrap();
    assert_eq!(stats.total_attempts, 2);
    assert_eq!(stats.successful_attempts, 1);
    assert_eq!(stats.failed_attempts, 1);
    assert_eq!(stats.recent_attempts, 2);
    assert_eq!(stats.unique_ips, 1);

    let recent = app
        .access
        .recent_access(app.owner.user_id, share.id, 10)
        .await
        .unwrap();
    assert_eq!(recent.len(), 2);
    assert!(recent[0].success);
    assert_eq!(recent[1].failure_reason.as_deref(), Some("invalid_password"));
    assert_eq!(recent[1].requester.as_deref(), Some("eve"));

    let err = app
        .access
        .access_stats(app.stranger().user_id, share.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    let removed = app
        .access
        .purge_access_logs(Utc::now() + Duration::seconds(1))
        .await
        .unwrap();
    assert_eq!(removed, 2);
}

#[tokio::test]
async fn test_raised_quota_reopens_exhausted_share() {
    let app = TestApp::new().await;
    let share = app.create_share(1).await;
    app.access
        .access_shared_file(&share.token, PASSWORD, None, &attempt())
        .await
        .unwrap();
    assert_eq!(
        app.access
            .validate_share_token(&share.token)
            .await
            .unwrap_err()
            .kind,
        ErrorKind::QuotaExceeded
    );

    app.share_service()
        .update_share(
            &app.owner,
            share.id,
            UpdateShareRequest {
                max_downloads: Some(2),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let grant = app
        .access
        .access_shared_file(&share.token, PASSWORD, None, &attempt())
        .await
        .unwrap();
    assert_eq!(grant.download_count, 2);
}

#[tokio::test(start_paused = true)]
async fn test_requests_are_throttled_per_client_before_lookup() {
    let app = TestApp::with_throttle(ThrottleConfig::default()).await;
    let share = app.create_share(-1).await;
    let client = attempt_from("198.51.100.23");

    for _ in 0..10 {
        app.access
            .get_share_metadata(&share.token, &client)
            .await
            .unwrap();
    }
    let err = app
        .access
        .get_share_metadata(&share.token, &client)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::RateLimit);
    let err = app
        .access
        .access_shared_file(&share.token, PASSWORD, None, &client)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::RateLimit);
    assert_eq!(app.shares.lookups(), 10);

    app.access
        .access_shared_file(&share.token, PASSWORD, None, &attempt_from("198.51.100.24"))
        .await
        .unwrap();

    tokio::time::advance(std::time::Duration::from_secs(61)).await;
    app.access
        .get_share_metadata(&share.token, &client)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_throttle_counts_unknown_tokens() {
    let app = TestApp::with_throttle(ThrottleConfig {
        max_requests: 3,
        window_seconds: 60,
    })
    .await;
    let missing = "cd".repeat(32);

    for _ in 0..3 {
        let err = app
            .access
            .access_shared_file(&missing, PASSWORD, None, &attempt())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }
    let err = app
        .access
        .access_shared_file(&missing, PASSWORD, None, &attempt())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::RateLimit);
    assert_eq!(app.shares.lookups(), 3);
}
