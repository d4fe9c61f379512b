//! Owner-side share lifecycle: create, update, revoke, list.

mod helpers;

use chrono::{Duration, Utc};

use aegis_core::ErrorKind;
use aegis_entity::share::{ShareFilter, ShareStatus};
use aegis_service::UpdateShareRequest;

use helpers::{BASE_URL, PASSWORD, TestApp, attempt};

#[tokio::test]
async fn test_create_share_issues_a_link() {
    let app = TestApp::new().await;
    let share = app.create_share(3).await;

    assert_eq!(share.token.len(), 64);
    assert_eq!(share.download_count, 0);
    assert_eq!(share.owner_id, app.owner.user_id);
    assert_eq!(share.wrapped_key.salt.len(), 16);
    assert_eq!(share.wrapped_key.iv.len(), 12);

    let link = app.links.generate_share_link(&share).unwrap();
    assert_eq!(link.url, format!("{BASE_URL}/v1/share/{}", share.token));
    assert_eq!(app.links.validate_share_url(&link.url).unwrap(), share.token);

    let other = app.create_share(3).await;
    assert_ne!(share.token, other.token);
    assert_ne!(share.wrapped_key, other.wrapped_key);
}

#[tokio::test]
async fn test_create_share_rejects_bad_input() {
    let app = TestApp::new().await;
    let service = app.share_service();

    let mut weak = app.request(3);
    weak.password = "password".into();
    let err = service.create_share(&app.owner, weak).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    let zero = app.request(0);
    let err = service.create_share(&app.owner, zero).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    let mut past = app.request(3);
    past.expires_at = Some(Utc::now() - Duration::hours(1));
    let err = service.create_share(&app.owner, past).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    assert!(app.shares.inner.is_empty());
}

#[tokio::test]
async fn test_only_the_owner_can_share() {
    let app = TestApp::new().await;
    let service = app.share_service();

    let err = service
        .create_share(&app.stranger(), app.request(3))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authorization);

    let mut unknown = app.request(3);
    unknown.file_id = aegis_core::types::FileId::new();
    let err = service.create_share(&app.owner, unknown).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_update_leaves_absent_fields_alone() {
    let app = TestApp::new().await;
    let service = app.share_service();
    let mut request = app.request(3);
    request.allowed_usernames = Some(vec!["alice".into()]);
    let expires_at = Utc::now() + Duration::days(2);
    request.expires_at = Some(expires_at);
    let share = service.create_share(&app.owner, request).await.unwrap();

    let updated = service
        .update_share(
            &app.owner,
            share.id,
            UpdateShareRequest {
                max_downloads: Some(10),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.max_downloads, 10);
    assert_eq!(updated.expires_at, Some(expires_at));
    assert_eq!(updated.allowed_usernames, Some(vec!["alice".to_string()]));
    assert_eq!(updated.wrapped_key, share.wrapped_key);

    let cleared = service
        .update_share(
            &app.owner,
            share.id,
            UpdateShareRequest {
                expires_at: Some(None),
                allowed_usernames: Some(vec![]),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(cleared.expires_at, None);
    assert_eq!(cleared.allowed_usernames, None);
    assert_eq!(cleared.max_downloads, 10);
}

#[tokio::test]
async fn test_new_password_rewraps_the_same_key() {
    let app = TestApp::new().await;
    let share = app.create_share(-1).await;
    let new_password = "An0ther!Secret99";

    let updated = app
        .share_service()
        .update_share(
            &app.owner,
            share.id,
            UpdateShareRequest {
                password: Some(new_password.into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_ne!(updated.wrapped_key.salt, share.wrapped_key.salt);
    assert_ne!(updated.wrapped_key.iv, share.wrapped_key.iv);

    let err = app
        .access
        .access_shared_file(&share.token, PASSWORD, None, &attempt())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authentication);

    let grant = app
        .access
        .access_shared_file(&share.token, new_password, None, &attempt())
        .await
        .unwrap();
    assert_eq!(grant.file_key.as_bytes(), app.file_key.as_bytes());
}

#[tokio::test]
async fn test_update_rules() {
    let app = TestApp::new().await;
    let service = app.share_service();
    let share = app.create_share(2).await;
    app.access
        .access_shared_file(&share.token, PASSWORD, None, &attempt())
        .await
        .unwrap();
    app.access
        .access_shared_file(&share.token, PASSWORD, None, &attempt())
        .await
        .unwrap();

    let below_count = UpdateShareRequest {
        max_downloads: Some(1),
        ..Default::default()
    };
    let err = service
        .update_share(&app.owner, share.id, below_count)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    let weak = UpdateShareRequest {
        password: Some("short".into()),
        ..Default::default()
    };
    let err = service
        .update_share(&app.owner, share.id, weak)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    let err = service
        .update_share(&app.stranger(), share.id, UpdateShareRequest::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_blank_allow_list_is_rejected_not_public() {
    let app = TestApp::new().await;
    let service = app.share_service();

    let mut blank = app.request(5);
    blank.allowed_usernames = Some(vec!["   ".into()]);
    let err = service.create_share(&app.owner, blank).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
    let listed = service
        .list_shares(&app.owner, &ShareFilter::All)
        .await
        .unwrap();
    assert!(listed.is_empty());

    let mut restricted = app.request(5);
    restricted.allowed_usernames = Some(vec!["alice".into()]);
    let share = service.create_share(&app.owner, restricted).await.unwrap();

    let err = service
        .update_share(
            &app.owner,
            share.id,
            UpdateShareRequest {
                allowed_usernames: Some(vec![" ".into(), "".into()]),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    let err = app
        .access
        .access_shared_file(&share.token, PASSWORD, Some("mallory"), &attempt())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authorization);
}

#[tokio::test]
async fn test_revoke_is_terminal() {
    let app = TestApp::new().await;
    let service = app.share_service();
    let share = app.create_share(3).await;

    assert!(service.revoke_share(&app.owner, share.id).await.unwrap());
    assert!(!service.revoke_share(&app.owner, share.id).await.unwrap());

    let err = service
        .update_share(
            &app.owner,
            share.id,
            UpdateShareRequest {
                max_downloads: Some(5),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    let err = service
        .revoke_share(&app.stranger(), share.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    let kept = service.get_share(&app.owner, share.id).await.unwrap();
    assert_eq!(kept.status(Utc::now()), ShareStatus::Revoked);
}

#[tokio::test]
async fn test_list_shares_by_filter() {
    let app = TestApp::new().await;
    let service = app.share_service();
    let active = app.create_share(3).await;
    let exhausted = app.create_share(1).await;
    let revoked = app.create_share(3).await;

    app.access
        .access_shared_file(&exhausted.token, PASSWORD, None, &attempt())
        .await
        .unwrap();
    service.revoke_share(&app.owner, revoked.id).await.unwrap();

    let ids = |filter: ShareFilter| {
        let service = service.clone();
        let owner = app.owner.clone();
        async move {
            service
                .list_shares(&owner, &filter)
                .await
                .unwrap()
                .into_iter()
                .map(|s| s.id)
                .collect::<Vec<_>>()
        }
    };

    assert_eq!(ids(ShareFilter::All).await.len(), 3);
    assert_eq!(ids(ShareFilter::Active).await, vec![active.id]);
    assert_eq!(ids(ShareFilter::Exhausted).await, vec![exhausted.id]);
    assert_eq!(ids(ShareFilter::Revoked).await, vec![revoked.id]);
    assert_eq!(ids(ShareFilter::ForFile(app.file.id)).await.len(), 3);

    let theirs = service
        .list_shares(&app.stranger(), &ShareFilter::All)
        .await
        .unwrap();
    assert!(theirs.is_empty());
}
