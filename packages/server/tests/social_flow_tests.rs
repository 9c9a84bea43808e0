//! Integration tests for the social graph, messaging and OTP sign-in.

mod common;

use crate::common::{create_test_user, TestHarness};
use axum::http::StatusCode;
use server_core::domains::auth::actions::{send_otp, verify_otp, VerifyOtpOutcome};
use server_core::domains::auth::models::{hash_identifier, OtpCode};
use server_core::domains::messaging::models::{conversation_key, Message};
use server_core::domains::notifications::models::Notification;
use server_core::domains::users::actions::{block_user, toggle_follow};
use server_core::domains::users::models::{Follow, User};
use test_context::test_context;

#[test_context(TestHarness)]
#[tokio::test]
async fn follow_toggle_and_notification(ctx: &TestHarness) {
    let alice = create_test_user(&ctx.db_pool, "follow_alice").await.unwrap();
    let bob = create_test_user(&ctx.db_pool, "follow_bob").await.unwrap();

    let toggle = toggle_follow(alice.id, bob.id, &ctx.deps).await.unwrap();
    assert!(toggle.is_following);
    assert_eq!(toggle.follower_count, 1);
    assert!(Follow::exists(alice.id, bob.id, &ctx.db_pool).await.unwrap());

    // Following notified the followee
    let notifications = Notification::list_for(bob.id, &ctx.db_pool).await.unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].kind, "follow");

    // Toggling again unfollows, silently
    let toggle = toggle_follow(alice.id, bob.id, &ctx.deps).await.unwrap();
    assert!(!toggle.is_following);
    assert_eq!(toggle.follower_count, 0);
    let notifications = Notification::list_for(bob.id, &ctx.db_pool).await.unwrap();
    assert_eq!(notifications.len(), 1);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn self_follow_rejected(ctx: &TestHarness) {
    let alice = create_test_user(&ctx.db_pool, "self_alice").await.unwrap();
    let err = toggle_follow(alice.id, alice.id, &ctx.deps).await.unwrap_err();
    assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn blocking_severs_follows_both_ways(ctx: &TestHarness) {
    let alice = create_test_user(&ctx.db_pool, "block_alice").await.unwrap();
    let bob = create_test_user(&ctx.db_pool, "block_bob").await.unwrap();

    toggle_follow(alice.id, bob.id, &ctx.deps).await.unwrap();
    toggle_follow(bob.id, alice.id, &ctx.deps).await.unwrap();

    block_user(alice.id, bob.id, &ctx.deps).await.unwrap();

    assert!(!Follow::exists(alice.id, bob.id, &ctx.db_pool).await.unwrap());
    assert!(!Follow::exists(bob.id, alice.id, &ctx.db_pool).await.unwrap());

    // Blocked pairs cannot follow each other
    let err = toggle_follow(bob.id, alice.id, &ctx.deps).await.unwrap_err();
    assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn conversations_collapse_by_pair(ctx: &TestHarness) {
    let alice = create_test_user(&ctx.db_pool, "msg_alice").await.unwrap();
    let bob = create_test_user(&ctx.db_pool, "msg_bob").await.unwrap();

    Message::send(alice.id, bob.id, "Is the monstera still available?", &ctx.db_pool)
        .await
        .unwrap();
    Message::send(bob.id, alice.id, "It is!", &ctx.db_pool)
        .await
        .unwrap();

    // Both directions land in the same thread
    let key = conversation_key(alice.id, bob.id);
    let thread = Message::find_by_conversation(&key, &ctx.db_pool).await.unwrap();
    assert_eq!(thread.len(), 2);

    // One conversation each, not two
    let alice_convs = Message::latest_per_conversation(alice.id, &ctx.db_pool)
        .await
        .unwrap();
    assert_eq!(alice_convs.len(), 1);
    assert_eq!(alice_convs[0].body, "It is!");

    // Unread counting and mark-read
    assert_eq!(Message::unread_total(alice.id, &ctx.db_pool).await.unwrap(), 1);
    Message::mark_conversation_read(&key, alice.id, &ctx.db_pool)
        .await
        .unwrap();
    assert_eq!(Message::unread_total(alice.id, &ctx.db_pool).await.unwrap(), 0);
    // Bob's unread copy is untouched
    assert_eq!(Message::unread_total(bob.id, &ctx.db_pool).await.unwrap(), 1);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn otp_sign_in_creates_account_once(ctx: &TestHarness) {
    let identifier = "sprout@example.com".to_string();

    send_otp(identifier.clone(), &ctx.deps).await.unwrap();

    // The sender is a stub; plant the code we want to verify with
    let hash = hash_identifier(&identifier);
    OtpCode::upsert(&hash, "123456", &ctx.db_pool).await.unwrap();

    // Unknown identifier without a username: registration incomplete
    let outcome = verify_otp(
        identifier.clone(),
        "123456".to_string(),
        None,
        None,
        &ctx.deps,
    )
    .await
    .unwrap();
    assert!(matches!(outcome, VerifyOtpOutcome::UsernameRequired));

    // Codes are single-use, so plant a fresh one and register properly
    OtpCode::upsert(&hash, "654321", &ctx.db_pool).await.unwrap();
    let outcome = verify_otp(
        identifier.clone(),
        "654321".to_string(),
        Some("sprout".to_string()),
        Some("Sprout".to_string()),
        &ctx.deps,
    )
    .await
    .unwrap();

    let VerifyOtpOutcome::Verified { token, user } = outcome else {
        panic!("expected verified outcome");
    };
    assert!(!token.is_empty());
    assert_eq!(user.username, "sprout");

    // Signing in again reuses the account
    OtpCode::upsert(&hash, "111111", &ctx.db_pool).await.unwrap();
    let outcome = verify_otp(identifier, "111111".to_string(), None, None, &ctx.deps)
        .await
        .unwrap();
    let VerifyOtpOutcome::Verified { user: again, .. } = outcome else {
        panic!("expected verified outcome");
    };
    assert_eq!(again.id, user.id);

    // Wrong code fails
    let outcome = verify_otp(
        "sprout@example.com".to_string(),
        "000000".to_string(),
        None,
        None,
        &ctx.deps,
    )
    .await
    .unwrap();
    assert!(matches!(outcome, VerifyOtpOutcome::InvalidCode));
}

#[test_context(TestHarness)]
#[tokio::test]
async fn username_uniqueness_enforced(ctx: &TestHarness) {
    create_test_user(&ctx.db_pool, "unique_taken").await.unwrap();
    assert!(User::username_taken("unique_taken", None, &ctx.db_pool)
        .await
        .unwrap());
    assert!(!User::username_taken("unique_free", None, &ctx.db_pool)
        .await
        .unwrap());
}
