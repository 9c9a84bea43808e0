//! Integration tests for the adoption workflow.
//!
//! Drives the transition runner against a real Postgres instance and checks
//! the listing mutation, the history log, and the notification/message
//! side-effects.

mod common;

use crate::common::{create_adoptable_post, create_test_plant, create_test_user, TestHarness};
use axum::http::StatusCode;
use server_core::domains::adoption::machines::AdoptionAction;
use server_core::domains::adoption::models::AdoptionEvent;
use server_core::domains::adoption::{run_transition, AdoptionStatus, ListingKind};
use server_core::domains::messaging::models::{conversation_key, Message};
use server_core::domains::notifications::models::Notification;
use server_core::domains::posts::models::Post;
use server_core::domains::plants::models::Plant;
use test_context::test_context;

#[test_context(TestHarness)]
#[tokio::test]
async fn request_then_accept_flow(ctx: &TestHarness) {
    let owner = create_test_user(&ctx.db_pool, "accept_owner").await.unwrap();
    let adopter = create_test_user(&ctx.db_pool, "accept_adopter")
        .await
        .unwrap();
    let post = create_adoptable_post(&ctx.db_pool, owner.id, "Monstera")
        .await
        .unwrap();

    // Request: available -> pending
    let status = run_transition(&post, adopter.id, AdoptionAction::Request, &ctx.deps)
        .await
        .unwrap();
    assert_eq!(status, AdoptionStatus::Pending);

    let stored = Post::find_by_id(post.id, &ctx.db_pool).await.unwrap().unwrap();
    assert_eq!(stored.adoption_status, "pending");
    assert_eq!(stored.adoption_requested_by, Some(adopter.id));
    assert!(stored.adoption_requested_at.is_some());
    assert_eq!(stored.adoption_version, 1);

    // Owner was notified, and the requester opened a DM thread
    let owner_notifications = Notification::list_for(owner.id, &ctx.db_pool).await.unwrap();
    assert_eq!(owner_notifications.len(), 1);
    assert_eq!(owner_notifications[0].kind, "adoption_request");
    assert_eq!(owner_notifications[0].actor_id, adopter.id);

    let key = conversation_key(owner.id, adopter.id);
    let thread = Message::find_by_conversation(&key, &ctx.db_pool).await.unwrap();
    assert_eq!(thread.len(), 1);
    assert_eq!(thread[0].sender_id, adopter.id);
    assert!(thread[0].body.contains("Monstera"));

    // Accept: pending -> adopted (reload for the bumped version)
    let status = run_transition(&stored, owner.id, AdoptionAction::Accept, &ctx.deps)
        .await
        .unwrap();
    assert_eq!(status, AdoptionStatus::Adopted);

    let stored = Post::find_by_id(post.id, &ctx.db_pool).await.unwrap().unwrap();
    assert_eq!(stored.adoption_status, "adopted");
    assert_eq!(stored.adopted_by, Some(adopter.id));
    assert!(stored.adopted_at.is_some());
    assert_eq!(stored.adoption_requested_by, None);
    assert_eq!(stored.adoption_requested_at, None);

    // Adopter got the acceptance notification and the congratulations DM
    let adopter_notifications = Notification::list_for(adopter.id, &ctx.db_pool)
        .await
        .unwrap();
    assert_eq!(adopter_notifications.len(), 1);
    assert_eq!(adopter_notifications[0].kind, "adoption_accepted");

    let thread = Message::find_by_conversation(&key, &ctx.db_pool).await.unwrap();
    assert_eq!(thread.len(), 2);
    assert_eq!(thread[1].sender_id, owner.id);
    assert!(thread[1].body.contains("Congratulations"));

    // Both messages collapsed into the same conversation regardless of sender
    assert_eq!(thread[0].conversation_key, thread[1].conversation_key);

    // History: exactly one entry per applied transition
    let history = AdoptionEvent::find_for_listing(ListingKind::Post, post.id.into_uuid(), &ctx.db_pool)
        .await
        .unwrap();
    let actions: Vec<&str> = history.iter().map(|e| e.action.as_str()).collect();
    assert_eq!(actions, vec!["requested", "accepted"]);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn reject_blacklists_requester(ctx: &TestHarness) {
    let owner = create_test_user(&ctx.db_pool, "reject_owner").await.unwrap();
    let adopter = create_test_user(&ctx.db_pool, "reject_adopter")
        .await
        .unwrap();
    let post = create_adoptable_post(&ctx.db_pool, owner.id, "Pothos")
        .await
        .unwrap();

    run_transition(&post, adopter.id, AdoptionAction::Request, &ctx.deps)
        .await
        .unwrap();

    let stored = Post::find_by_id(post.id, &ctx.db_pool).await.unwrap().unwrap();
    let status = run_transition(&stored, owner.id, AdoptionAction::Reject, &ctx.deps)
        .await
        .unwrap();
    assert_eq!(status, AdoptionStatus::Available);

    let stored = Post::find_by_id(post.id, &ctx.db_pool).await.unwrap().unwrap();
    assert_eq!(stored.adoption_status, "available");
    assert_eq!(stored.rejected_adopters, vec![adopter.id]);
    assert_eq!(stored.adoption_requested_by, None);

    // The rejected user can never re-enter pending on this listing
    let err = run_transition(&stored, adopter.id, AdoptionAction::Request, &ctx.deps)
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), StatusCode::FORBIDDEN);

    // Rejection notified the requester and sent the consolation DM
    let notifications = Notification::list_for(adopter.id, &ctx.db_pool).await.unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].kind, "adoption_rejected");

    let key = conversation_key(owner.id, adopter.id);
    let thread = Message::find_by_conversation(&key, &ctx.db_pool).await.unwrap();
    assert_eq!(thread.len(), 2);
    assert!(thread[1].body.contains("Unfortunately"));
}

#[test_context(TestHarness)]
#[tokio::test]
async fn cancel_flow_notifies_without_message(ctx: &TestHarness) {
    let owner = create_test_user(&ctx.db_pool, "cancel_owner").await.unwrap();
    let adopter = create_test_user(&ctx.db_pool, "cancel_adopter")
        .await
        .unwrap();
    let post = create_adoptable_post(&ctx.db_pool, owner.id, "Ficus")
        .await
        .unwrap();

    run_transition(&post, adopter.id, AdoptionAction::Request, &ctx.deps)
        .await
        .unwrap();

    let stored = Post::find_by_id(post.id, &ctx.db_pool).await.unwrap().unwrap();
    let status = run_transition(&stored, adopter.id, AdoptionAction::Cancel, &ctx.deps)
        .await
        .unwrap();
    assert_eq!(status, AdoptionStatus::Available);

    let stored = Post::find_by_id(post.id, &ctx.db_pool).await.unwrap().unwrap();
    assert_eq!(stored.adoption_status, "available");
    assert_eq!(stored.adoption_requested_by, None);
    // Cancelling does not blacklist
    assert!(stored.rejected_adopters.is_empty());

    let owner_notifications = Notification::list_for(owner.id, &ctx.db_pool).await.unwrap();
    let kinds: Vec<&str> = owner_notifications.iter().map(|n| n.kind.as_str()).collect();
    assert!(kinds.contains(&"adoption_cancelled"));

    // Only the request DM exists; cancel sends none
    let key = conversation_key(owner.id, adopter.id);
    let thread = Message::find_by_conversation(&key, &ctx.db_pool).await.unwrap();
    assert_eq!(thread.len(), 1);

    // And the user can request again after cancelling (fresh window)
    let status = run_transition(&stored, adopter.id, AdoptionAction::Request, &ctx.deps)
        .await
        .unwrap();
    assert_eq!(status, AdoptionStatus::Pending);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn stale_snapshot_loses_the_race(ctx: &TestHarness) {
    let owner = create_test_user(&ctx.db_pool, "race_owner").await.unwrap();
    let first = create_test_user(&ctx.db_pool, "race_first").await.unwrap();
    let second = create_test_user(&ctx.db_pool, "race_second").await.unwrap();
    let post = create_adoptable_post(&ctx.db_pool, owner.id, "Calathea")
        .await
        .unwrap();

    // Both "requests" read the same available snapshot
    let snapshot_a = Post::find_by_id(post.id, &ctx.db_pool).await.unwrap().unwrap();
    let snapshot_b = Post::find_by_id(post.id, &ctx.db_pool).await.unwrap().unwrap();

    run_transition(&snapshot_a, first.id, AdoptionAction::Request, &ctx.deps)
        .await
        .unwrap();

    // The second writer's version predicate no longer matches: 409, and the
    // first requester's claim is NOT overwritten
    let err = run_transition(&snapshot_b, second.id, AdoptionAction::Request, &ctx.deps)
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), StatusCode::CONFLICT);

    let stored = Post::find_by_id(post.id, &ctx.db_pool).await.unwrap().unwrap();
    assert_eq!(stored.adoption_requested_by, Some(first.id));
    assert_eq!(stored.adoption_version, 1);

    let history =
        AdoptionEvent::find_for_listing(ListingKind::Post, post.id.into_uuid(), &ctx.db_pool)
            .await
            .unwrap();
    assert_eq!(history.len(), 1);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn idempotent_re_request_changes_nothing(ctx: &TestHarness) {
    let owner = create_test_user(&ctx.db_pool, "noop_owner").await.unwrap();
    let adopter = create_test_user(&ctx.db_pool, "noop_adopter").await.unwrap();
    let post = create_adoptable_post(&ctx.db_pool, owner.id, "Syngonium")
        .await
        .unwrap();

    run_transition(&post, adopter.id, AdoptionAction::Request, &ctx.deps)
        .await
        .unwrap();

    let stored = Post::find_by_id(post.id, &ctx.db_pool).await.unwrap().unwrap();
    let first_requested_at = stored.adoption_requested_at;

    // Asking again is tolerated and changes nothing
    let status = run_transition(&stored, adopter.id, AdoptionAction::Request, &ctx.deps)
        .await
        .unwrap();
    assert_eq!(status, AdoptionStatus::Pending);

    let after = Post::find_by_id(post.id, &ctx.db_pool).await.unwrap().unwrap();
    assert_eq!(after.adoption_version, 1);
    assert_eq!(after.adoption_requested_at, first_requested_at);

    let history =
        AdoptionEvent::find_for_listing(ListingKind::Post, post.id.into_uuid(), &ctx.db_pool)
            .await
            .unwrap();
    assert_eq!(history.len(), 1);

    let notifications = Notification::list_for(owner.id, &ctx.db_pool).await.unwrap();
    assert_eq!(notifications.len(), 1);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn plant_listings_share_the_engine(ctx: &TestHarness) {
    let owner = create_test_user(&ctx.db_pool, "plant_owner").await.unwrap();
    let adopter = create_test_user(&ctx.db_pool, "plant_adopter")
        .await
        .unwrap();
    let plant = create_test_plant(&ctx.db_pool, owner.id, "Spider plant")
        .await
        .unwrap();

    let status = run_transition(&plant, adopter.id, AdoptionAction::Request, &ctx.deps)
        .await
        .unwrap();
    assert_eq!(status, AdoptionStatus::Pending);

    let stored = Plant::find_by_id(plant.id, &ctx.db_pool).await.unwrap().unwrap();
    assert_eq!(stored.adoption_status, "pending");

    let status = run_transition(&stored, owner.id, AdoptionAction::Accept, &ctx.deps)
        .await
        .unwrap();
    assert_eq!(status, AdoptionStatus::Adopted);

    let stored = Plant::find_by_id(plant.id, &ctx.db_pool).await.unwrap().unwrap();
    assert_eq!(stored.adopted_by, Some(adopter.id));

    // History rows carry the plant listing kind
    let history =
        AdoptionEvent::find_for_listing(ListingKind::Plant, plant.id.into_uuid(), &ctx.db_pool)
            .await
            .unwrap();
    assert_eq!(history.len(), 2);
    assert!(history.iter().all(|e| e.listing_kind == "plant"));

    // DM thread exists with the plant's name in the request text
    let key = conversation_key(owner.id, adopter.id);
    let thread = Message::find_by_conversation(&key, &ctx.db_pool).await.unwrap();
    assert_eq!(thread.len(), 2);
    assert!(thread[0].body.contains("Spider plant"));
}

#[test_context(TestHarness)]
#[tokio::test]
async fn owner_cannot_request_own_listing(ctx: &TestHarness) {
    let owner = create_test_user(&ctx.db_pool, "self_owner").await.unwrap();
    let post = create_adoptable_post(&ctx.db_pool, owner.id, "Aloe")
        .await
        .unwrap();

    let err = run_transition(&post, owner.id, AdoptionAction::Request, &ctx.deps)
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

    let stored = Post::find_by_id(post.id, &ctx.db_pool).await.unwrap().unwrap();
    assert_eq!(stored.adoption_status, "available");
    assert_eq!(stored.adoption_version, 0);
}
