mod common;

use reward_settlement::db::entity::{ referral, user };
use reward_settlement::services::{
    Postback,
    PostbackAck,
    PostbackParams,
    SettlementOutcome,
    WithdrawalRequest,
};
use reward_settlement::{ AppError, Identity, Network, ReferralStatus };
use sea_orm::{ ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter };

fn postback(user_id: i32, task_id: i32, payout: Option<&str>) -> Postback {
    Postback::parse(
        &(PostbackParams {
            user_id: Some(user_id.to_string()),
            task_id: Some(task_id.to_string()),
            transaction_id: None,
            payout: payout.map(str::to_string),
        })
    ).unwrap()
}

async fn referral_of(db: &sea_orm::DatabaseConnection, user_id: i32) -> referral::Model {
    referral::Entity
        ::find()
        .filter(referral::Column::ReferredUserId.eq(user_id))
        .one(db).await
        .unwrap()
        .expect("referral exists")
}

#[tokio::test]
async fn test_registration_without_code_creates_no_referral() {
    let (db, state) = common::setup().await;
    let alice = common::register(&state, "alice", "Nigeria", None).await;

    assert!(alice.referred_by.is_none());
    assert_eq!(referral::Entity::find().count(&db).await.unwrap(), 0);

    state.postback_service.handle(postback(alice.id, 5, Some("3.00"))).await.unwrap();
    assert_eq!(common::reload_user(&db, alice.id).await.balance_referral_cents, 0);
}

#[tokio::test]
async fn test_registration_with_code_creates_pending_referral() {
    let (db, state) = common::setup().await;
    let alice = common::register(&state, "alice", "Nigeria", None).await;
    let bob = common::register(&state, "bob", "Ghana", Some(alice.referral_code.as_str())).await;

    assert_eq!(bob.referred_by, Some(alice.id));

    let pending = referral_of(&db, bob.id).await;
    assert_eq!(pending.referrer_id, alice.id);
    assert_eq!(pending.country, "Ghana");
    assert_eq!(pending.status, ReferralStatus::Pending.as_str());
    assert_eq!(pending.reward_cents, 0);
    assert!(pending.settled_at.is_none());
}

#[tokio::test]
async fn test_unknown_referral_code_is_ignored() {
    let (db, state) = common::setup().await;
    let bob = common::register(&state, "bob", "Ghana", Some("NOSUCHCD")).await;

    assert!(bob.referred_by.is_none());
    assert_eq!(referral::Entity::find().count(&db).await.unwrap(), 0);
}

#[tokio::test]
async fn test_first_completion_settles_with_default_reward() {
    let (db, state) = common::setup().await;
    let alice = common::register(&state, "alice", "Nigeria", None).await;
    let bob = common::register(&state, "bob", "Ghana", Some(alice.referral_code.as_str())).await;

    let ack = state.postback_service.handle(postback(bob.id, 5, Some("3.00"))).await.unwrap();
    assert_eq!(ack, PostbackAck::Processed);

    assert_eq!(common::reload_user(&db, bob.id).await.balance_task_cents, 300);
    assert_eq!(common::reload_user(&db, alice.id).await.balance_referral_cents, 50);

    let settled = referral_of(&db, bob.id).await;
    assert_eq!(settled.status, ReferralStatus::Paid.as_str());
    assert_eq!(settled.reward_cents, 50);
    assert!(settled.settled_at.is_some());
}

#[tokio::test]
async fn test_duplicate_postback_does_not_settle_again() {
    let (db, state) = common::setup().await;
    let alice = common::register(&state, "alice", "Nigeria", None).await;
    let bob = common::register(&state, "bob", "Ghana", Some(alice.referral_code.as_str())).await;

    state.postback_service.handle(postback(bob.id, 5, Some("3.00"))).await.unwrap();
    let ack = state.postback_service.handle(postback(bob.id, 5, Some("3.00"))).await.unwrap();
    assert_eq!(ack, PostbackAck::AlreadyCompleted);

    // A second, different task is a fresh completion but not a fresh referral
    state.postback_service.handle(postback(bob.id, 6, Some("1.00"))).await.unwrap();

    assert_eq!(common::reload_user(&db, bob.id).await.balance_task_cents, 400);
    assert_eq!(common::reload_user(&db, alice.id).await.balance_referral_cents, 50);
}

#[tokio::test]
async fn test_country_setting_overrides_default() {
    let (db, state) = common::setup().await;
    state.referral_service.upsert_setting("Ghana", 125, None).await.unwrap();

    let alice = common::register(&state, "alice", "Nigeria", None).await;
    let bob = common::register(&state, "bob", "Ghana", Some(alice.referral_code.as_str())).await;

    state.postback_service.handle(postback(bob.id, 5, Some("3.00"))).await.unwrap();

    assert_eq!(common::reload_user(&db, alice.id).await.balance_referral_cents, 125);
    assert_eq!(referral_of(&db, bob.id).await.reward_cents, 125);
}

#[tokio::test]
async fn test_upsert_setting_replaces_existing() {
    let (_db, state) = common::setup().await;
    state.referral_service.upsert_setting("Ghana", 125, None).await.unwrap();
    let updated = state.referral_service.upsert_setting("Ghana", 200, Some(1000)).await.unwrap();

    assert_eq!(updated.reward_cents, 200);
    assert_eq!(updated.min_withdrawal_cents, 1000);
    assert_eq!(state.referral_service.list_settings().await.unwrap().len(), 1);

    let terms = state.referral_service.country_terms("Ghana").await.unwrap();
    assert_eq!(terms.referral_reward_cents, 200);
    assert_eq!(terms.min_withdrawal_cents, 1000);
}

#[tokio::test]
async fn test_settlement_is_gated_by_status() {
    let (db, state) = common::setup().await;
    let alice = common::register(&state, "alice", "Nigeria", None).await;
    let bob = common::register(&state, "bob", "Ghana", Some(alice.referral_code.as_str())).await;

    let first = state.referral_service.on_task_completed(bob.id).await.unwrap();
    assert!(matches!(first, SettlementOutcome::Settled { reward_cents: 50, .. }));

    let second = state.referral_service.on_task_completed(bob.id).await.unwrap();
    assert_eq!(second, SettlementOutcome::NoPendingReferral);
    assert_eq!(common::reload_user(&db, alice.id).await.balance_referral_cents, 50);
}

#[tokio::test]
async fn test_blocked_referral_is_never_paid() {
    let (db, state) = common::setup().await;
    let alice = common::register(&state, "alice", "Nigeria", None).await;
    let bob = common::register(&state, "bob", "Ghana", Some(alice.referral_code.as_str())).await;
    let pending = referral_of(&db, bob.id).await;

    let blocked = state.referral_service.block_referral(pending.id).await.unwrap();
    assert_eq!(blocked.status, ReferralStatus::Blocked.as_str());

    state.postback_service.handle(postback(bob.id, 5, Some("3.00"))).await.unwrap();
    assert_eq!(common::reload_user(&db, alice.id).await.balance_referral_cents, 0);

    let err = state.referral_service.block_referral(pending.id).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn test_paid_referral_cannot_be_blocked() {
    let (db, state) = common::setup().await;
    let alice = common::register(&state, "alice", "Nigeria", None).await;
    let bob = common::register(&state, "bob", "Ghana", Some(alice.referral_code.as_str())).await;

    state.postback_service.handle(postback(bob.id, 5, None)).await.unwrap();

    let settled = referral_of(&db, bob.id).await;
    let err = state.referral_service.block_referral(settled.id).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    assert_eq!(referral_of(&db, bob.id).await.status, ReferralStatus::Paid.as_str());
}

#[tokio::test]
async fn test_stats() {
    let (_db, state) = common::setup().await;
    let alice = common::register(&state, "alice", "Nigeria", None).await;
    let bob = common::register(&state, "bob", "Ghana", Some(alice.referral_code.as_str())).await;
    common::register(&state, "carol", "Ghana", Some(alice.referral_code.as_str())).await;

    state.postback_service.handle(postback(bob.id, 5, Some("3.00"))).await.unwrap();

    let stats = state.referral_service.stats(alice.id).await.unwrap();
    assert_eq!(stats.total_referrals, 2);
    assert_eq!(stats.paid_referrals, 1);
    assert_eq!(stats.pending_referrals, 1);
    assert_eq!(stats.total_earnings_cents, 50);
}

#[tokio::test]
async fn test_payout_falls_back_to_task_reward() {
    let (db, state) = common::setup().await;
    let task = common::create_task(&state, "Ghana", 75).await;
    let bob = common::register(&state, "bob", "Ghana", None).await;

    state.postback_service.handle(postback(bob.id, task.id, None)).await.unwrap();
    assert_eq!(common::reload_user(&db, bob.id).await.balance_task_cents, 75);

    // Unknown task and no payout: configured default
    state.postback_service.handle(postback(bob.id, task.id + 100, None)).await.unwrap();
    assert_eq!(common::reload_user(&db, bob.id).await.balance_task_cents, 125);
}

#[tokio::test]
async fn test_earnings_survive_referral_withdrawal() {
    let (db, state) = common::setup().await;
    state.referral_service.upsert_setting("Ghana", 2500, None).await.unwrap();
    let alice = common::register(&state, "alice", "Nigeria", None).await;
    let bob = common::register(&state, "bob", "Ghana", Some(alice.referral_code.as_str())).await;

    state.postback_service.handle(postback(bob.id, 5, Some("3.00"))).await.unwrap();
    assert_eq!(common::reload_user(&db, alice.id).await.balance_referral_cents, 2500);

    let identity = Identity::for_user(&alice).unwrap();
    let withdrawal = state.withdrawal_service
        .request_withdrawal(&identity, WithdrawalRequest {
            amount_cents: 2500,
            wallet_address: "TXYZabc123".to_string(),
            network: Network::Trc20,
        }).await
        .unwrap();
    assert_eq!(withdrawal.from_referral_cents, 2500);
    assert_eq!(common::reload_user(&db, alice.id).await.balance_referral_cents, 0);

    let stats = state.referral_service.stats(alice.id).await.unwrap();
    assert_eq!(stats.paid_referrals, 1);
    assert_eq!(stats.total_earnings_cents, 2500);
}

#[tokio::test]
async fn test_missing_referrer_still_marks_paid() {
    let (db, state) = common::setup().await;
    let alice = common::register(&state, "alice", "Nigeria", None).await;
    let bob = common::register(&state, "bob", "Ghana", Some(alice.referral_code.as_str())).await;

    user::Entity::delete_by_id(alice.id).exec(&db).await.unwrap();

    let outcome = state.referral_service.on_task_completed(bob.id).await.unwrap();
    assert!(
        matches!(outcome, SettlementOutcome::Settled { referrer_id, reward_cents: 50, .. } if referrer_id == alice.id)
    );

    let settled = referral_of(&db, bob.id).await;
    assert_eq!(settled.status, ReferralStatus::Paid.as_str());
    assert_eq!(settled.reward_cents, 50);
    assert!(user::Entity::find_by_id(alice.id).one(&db).await.unwrap().is_none());
}

#[tokio::test]
async fn test_stale_pending_read_settles_once() {
    let (db, state) = common::setup().await;
    let alice = common::register(&state, "alice", "Nigeria", None).await;
    let bob = common::register(&state, "bob", "Ghana", Some(alice.referral_code.as_str())).await;

    // Both workers saw the referral while it was still pending
    let pending = referral_of(&db, bob.id).await;

    let first = state.referral_service.settle(&pending).await.unwrap();
    assert!(matches!(first, SettlementOutcome::Settled { reward_cents: 50, .. }));

    let second = state.referral_service.settle(&pending).await.unwrap();
    assert_eq!(second, SettlementOutcome::AlreadySettled);

    assert_eq!(common::reload_user(&db, alice.id).await.balance_referral_cents, 50);
}

// The test pool has one connection, so the transactions run one after
// another; this covers the status guard, not overlapping transactions.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_settlements_credit_once() {
    let (db, state) = common::setup().await;
    let alice = common::register(&state, "alice", "Nigeria", None).await;
    let bob = common::register(&state, "bob", "Ghana", Some(alice.referral_code.as_str())).await;

    let handles: Vec<_> = (0..6)
        .map(|_| {
            let referrals = state.referral_service.clone();
            let user_id = bob.id;
            tokio::spawn(async move { referrals.on_task_completed(user_id).await })
        })
        .collect();

    let mut settled = 0;
    for handle in handles {
        match handle.await.unwrap().unwrap() {
            SettlementOutcome::Settled { .. } => settled += 1,
            SettlementOutcome::AlreadySettled | SettlementOutcome::NoPendingReferral => {}
        }
    }

    assert_eq!(settled, 1);
    assert_eq!(common::reload_user(&db, alice.id).await.balance_referral_cents, 50);
    assert_eq!(referral_of(&db, bob.id).await.status, ReferralStatus::Paid.as_str());
}
