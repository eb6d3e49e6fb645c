//! Match lifecycle end to end: negotiation, the two timeout windows, and
//! idempotent auto-completion.

mod common;

use std::sync::Arc;

use chrono::{Duration, Utc};
use porter_engine::config::EngineConfig;
use porter_engine::lifecycle::{
    accept_suggested_price, reject_suggested_price, AutoCompleter, TimeoutCleaner,
};
use porter_engine::model::{
    Errand, MatchStatus, ObjectId, Resource, ResourceStatus, TransactionKind,
    ACCEPTANCE_WINDOW_EXPIRED, INITIAL_PENDING_EXPIRED,
};
use porter_engine::notify::{Notification, RecordingNotifier};
use porter_engine::store::Store;

use common::{data_str, pending_match, seed_user, seed_wallet, service_request};

fn cleaner(store: &Arc<Store>, notifier: &Arc<RecordingNotifier>) -> TimeoutCleaner {
    TimeoutCleaner::new(store.clone(), notifier.clone(), &EngineConfig::default())
}

#[tokio::test]
async fn acceptance_window_timeout_penalizes_the_silent_side() {
    // S3: requester accepted 25 hours ago, owner never replied.
    let store = Arc::new(Store::temporary().unwrap());
    let requester = ObjectId::new();
    let owner = ObjectId::new();
    seed_user(&store, owner, 10, 0);

    let mut m = pending_match(requester, owner, Utc::now() - Duration::hours(30));
    m.requester_accepted_suggested_price = true;
    m.first_acceptance_time = Some(Utc::now() - Duration::hours(25));
    store.put_match(&m).unwrap();

    let notifier = Arc::new(RecordingNotifier::new());
    let summary = cleaner(&store, &notifier).run().await.unwrap();
    assert_eq!(summary.acceptance_window_cancelled, 1);

    let cancelled = store.get_match(m.id).unwrap().unwrap();
    assert_eq!(cancelled.status, MatchStatus::Cancelled);
    assert_eq!(
        cancelled.cancellation_reason.as_deref(),
        Some(ACCEPTANCE_WINDOW_EXPIRED)
    );
    assert_eq!(cancelled.timeout_penalty_applied_to, Some(owner));

    let penalized = store.get_user(owner).unwrap().unwrap();
    assert_eq!(penalized.points, 5);

    let sent = notifier.take();
    assert_eq!(sent.len(), 1);
    match &sent[0] {
        Notification::Broadcast {
            recipient_user_ids,
            message_key,
            data,
        } => {
            assert_eq!(message_key, "match_timed_out_penalty");
            assert_eq!(
                recipient_user_ids,
                &vec![requester.to_string(), owner.to_string()]
            );
            assert_eq!(data_str(data, "timedOutUserId"), owner.to_string());
            assert_eq!(data_str(data, "matchId"), m.id.to_string());
        }
        other => panic!("expected a broadcast, got {other:?}"),
    }
}

#[tokio::test]
async fn initial_pending_timeout_cancels_without_penalty() {
    let store = Arc::new(Store::temporary().unwrap());
    let requester = ObjectId::new();
    let owner = ObjectId::new();
    seed_user(&store, requester, 10, 0);
    seed_user(&store, owner, 10, 0);

    let m = pending_match(requester, owner, Utc::now() - Duration::hours(25));
    store.put_match(&m).unwrap();

    let notifier = Arc::new(RecordingNotifier::new());
    let summary = cleaner(&store, &notifier).run().await.unwrap();
    assert_eq!(summary.initial_pending_cancelled, 1);
    assert_eq!(summary.acceptance_window_cancelled, 0);

    let cancelled = store.get_match(m.id).unwrap().unwrap();
    assert_eq!(cancelled.status, MatchStatus::Cancelled);
    assert_eq!(
        cancelled.cancellation_reason.as_deref(),
        Some(INITIAL_PENDING_EXPIRED)
    );
    assert_eq!(cancelled.timeout_penalty_applied_to, None);

    // Nobody loses points.
    assert_eq!(store.get_user(requester).unwrap().unwrap().points, 10);
    assert_eq!(store.get_user(owner).unwrap().unwrap().points, 10);

    let sent = notifier.take();
    assert_eq!(sent.len(), 1);
    match &sent[0] {
        Notification::Broadcast { message_key, .. } => {
            assert_eq!(message_key, "match_cancelled_no_action");
        }
        other => panic!("expected a broadcast, got {other:?}"),
    }
}

#[tokio::test]
async fn fresh_pending_matches_are_left_alone() {
    let store = Arc::new(Store::temporary().unwrap());
    let m = pending_match(ObjectId::new(), ObjectId::new(), Utc::now());
    store.put_match(&m).unwrap();

    let notifier = Arc::new(RecordingNotifier::new());
    let summary = cleaner(&store, &notifier).run().await.unwrap();
    assert_eq!(summary.acceptance_window_cancelled, 0);
    assert_eq!(summary.initial_pending_cancelled, 0);
    assert_eq!(
        store.get_match(m.id).unwrap().unwrap().status,
        MatchStatus::Pending
    );
    assert!(notifier.take().is_empty());
}

#[test]
fn both_acceptances_promote_to_erranding() {
    let store = Store::temporary().unwrap();
    let requester = ObjectId::new();
    let owner = ObjectId::new();
    let m = pending_match(requester, owner, Utc::now());
    store.put_match(&m).unwrap();

    let after_first = accept_suggested_price(&store, m.id, requester).unwrap();
    assert_eq!(after_first.status, MatchStatus::Pending);
    assert!(after_first.first_acceptance_time.is_some());

    let after_second = accept_suggested_price(&store, m.id, owner).unwrap();
    assert_eq!(after_second.status, MatchStatus::Erranding);
    assert_eq!(after_second.resource1_payment, Some(42.0));
    assert_eq!(after_second.resource2_receipt, Some(48.0));
    assert_eq!(after_second.final_amount, Some(42.0));
}

#[test]
fn rejection_cancels_and_records_the_rejector() {
    let store = Store::temporary().unwrap();
    let requester = ObjectId::new();
    let owner = ObjectId::new();
    let m = pending_match(requester, owner, Utc::now());
    store.put_match(&m).unwrap();

    let rejected = reject_suggested_price(&store, m.id, owner).unwrap();
    assert_eq!(rejected.status, MatchStatus::Cancelled);
    assert_eq!(rejected.rejected_by, Some(owner));

    // The cleanup pass must not touch it again.
    assert!(store
        .cancel_if_pending(m.id, ACCEPTANCE_WINDOW_EXPIRED, Utc::now())
        .unwrap()
        .is_none());
}

/// Wire an erranding match to a service request whose errand completed
/// `hours_ago` hours ago.
fn erranding_fixture(store: &Store, hours_ago: i64) -> (ObjectId, ObjectId) {
    let owner = ObjectId::new();
    let requester = ObjectId::new();

    let mut request: Resource = service_request("帮忙取外卖", 13.75);
    request.user_id = requester;

    let errand = {
        let mut errand = Errand::from_request(&request, owner, Utc::now() - Duration::hours(30));
        errand.completed_at = Some(Utc::now() - Duration::hours(hours_ago));
        errand
    };
    request.status = ResourceStatus::Matched;
    request.assigned_errand_id = Some(errand.id);
    store.put_resource(&request).unwrap();
    store.put_errand(&errand).unwrap();

    let mut m = pending_match(requester, owner, Utc::now() - Duration::hours(30));
    m.resource1 = request.id;
    m.status = MatchStatus::Erranding;
    m.final_amount = Some(13.75);
    store.put_match(&m).unwrap();
    (m.id, owner)
}

#[test]
fn auto_completion_credits_and_is_idempotent() {
    // S5: balance 100, points 0, credits 50, finalAmount 13.75.
    let store = Arc::new(Store::temporary().unwrap());
    let (match_id, owner) = erranding_fixture(&store, 25);
    seed_user(&store, owner, 0, 50);
    seed_wallet(&store, owner, 100.0);

    let completer = AutoCompleter::new(store.clone(), &EngineConfig::default());
    let summary = completer.run().unwrap();
    assert_eq!(summary.completed, 1);

    let wallet = store.get_wallet(owner).unwrap().unwrap();
    assert_eq!(wallet.balance, 113.75);
    assert_eq!(wallet.transactions.len(), 1);
    assert_eq!(wallet.transactions[0].kind, TransactionKind::Credit);
    assert_eq!(wallet.transactions[0].amount, 13.75);
    assert_eq!(wallet.transactions[0].processed_by, "System");

    let user = store.get_user(owner).unwrap().unwrap();
    assert_eq!(user.points, 13);
    assert_eq!(user.credits, 51);

    let m = store.get_match(match_id).unwrap().unwrap();
    assert_eq!(m.status, MatchStatus::Completed);

    // Second run: same wallet, points, and credits.
    let summary = completer.run().unwrap();
    assert_eq!(summary.completed, 0);
    let wallet = store.get_wallet(owner).unwrap().unwrap();
    assert_eq!(wallet.balance, 113.75);
    assert_eq!(wallet.transactions.len(), 1);
    let user = store.get_user(owner).unwrap().unwrap();
    assert_eq!(user.points, 13);
    assert_eq!(user.credits, 51);
}

#[test]
fn credits_are_capped_at_one_hundred() {
    let store = Arc::new(Store::temporary().unwrap());
    let (_, owner) = erranding_fixture(&store, 25);
    seed_user(&store, owner, 0, 100);
    seed_wallet(&store, owner, 0.0);

    AutoCompleter::new(store.clone(), &EngineConfig::default())
        .run()
        .unwrap();
    let user = store.get_user(owner).unwrap().unwrap();
    assert_eq!(user.credits, 100);
    assert_eq!(user.points, 13);
}

#[test]
fn recent_errands_are_not_auto_completed() {
    let store = Arc::new(Store::temporary().unwrap());
    let (match_id, owner) = erranding_fixture(&store, 1);
    seed_user(&store, owner, 0, 0);
    seed_wallet(&store, owner, 0.0);

    let summary = AutoCompleter::new(store.clone(), &EngineConfig::default())
        .run()
        .unwrap();
    assert_eq!(summary.completed, 0);
    assert_eq!(
        store.get_match(match_id).unwrap().unwrap().status,
        MatchStatus::Erranding
    );
}

#[test]
fn invalid_final_amount_leaves_the_match_erranding() {
    let store = Arc::new(Store::temporary().unwrap());
    let (match_id, owner) = erranding_fixture(&store, 25);
    seed_user(&store, owner, 0, 0);
    seed_wallet(&store, owner, 0.0);

    // Corrupt the amount; the transaction must abort and change nothing.
    let mut m = store.get_match(match_id).unwrap().unwrap();
    m.final_amount = Some(-1.0);
    store.put_match(&m).unwrap();

    let summary = AutoCompleter::new(store.clone(), &EngineConfig::default())
        .run()
        .unwrap();
    assert_eq!(summary.completed, 0);
    let after = store.get_match(match_id).unwrap().unwrap();
    assert_eq!(after.status, MatchStatus::Erranding);
    assert_eq!(store.get_wallet(owner).unwrap().unwrap().balance, 0.0);
}
