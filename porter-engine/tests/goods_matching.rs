//! End-to-end goods-matching scenarios: the unique-winner rule,
//! second-price tie-breaking, and the pass-level invariants.

mod common;

use std::collections::HashSet;
use std::sync::Arc;

use porter_engine::config::EngineConfig;
use porter_engine::matching::MatchEngine;
use porter_engine::model::{MatchStatus, ObjectId, Resource, ResourceStatus, ResourceType};
use porter_engine::store::Store;
use porter_nlp::FixedEmbedder;
use serde_json::json;

use common::matching_resource;

fn engine_with(
    resources: &[&Resource],
    embedder: FixedEmbedder,
) -> (Arc<Store>, MatchEngine) {
    let store = Arc::new(Store::temporary().unwrap());
    for resource in resources {
        store.put_resource(resource).unwrap();
    }
    let engine = MatchEngine::new(
        store.clone(),
        Arc::new(embedder),
        &EngineConfig::default(),
    );
    (store, engine)
}

#[test]
fn unique_winner_gets_plain_suggested_prices() {
    // S1: a lone compatible pair at the top tier.
    let mut buyer = matching_resource(ResourceType::Buy, "Books", "Calc textbook", 50.0);
    buyer
        .specifications
        .insert("subject".to_string(), json!("高等数学"));
    let mut seller = matching_resource(ResourceType::Sell, "Books", "Calculus book", 40.0);
    seller
        .specifications
        .insert("subject".to_string(), json!("高等数学"));

    let mut embedder = FixedEmbedder::new();
    embedder
        .insert("Calc textbook", vec![1.0, 0.0])
        .insert("Calculus book", vec![0.8, 0.6]);

    let (store, engine) = engine_with(&[&buyer, &seller], embedder);
    let summary = engine.run_match_pass().unwrap();
    assert_eq!(summary.matches_created, 1);

    let matches = store.all_matches().unwrap();
    assert_eq!(matches.len(), 1);
    let m = &matches[0];
    assert!(m.score >= 5);
    assert_eq!(m.status, MatchStatus::Pending);
    assert_eq!(m.resource1, buyer.id);
    assert_eq!(m.resource2, seller.id);
    assert_eq!(m.requester, buyer.user_id);
    assert_eq!(m.owner, seller.user_id);
    // suggestedRequester = ownerOriginal + fee, suggestedOwner = requesterOriginal - fee.
    assert_eq!(m.suggested_price_requester, Some(42.0));
    assert_eq!(m.suggested_price_owner, Some(48.0));
    assert_eq!(m.resource1_payment, None);
    assert_eq!(m.resource2_receipt, None);

    for id in [buyer.id, seller.id] {
        let resource = store.get_resource(id).unwrap().unwrap();
        assert_eq!(resource.status, ResourceStatus::Matched);
    }
}

#[test]
fn tied_tier_clears_at_second_prices() {
    // S2: two buyers, two sellers, identical names, one score tier.
    let b1 = matching_resource(ResourceType::Buy, "Electronics", "Graphing calculator", 100.0);
    let b2 = matching_resource(ResourceType::Buy, "Electronics", "Graphing calculator", 90.0);
    let s1 = matching_resource(ResourceType::Sell, "Electronics", "Graphing calculator", 60.0);
    let s2 = matching_resource(ResourceType::Sell, "Electronics", "Graphing calculator", 70.0);

    let mut embedder = FixedEmbedder::new();
    embedder.insert("Graphing calculator", vec![1.0, 0.0]);

    let (store, engine) = engine_with(&[&b1, &b2, &s1, &s2], embedder);
    let summary = engine.run_match_pass().unwrap();
    assert_eq!(summary.matches_created, 2);

    let matches = store.all_matches().unwrap();
    let find = |buyer_id: ObjectId| {
        matches
            .iter()
            .find(|m| m.resource1 == buyer_id)
            .unwrap_or_else(|| panic!("no match for buyer {buyer_id}"))
    };

    // Max-weight selection pairs B1-S1 (40) with B2-S2 (20).
    let m1 = find(b1.id);
    assert_eq!(m1.resource2, s1.id);
    let m2 = find(b2.id);
    assert_eq!(m2.resource2, s2.id);

    // Buyers pay min(bid, second-best ask) = 70; sellers receive their asks.
    assert_eq!(m1.suggested_price_requester, Some(70.0));
    assert_eq!(m1.suggested_price_owner, Some(60.0));
    assert_eq!(m2.suggested_price_requester, Some(70.0));
    assert_eq!(m2.suggested_price_owner, Some(70.0));

    // Buyer never pays above the bid, seller never receives below the ask.
    for m in &matches {
        assert!(m.suggested_price_requester.unwrap() <= m.original_price_requester.unwrap());
        assert!(m.suggested_price_owner.unwrap() >= m.original_price_owner.unwrap());
    }

    for id in [b1.id, b2.id, s1.id, s2.id] {
        let resource = store.get_resource(id).unwrap().unwrap();
        assert_eq!(resource.status, ResourceStatus::Matched);
    }
}

#[test]
fn no_resource_appears_in_two_matches() {
    // Three buyers chasing two sellers across the same category.
    let b1 = matching_resource(ResourceType::Buy, "Books", "Algebra notes", 80.0);
    let b2 = matching_resource(ResourceType::Buy, "Books", "Algebra notes", 70.0);
    let b3 = matching_resource(ResourceType::Buy, "Books", "Algebra notes", 60.0);
    let s1 = matching_resource(ResourceType::Sell, "Books", "Algebra notes", 30.0);
    let s2 = matching_resource(ResourceType::Sell, "Books", "Algebra notes", 40.0);

    let mut embedder = FixedEmbedder::new();
    embedder.insert("Algebra notes", vec![0.0, 1.0]);

    let (store, engine) = engine_with(&[&b1, &b2, &b3, &s1, &s2], embedder);
    engine.run_match_pass().unwrap();

    let matches = store.all_matches().unwrap();
    let mut seen: HashSet<ObjectId> = HashSet::new();
    for m in &matches {
        assert!(seen.insert(m.resource1), "resource matched twice");
        assert!(seen.insert(m.resource2), "resource matched twice");
        // Every created match pairs compatible types in one category.
        let r1 = store.get_resource(m.resource1).unwrap().unwrap();
        let r2 = store.get_resource(m.resource2).unwrap().unwrap();
        assert_eq!(r1.resource_type.counterpart(), r2.resource_type);
        assert_eq!(r1.category, r2.category);
        // Buyer-side original covers seller-side original plus the fee.
        assert!(
            m.original_price_requester.unwrap() >= m.original_price_owner.unwrap() + 2.0
        );
        assert!(m.score >= 5);
    }
}

#[test]
fn threshold_and_price_gate_exclude_pairs() {
    // Orthogonal names, no specs: score stays below the threshold.
    let buyer = matching_resource(ResourceType::Buy, "Books", "Organic chemistry", 50.0);
    let seller = matching_resource(ResourceType::Sell, "Books", "Campus map", 40.0);
    let mut embedder = FixedEmbedder::new();
    embedder
        .insert("Organic chemistry", vec![1.0, 0.0])
        .insert("Campus map", vec![0.0, 1.0]);
    let (store, engine) = engine_with(&[&buyer, &seller], embedder);
    let summary = engine.run_match_pass().unwrap();
    assert_eq!(summary.matches_created, 0);
    assert!(store.all_matches().unwrap().is_empty());

    // Identical names but the bid does not cover ask + fee.
    let buyer = matching_resource(ResourceType::Buy, "Books", "Linear algebra", 41.0);
    let seller = matching_resource(ResourceType::Sell, "Books", "Linear algebra", 40.0);
    let mut embedder = FixedEmbedder::new();
    embedder.insert("Linear algebra", vec![1.0, 0.0]);
    let (store, engine) = engine_with(&[&buyer, &seller], embedder);
    let summary = engine.run_match_pass().unwrap();
    assert_eq!(summary.matches_created, 0);
}

#[test]
fn rent_and_lease_pair_like_buy_and_sell() {
    let lessee = matching_resource(ResourceType::Lease, "Electronics", "Mini fridge", 30.0);
    let lessor = matching_resource(ResourceType::Rent, "Electronics", "Mini fridge", 20.0);
    let mut embedder = FixedEmbedder::new();
    embedder.insert("Mini fridge", vec![1.0, 0.0]);

    let (store, engine) = engine_with(&[&lessee, &lessor], embedder);
    let summary = engine.run_match_pass().unwrap();
    assert_eq!(summary.matches_created, 1);

    let m = &store.all_matches().unwrap()[0];
    // The lease side pays, so it is the requester.
    assert_eq!(m.resource1, lessee.id);
    assert_eq!(m.suggested_price_requester, Some(22.0));
    assert_eq!(m.suggested_price_owner, Some(28.0));
}

#[test]
fn pass_is_deterministic_for_equal_inputs() {
    let build = || {
        let b1 = matching_resource(ResourceType::Buy, "Books", "Physics book", 100.0);
        let b2 = matching_resource(ResourceType::Buy, "Books", "Physics book", 90.0);
        let s1 = matching_resource(ResourceType::Sell, "Books", "Physics book", 60.0);
        let s2 = matching_resource(ResourceType::Sell, "Books", "Physics book", 70.0);
        let mut embedder = FixedEmbedder::new();
        embedder.insert("Physics book", vec![1.0, 0.0]);
        engine_with(&[&b1, &b2, &s1, &s2], embedder)
    };

    let pairing = |store: &Store| {
        let mut pairs: Vec<(f64, f64)> = store
            .all_matches()
            .unwrap()
            .iter()
            .map(|m| {
                (
                    m.original_price_requester.unwrap(),
                    m.original_price_owner.unwrap(),
                )
            })
            .collect();
        pairs.sort_by(|a, b| a.partial_cmp(b).unwrap());
        pairs
    };

    let (store_a, engine_a) = build();
    engine_a.run_match_pass().unwrap();
    let (store_b, engine_b) = build();
    engine_b.run_match_pass().unwrap();
    assert_eq!(pairing(&store_a), pairing(&store_b));
    assert_eq!(pairing(&store_a), vec![(90.0, 70.0), (100.0, 60.0)]);
}
