//! Typed store gateway
//!
//! All persistence goes through this gateway: one tree per collection,
//! documents as JSON values, single-document conditional updates as
//! compare-and-swap loops, and multi-document mutations as multi-tree
//! transactions. Handlers stay idempotent by expressing their status
//! preconditions inside the update closures.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sled::transaction::ConflictableTransactionError;
use sled::Transactional;
use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::model::{
    Errand, Match, MatchStatus, ObjectId, PotentialErrand, Resource, ResourceStatus, ResourceType,
    RunnerProfile, User, Wallet,
};

/// Outcome of one auto-completion transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// Wallet credited, points and credit awarded, match completed.
    Applied,
    /// The match was no longer in `erranding`; nothing changed.
    Skipped,
}

/// Gateway over the persisted collections.
pub struct Store {
    _db: sled::Db,
    resources: sled::Tree,
    matches: sled::Tree,
    errands: sled::Tree,
    users: sled::Tree,
    wallets: sled::Tree,
    runner_profiles: sled::Tree,
}

fn abort(err: EngineError) -> ConflictableTransactionError<EngineError> {
    ConflictableTransactionError::Abort(err)
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> EngineResult<T> {
    serde_json::from_slice(bytes).map_err(Into::into)
}

fn encode<T: Serialize>(doc: &T) -> EngineResult<Vec<u8>> {
    serde_json::to_vec(doc).map_err(Into::into)
}

impl Store {
    /// Open (or create) the store at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        Self::from_db(sled::open(path)?)
    }

    /// An in-memory store that vanishes on drop.
    pub fn temporary() -> EngineResult<Self> {
        Self::from_db(sled::Config::new().temporary(true).open()?)
    }

    fn from_db(db: sled::Db) -> EngineResult<Self> {
        Ok(Self {
            resources: db.open_tree("resources")?,
            matches: db.open_tree("matches")?,
            errands: db.open_tree("errands")?,
            users: db.open_tree("users")?,
            wallets: db.open_tree("wallets")?,
            runner_profiles: db.open_tree("runner_profiles")?,
            _db: db,
        })
    }

    fn get_doc<T: DeserializeOwned>(tree: &sled::Tree, id: ObjectId) -> EngineResult<Option<T>> {
        match tree.get(id.as_bytes())? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    fn put_doc<T: Serialize>(tree: &sled::Tree, id: ObjectId, doc: &T) -> EngineResult<()> {
        tree.insert(id.as_bytes(), encode(doc)?)?;
        Ok(())
    }

    fn collect<T, F>(tree: &sled::Tree, mut keep: F) -> EngineResult<Vec<T>>
    where
        T: DeserializeOwned,
        F: FnMut(&T) -> bool,
    {
        let mut out = Vec::new();
        for entry in tree.iter() {
            let (_, value) = entry?;
            let doc: T = decode(&value)?;
            if keep(&doc) {
                out.push(doc);
            }
        }
        Ok(out)
    }

    /// Conditional read-modify-write on one document.
    ///
    /// The closure sees the current document and returns the replacement,
    /// or `None` to leave it untouched. Retries on concurrent writes, so
    /// the precondition is re-evaluated against the latest version.
    fn update_with<T, F>(tree: &sled::Tree, id: ObjectId, apply: F) -> EngineResult<Option<T>>
    where
        T: Serialize + DeserializeOwned,
        F: Fn(&T) -> EngineResult<Option<T>>,
    {
        loop {
            let Some(current) = tree.get(id.as_bytes())? else {
                return Ok(None);
            };
            let doc: T = decode(&current)?;
            let Some(updated) = apply(&doc)? else {
                return Ok(None);
            };
            let encoded = encode(&updated)?;
            match tree.compare_and_swap(id.as_bytes(), Some(current), Some(encoded))? {
                Ok(()) => return Ok(Some(updated)),
                Err(_) => {
                    debug!(%id, "concurrent write, retrying conditional update");
                    continue;
                }
            }
        }
    }

    // ---- resources ----

    pub fn get_resource(&self, id: ObjectId) -> EngineResult<Option<Resource>> {
        Self::get_doc(&self.resources, id)
    }

    pub fn put_resource(&self, resource: &Resource) -> EngineResult<()> {
        Self::put_doc(&self.resources, resource.id, resource)
    }

    /// Remove a posting and prune the weak references runner profiles hold
    /// on it.
    pub fn delete_resource(&self, id: ObjectId) -> EngineResult<()> {
        self.resources.remove(id.as_bytes())?;
        let profiles: Vec<RunnerProfile> = Self::collect(&self.runner_profiles, |p: &RunnerProfile| {
            p.potential_errand_requests.iter().any(|e| e.request_id == id)
        })?;
        for profile in profiles {
            Self::update_with(&self.runner_profiles, profile.id, |p: &RunnerProfile| {
                let mut updated = p.clone();
                updated.potential_errand_requests.retain(|e| e.request_id != id);
                Ok(Some(updated))
            })?;
        }
        Ok(())
    }

    /// Distinct categories that currently have resources in `matching`.
    pub fn distinct_matching_categories(&self) -> EngineResult<Vec<String>> {
        let mut categories = BTreeSet::new();
        for entry in self.resources.iter() {
            let (_, value) = entry?;
            let resource: Resource = decode(&value)?;
            if resource.status == ResourceStatus::Matching {
                if let Some(category) = resource.category {
                    categories.insert(category);
                }
            }
        }
        Ok(categories.into_iter().collect())
    }

    /// One page of goods resources in `matching` for a category, price
    /// ascending.
    pub fn matching_goods_page(
        &self,
        category: &str,
        skip: usize,
        limit: usize,
    ) -> EngineResult<Vec<Resource>> {
        let mut page: Vec<Resource> = Self::collect(&self.resources, |r: &Resource| {
            r.status == ResourceStatus::Matching
                && r.resource_type.is_goods()
                && r.category.as_deref() == Some(category)
        })?;
        page.sort_by(|a, b| {
            let pa = a.price.unwrap_or(f64::MAX);
            let pb = b.price.unwrap_or(f64::MAX);
            pa.partial_cmp(&pb)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(page.into_iter().skip(skip).take(limit).collect())
    }

    /// Current statuses of the given resources.
    pub fn resource_status_map(
        &self,
        ids: &HashSet<ObjectId>,
    ) -> EngineResult<HashMap<ObjectId, ResourceStatus>> {
        let mut statuses = HashMap::with_capacity(ids.len());
        for id in ids {
            if let Some(resource) = self.get_resource(*id)? {
                statuses.insert(*id, resource.status);
            }
        }
        Ok(statuses)
    }

    /// Flip the given resources to `matched`.
    pub fn mark_resources_matched(&self, ids: &HashSet<ObjectId>) -> EngineResult<usize> {
        let now = Utc::now();
        let mut updated = 0;
        for id in ids {
            let applied = Self::update_with(&self.resources, *id, |r: &Resource| {
                let mut next = r.clone();
                next.status = ResourceStatus::Matched;
                next.updated_at = now;
                Ok(Some(next))
            })?;
            if applied.is_some() {
                updated += 1;
            }
        }
        Ok(updated)
    }

    /// Record a classification result and open the resource for matching.
    pub fn apply_classification(
        &self,
        id: ObjectId,
        category: &str,
        specifications: serde_json::Map<String, serde_json::Value>,
    ) -> EngineResult<Option<Resource>> {
        let now = Utc::now();
        Self::update_with(&self.resources, id, |r: &Resource| {
            let mut next = r.clone();
            next.category = Some(category.to_string());
            next.specifications = specifications.clone();
            next.status = ResourceStatus::Matching;
            next.updated_at = now;
            Ok(Some(next))
        })
    }

    pub fn mark_classification_failed(&self, id: ObjectId, message: &str) -> EngineResult<()> {
        let now = Utc::now();
        let truncated: String = message.chars().take(255).collect();
        Self::update_with(&self.resources, id, |r: &Resource| {
            let mut next = r.clone();
            next.status = ResourceStatus::ClassificationFailed;
            next.error_message = Some(truncated.clone());
            next.updated_at = now;
            Ok(Some(next))
        })?;
        Ok(())
    }

    /// Service requests touched within the recency window that still await
    /// a runner.
    pub fn recent_service_requests(
        &self,
        window_start: DateTime<Utc>,
        limit: usize,
    ) -> EngineResult<Vec<Resource>> {
        let requests = Self::collect(&self.resources, |r: &Resource| {
            r.resource_type == ResourceType::ServiceRequest
                && matches!(r.status, ResourceStatus::Submitted | ResourceStatus::Matching)
                && r.assigned_errand_id.is_none()
                && (r.created_at >= window_start || r.updated_at >= window_start)
        })?;
        Ok(requests.into_iter().take(limit).collect())
    }

    /// Service offers touched within the recency window.
    pub fn recent_service_offers(
        &self,
        window_start: DateTime<Utc>,
        limit: usize,
    ) -> EngineResult<Vec<Resource>> {
        let offers = Self::collect(&self.resources, |r: &Resource| {
            r.resource_type == ResourceType::ServiceOffer
                && matches!(r.status, ResourceStatus::Active | ResourceStatus::Available)
                && (r.created_at >= window_start || r.updated_at >= window_start)
        })?;
        Ok(offers.into_iter().take(limit).collect())
    }

    /// Unassigned service requests in `matching`, oldest first.
    pub fn pending_service_requests(&self, limit: usize) -> EngineResult<Vec<Resource>> {
        let mut pending = Self::collect(&self.resources, |r: &Resource| {
            r.resource_type == ResourceType::ServiceRequest
                && r.status == ResourceStatus::Matching
                && r.assigned_errand_id.is_none()
        })?;
        pending.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(pending.into_iter().take(limit).collect())
    }

    /// Bump `matchAttempts` so a failing request is not starved forever.
    pub fn increment_match_attempts(&self, id: ObjectId) -> EngineResult<()> {
        Self::update_with(&self.resources, id, |r: &Resource| {
            let mut next = r.clone();
            next.match_attempts += 1;
            Ok(Some(next))
        })?;
        Ok(())
    }

    // ---- matches ----

    pub fn get_match(&self, id: ObjectId) -> EngineResult<Option<Match>> {
        Self::get_doc(&self.matches, id)
    }

    pub fn put_match(&self, m: &Match) -> EngineResult<()> {
        Self::put_doc(&self.matches, m.id, m)
    }

    /// Bulk-insert the matches of one pass. All or nothing; a failure here
    /// fails the whole job so the queue re-runs it.
    pub fn insert_matches(&self, matches: &[Match]) -> EngineResult<()> {
        let mut batch = sled::Batch::default();
        for m in matches {
            batch.insert(m.id.as_bytes().as_slice(), encode(m)?);
        }
        self.matches.apply_batch(batch)?;
        Ok(())
    }

    /// Pending matches whose acceptance window lapsed.
    pub fn acceptance_window_timeouts(
        &self,
        threshold: DateTime<Utc>,
    ) -> EngineResult<Vec<Match>> {
        Self::collect(&self.matches, |m: &Match| {
            m.status == MatchStatus::Pending
                && m.first_acceptance_time.is_some_and(|t| t < threshold)
        })
    }

    /// Pending matches nobody ever acted on.
    pub fn initial_pending_timeouts(&self, threshold: DateTime<Utc>) -> EngineResult<Vec<Match>> {
        Self::collect(&self.matches, |m: &Match| {
            m.status == MatchStatus::Pending
                && m.first_acceptance_time.is_none()
                && m.created_at < threshold
        })
    }

    /// Cancel a match iff it is still pending. Returns the cancelled
    /// document, or `None` when another handler got there first.
    pub fn cancel_if_pending(
        &self,
        id: ObjectId,
        reason: &str,
        now: DateTime<Utc>,
    ) -> EngineResult<Option<Match>> {
        Self::update_with(&self.matches, id, |m: &Match| {
            if m.status != MatchStatus::Pending {
                return Ok(None);
            }
            let mut next = m.clone();
            next.cancel(reason, now)?;
            Ok(Some(next))
        })
    }

    pub fn set_timeout_penalty(
        &self,
        id: ObjectId,
        user: ObjectId,
        now: DateTime<Utc>,
    ) -> EngineResult<()> {
        Self::update_with(&self.matches, id, |m: &Match| {
            let mut next = m.clone();
            next.timeout_penalty_applied_to = Some(user);
            next.updated_at = now;
            Ok(Some(next))
        })?;
        Ok(())
    }

    /// Record one party's acceptance of the suggested price.
    pub fn record_acceptance(
        &self,
        id: ObjectId,
        user: ObjectId,
        now: DateTime<Utc>,
    ) -> EngineResult<Match> {
        Self::update_with(&self.matches, id, |m: &Match| {
            let mut next = m.clone();
            next.record_acceptance(user, now)?;
            Ok(Some(next))
        })?
        .ok_or_else(|| EngineError::NotFound(format!("match {id}")))
    }

    /// Record one party's rejection of the suggested price.
    pub fn record_rejection(
        &self,
        id: ObjectId,
        user: ObjectId,
        now: DateTime<Utc>,
    ) -> EngineResult<Match> {
        Self::update_with(&self.matches, id, |m: &Match| {
            let mut next = m.clone();
            next.record_rejection(user, now)?;
            Ok(Some(next))
        })?
        .ok_or_else(|| EngineError::NotFound(format!("match {id}")))
    }

    pub fn erranding_matches(&self) -> EngineResult<Vec<Match>> {
        Self::collect(&self.matches, |m: &Match| m.status == MatchStatus::Erranding)
    }

    /// Every match document. Full scan; operational tooling only.
    pub fn all_matches(&self) -> EngineResult<Vec<Match>> {
        Self::collect(&self.matches, |_: &Match| true)
    }

    // ---- errands ----

    pub fn get_errand(&self, id: ObjectId) -> EngineResult<Option<Errand>> {
        Self::get_doc(&self.errands, id)
    }

    pub fn put_errand(&self, errand: &Errand) -> EngineResult<()> {
        Self::put_doc(&self.errands, errand.id, errand)
    }

    // ---- users / wallets ----

    pub fn get_user(&self, id: ObjectId) -> EngineResult<Option<User>> {
        Self::get_doc(&self.users, id)
    }

    pub fn put_user(&self, user: &User) -> EngineResult<()> {
        Self::put_doc(&self.users, user.id, user)
    }

    /// Adjust a user's points; `false` when the user does not exist.
    pub fn adjust_points(&self, id: ObjectId, delta: i64) -> EngineResult<bool> {
        let updated = Self::update_with(&self.users, id, |u: &User| {
            let mut next = u.clone();
            next.points += delta;
            Ok(Some(next))
        })?;
        Ok(updated.is_some())
    }

    /// Wallets are keyed by their owning user.
    pub fn get_wallet(&self, user_id: ObjectId) -> EngineResult<Option<Wallet>> {
        Self::get_doc(&self.wallets, user_id)
    }

    pub fn put_wallet(&self, wallet: &Wallet) -> EngineResult<()> {
        Self::put_doc(&self.wallets, wallet.user_id, wallet)
    }

    // ---- runner profiles ----

    pub fn get_profile(&self, id: ObjectId) -> EngineResult<Option<RunnerProfile>> {
        Self::get_doc(&self.runner_profiles, id)
    }

    pub fn put_profile(&self, profile: &RunnerProfile) -> EngineResult<()> {
        Self::put_doc(&self.runner_profiles, profile.id, profile)
    }

    /// Profiles of the given offer owners, keyed by user.
    pub fn profiles_by_users(
        &self,
        user_ids: &HashSet<ObjectId>,
    ) -> EngineResult<HashMap<ObjectId, RunnerProfile>> {
        let profiles = Self::collect(&self.runner_profiles, |p: &RunnerProfile| {
            user_ids.contains(&p.user_id)
        })?;
        Ok(profiles.into_iter().map(|p| (p.user_id, p)).collect())
    }

    /// Upsert one scored pairing into a profile's potential list, unique by
    /// request.
    pub fn upsert_potential_match(
        &self,
        profile_id: ObjectId,
        entry: PotentialErrand,
    ) -> EngineResult<()> {
        Self::update_with(&self.runner_profiles, profile_id, |p: &RunnerProfile| {
            let mut next = p.clone();
            next.upsert_potential(entry.clone());
            Ok(Some(next))
        })?
        .ok_or_else(|| EngineError::NotFound(format!("runner profile {profile_id}")))?;
        Ok(())
    }

    /// Profiles holding a potential entry for this request and no active
    /// errand.
    pub fn assignable_profiles_for_request(
        &self,
        request_id: ObjectId,
    ) -> EngineResult<Vec<RunnerProfile>> {
        Self::collect(&self.runner_profiles, |p: &RunnerProfile| {
            p.is_assignable() && p.potential_for(request_id).is_some()
        })
    }

    // ---- multi-document transactions ----

    /// Atomically create an errand, mark its request matched, and hand it
    /// to the chosen runner.
    pub fn assign_errand_txn(
        &self,
        request_id: ObjectId,
        profile_id: ObjectId,
        errand: &Errand,
    ) -> EngineResult<()> {
        let errand_bytes = encode(errand)?;
        let errand_id = errand.id;
        let now = errand.runner_assigned_at;
        (&self.errands, &self.resources, &self.runner_profiles)
            .transaction(|(errands_t, resources_t, profiles_t)| -> sled::transaction::ConflictableTransactionResult<(), EngineError> {
                errands_t.insert(errand_id.as_bytes().as_slice(), errand_bytes.clone())?;

                let resource_bytes = resources_t
                    .get(request_id.as_bytes())?
                    .ok_or_else(|| abort(EngineError::NotFound(format!("resource {request_id}"))))?;
                let mut resource: Resource =
                    decode(&resource_bytes).map_err(abort)?;
                if resource.status != ResourceStatus::Matching
                    || resource.assigned_errand_id.is_some()
                {
                    return Err(abort(EngineError::Validation(format!(
                        "resource {request_id} is no longer assignable"
                    ))));
                }
                resource.status = ResourceStatus::Matched;
                resource.assigned_errand_id = Some(errand_id);
                resource.match_attempts += 1;
                resource.updated_at = now;
                resources_t.insert(
                    request_id.as_bytes().as_slice(),
                    encode(&resource).map_err(abort)?,
                )?;

                let profile_bytes = profiles_t
                    .get(profile_id.as_bytes())?
                    .ok_or_else(|| abort(EngineError::NotFound(format!("runner profile {profile_id}"))))?;
                let mut profile: RunnerProfile =
                    decode(&profile_bytes).map_err(abort)?;
                if profile.current_active_errand.is_some() {
                    return Err(abort(EngineError::Validation(format!(
                        "runner profile {profile_id} already has an active errand"
                    ))));
                }
                profile
                    .potential_errand_requests
                    .retain(|e| e.request_id != request_id);
                profile.current_active_errand = Some(errand_id);
                profiles_t.insert(
                    profile_id.as_bytes().as_slice(),
                    encode(&profile).map_err(abort)?,
                )?;

                Ok(())
            })
            .map_err(EngineError::from)
    }

    /// Atomically credit the owner wallet, award points/credit, and mark
    /// the match completed. Skips (idempotently) when the match already
    /// left `erranding`.
    pub fn complete_match_txn(
        &self,
        match_id: ObjectId,
        now: DateTime<Utc>,
    ) -> EngineResult<CompletionOutcome> {
        (&self.matches, &self.users, &self.wallets)
            .transaction(|(matches_t, users_t, wallets_t)| -> sled::transaction::ConflictableTransactionResult<CompletionOutcome, EngineError> {
                let match_bytes = matches_t
                    .get(match_id.as_bytes())?
                    .ok_or_else(|| abort(EngineError::NotFound(format!("match {match_id}"))))?;
                let mut m: Match = decode(&match_bytes).map_err(abort)?;
                if m.status != MatchStatus::Erranding {
                    return Ok(CompletionOutcome::Skipped);
                }

                let amount = match m.final_amount {
                    Some(amount) if amount > 0.0 => amount,
                    other => {
                        return Err(abort(EngineError::Validation(format!(
                            "match {match_id} has invalid finalAmount {other:?}"
                        ))))
                    }
                };

                let owner = m.owner;
                let wallet_bytes = wallets_t.get(owner.as_bytes())?.ok_or_else(|| {
                    abort(EngineError::Validation(format!(
                        "wallet not found for owner {owner}"
                    )))
                })?;
                let mut wallet: Wallet = decode(&wallet_bytes).map_err(abort)?;
                wallet.credit_from_match(amount, match_id, now);
                wallets_t.insert(
                    owner.as_bytes().as_slice(),
                    encode(&wallet).map_err(abort)?,
                )?;

                let user_bytes = users_t.get(owner.as_bytes())?.ok_or_else(|| {
                    abort(EngineError::Validation(format!(
                        "owner user {owner} not found"
                    )))
                })?;
                let mut user: User = decode(&user_bytes).map_err(abort)?;
                user.award_completion(amount.floor() as i64);
                users_t.insert(owner.as_bytes().as_slice(), encode(&user).map_err(abort)?)?;

                m.status = MatchStatus::Completed;
                m.updated_at = now;
                matches_t.insert(match_id.as_bytes().as_slice(), encode(&m).map_err(abort)?)?;

                Ok(CompletionOutcome::Applied)
            })
            .map_err(EngineError::from)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::ACCEPTANCE_WINDOW_EXPIRED;

    fn sample_match() -> Match {
        let now = Utc::now();
        Match {
            id: ObjectId::new(),
            resource1: ObjectId::new(),
            resource2: ObjectId::new(),
            requester: ObjectId::new(),
            owner: ObjectId::new(),
            score: 8,
            original_price_requester: Some(50.0),
            original_price_owner: Some(40.0),
            suggested_price_requester: Some(42.0),
            suggested_price_owner: Some(48.0),
            resource1_payment: None,
            resource2_receipt: None,
            final_amount: None,
            status: MatchStatus::Pending,
            first_acceptance_time: None,
            requester_accepted_suggested_price: false,
            owner_accepted_suggested_price: false,
            requester_accepted_original_price: false,
            owner_accepted_original_price: false,
            rejected_by: None,
            timeout_penalty_applied_to: None,
            cancellation_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn conditional_cancel_is_idempotent() {
        let store = Store::temporary().unwrap();
        let m = sample_match();
        store.put_match(&m).unwrap();

        let first = store
            .cancel_if_pending(m.id, ACCEPTANCE_WINDOW_EXPIRED, Utc::now())
            .unwrap();
        assert!(first.is_some());

        // Second handler loses the race and must be a no-op.
        let second = store
            .cancel_if_pending(m.id, ACCEPTANCE_WINDOW_EXPIRED, Utc::now())
            .unwrap();
        assert!(second.is_none());
    }

    #[test]
    fn completion_skips_non_erranding_matches() {
        let store = Store::temporary().unwrap();
        let mut m = sample_match();
        m.status = MatchStatus::Completed;
        store.put_match(&m).unwrap();

        let outcome = store.complete_match_txn(m.id, Utc::now()).unwrap();
        assert_eq!(outcome, CompletionOutcome::Skipped);
    }

    #[test]
    fn completion_validates_final_amount() {
        let store = Store::temporary().unwrap();
        let mut m = sample_match();
        m.status = MatchStatus::Erranding;
        m.final_amount = None;
        store.put_match(&m).unwrap();

        let err = store.complete_match_txn(m.id, Utc::now()).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn deleting_a_resource_prunes_profile_references() {
        let store = Store::temporary().unwrap();
        let request_id = ObjectId::new();
        let mut profile = RunnerProfile::new(ObjectId::new());
        profile.upsert_potential(PotentialErrand {
            request_id,
            offer_id: ObjectId::new(),
            score: 40,
            matched_at: Utc::now(),
        });
        store.put_profile(&profile).unwrap();

        store.delete_resource(request_id).unwrap();
        let pruned = store.get_profile(profile.id).unwrap().unwrap();
        assert!(pruned.potential_errand_requests.is_empty());
    }
}
