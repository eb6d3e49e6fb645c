//! Users and wallets

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::ObjectId;

/// Hard cap on user credits.
pub const MAX_CREDITS: i64 = 100;

/// Marketplace user account fields the engine touches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: ObjectId,
    #[serde(default)]
    pub points: i64,
    #[serde(default)]
    pub credits: i64,
}

impl User {
    pub fn new(id: ObjectId) -> Self {
        Self {
            id,
            points: 0,
            credits: 0,
        }
    }

    /// Award completion points and one credit, respecting the credit cap.
    pub fn award_completion(&mut self, points: i64) {
        if points > 0 {
            self.points += points;
        }
        if self.credits < MAX_CREDITS {
            self.credits += 1;
        }
    }
}

/// Direction of a wallet transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Credit,
    Debit,
}

/// Append-only wallet ledger entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletTransaction {
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub amount: f64,
    pub description: String,
    pub reference_id: ObjectId,
    pub reference_model: String,
    pub status: String,
    pub transaction_fee: f64,
    pub processed_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User wallet with balance and ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
    pub id: ObjectId,
    pub user_id: ObjectId,
    #[serde(default)]
    pub balance: f64,
    #[serde(default)]
    pub transactions: Vec<WalletTransaction>,
    pub updated_at: DateTime<Utc>,
}

impl Wallet {
    pub fn new(user_id: ObjectId) -> Self {
        Self {
            id: ObjectId::new(),
            user_id,
            balance: 0.0,
            transactions: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    /// Credit the balance and append the system ledger entry.
    pub fn credit_from_match(&mut self, amount: f64, match_id: ObjectId, now: DateTime<Utc>) {
        self.balance += amount;
        self.transactions.push(WalletTransaction {
            kind: TransactionKind::Credit,
            amount,
            description: format!("Earnings from Auto-Completed Match (ID: {match_id})"),
            reference_id: match_id,
            reference_model: "Match".to_string(),
            status: "completed".to_string(),
            transaction_fee: 0.0,
            processed_by: "System".to_string(),
            created_at: now,
            updated_at: now,
        });
        self.updated_at = now;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn credits_never_exceed_the_cap() {
        let mut user = User::new(ObjectId::new());
        user.credits = MAX_CREDITS;
        user.award_completion(13);
        assert_eq!(user.credits, MAX_CREDITS);
        assert_eq!(user.points, 13);
    }

    #[test]
    fn wallet_credit_appends_a_ledger_entry() {
        let mut wallet = Wallet::new(ObjectId::new());
        let match_id = ObjectId::new();
        wallet.credit_from_match(13.75, match_id, Utc::now());
        assert_eq!(wallet.balance, 13.75);
        assert_eq!(wallet.transactions.len(), 1);
        let entry = &wallet.transactions[0];
        assert_eq!(entry.kind, TransactionKind::Credit);
        assert_eq!(entry.processed_by, "System");
        assert_eq!(entry.reference_id, match_id);
    }
}
