use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-user balance, lazily created on first touch. The balance column
/// is a cache of the signed ledger sum; the two are only ever written
/// together, inside one transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletAccount {
    pub id: Uuid,
    pub user_id: Uuid,
    pub balance: i64,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TransactionType {
    Credit,
    Debit,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionReason {
    BookingFee,
    Refund,
    TopUp,
    Adjustment,
}

/// Append-only ledger entry. `amount` is always positive; the sign
/// lives in `txn_type`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletTransaction {
    pub id: Uuid,
    pub wallet_id: Uuid,
    pub booking_id: Option<Uuid>,
    pub txn_type: TransactionType,
    pub amount: i64,
    pub reason: TransactionReason,
    pub created_at: DateTime<Utc>,
}

impl WalletTransaction {
    pub fn signed_amount(&self) -> i64 {
        match self.txn_type {
            TransactionType::Credit => self.amount,
            TransactionType::Debit => -self.amount,
        }
    }
}
