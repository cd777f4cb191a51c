use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{TransactionReason, TransactionType, WalletAccount, WalletTransaction},
    error::{AppError, Result},
    repository::WalletRepository,
};

#[derive(FromRow)]
struct WalletRow {
    id: String,
    user_id: String,
    balance: i64,
    phone: Option<String>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

#[derive(FromRow)]
struct TransactionRow {
    id: String,
    wallet_id: String,
    booking_id: Option<String>,
    txn_type: String,
    amount: i64,
    reason: String,
    created_at: NaiveDateTime,
}

fn parse_uuid(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| AppError::Database(e.to_string()))
}

fn row_to_account(row: WalletRow) -> Result<WalletAccount> {
    Ok(WalletAccount {
        id: parse_uuid(&row.id)?,
        user_id: parse_uuid(&row.user_id)?,
        balance: row.balance,
        phone: row.phone,
        created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
        updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
    })
}

fn row_to_transaction(row: TransactionRow) -> Result<WalletTransaction> {
    Ok(WalletTransaction {
        id: parse_uuid(&row.id)?,
        wallet_id: parse_uuid(&row.wallet_id)?,
        booking_id: row.booking_id.as_deref().map(parse_uuid).transpose()?,
        txn_type: parse_txn_type(&row.txn_type)?,
        amount: row.amount,
        reason: parse_reason(&row.reason)?,
        created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
    })
}

fn parse_txn_type(s: &str) -> Result<TransactionType> {
    match s {
        "Credit" => Ok(TransactionType::Credit),
        "Debit" => Ok(TransactionType::Debit),
        _ => Err(AppError::Database(format!("Invalid transaction type: {}", s))),
    }
}

fn txn_type_to_str(txn_type: &TransactionType) -> &'static str {
    match txn_type {
        TransactionType::Credit => "Credit",
        TransactionType::Debit => "Debit",
    }
}

fn parse_reason(s: &str) -> Result<TransactionReason> {
    match s {
        "BOOKING_FEE" => Ok(TransactionReason::BookingFee),
        "REFUND" => Ok(TransactionReason::Refund),
        "TOP_UP" => Ok(TransactionReason::TopUp),
        "ADJUSTMENT" => Ok(TransactionReason::Adjustment),
        _ => Err(AppError::Database(format!("Invalid transaction reason: {}", s))),
    }
}

fn reason_to_str(reason: &TransactionReason) -> &'static str {
    match reason {
        TransactionReason::BookingFee => "BOOKING_FEE",
        TransactionReason::Refund => "REFUND",
        TransactionReason::TopUp => "TOP_UP",
        TransactionReason::Adjustment => "ADJUSTMENT",
    }
}

// --- Connection-scoped helpers -------------------------------------------
//
// Balance is read-modify-written together with the ledger append. Callers
// hold the surrounding transaction, so concurrent debits against one
// wallet serialize on it.

/// Accounts are created lazily on first touch, starting at zero.
pub async fn get_or_create(
    conn: &mut SqliteConnection,
    user_id: Uuid,
    now: DateTime<Utc>,
) -> Result<WalletAccount> {
    if let Some(account) = fetch_by_user(conn, user_id).await? {
        return Ok(account);
    }

    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO wallet_accounts (id, user_id, balance, phone, created_at, updated_at)
        VALUES (?, ?, 0, NULL, ?, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(user_id.to_string())
    .bind(now.naive_utc())
    .bind(now.naive_utc())
    .execute(&mut *conn)
    .await
    .map_err(|e| AppError::Database(e.to_string()))?;

    fetch_by_user(conn, user_id)
        .await?
        .ok_or_else(|| AppError::Database("Failed to retrieve created wallet".to_string()))
}

pub async fn fetch_by_user(
    conn: &mut SqliteConnection,
    user_id: Uuid,
) -> Result<Option<WalletAccount>> {
    let row = sqlx::query_as::<_, WalletRow>(
        "SELECT id, user_id, balance, phone, created_at, updated_at \
         FROM wallet_accounts WHERE user_id = ?",
    )
    .bind(user_id.to_string())
    .fetch_optional(conn)
    .await
    .map_err(|e| AppError::Database(e.to_string()))?;

    match row {
        Some(r) => Ok(Some(row_to_account(r)?)),
        None => Ok(None),
    }
}

/// Debit with its ledger entry. Fails with `InsufficientFunds` when the
/// balance does not cover `amount`; the caller's transaction then rolls
/// everything back.
pub async fn apply_debit(
    conn: &mut SqliteConnection,
    wallet_id: Uuid,
    amount: i64,
    reason: TransactionReason,
    booking_id: Option<Uuid>,
    now: DateTime<Utc>,
) -> Result<()> {
    if amount <= 0 {
        return Err(AppError::Validation("debit amount must be positive".to_string()));
    }

    let balance: i64 = sqlx::query_scalar("SELECT balance FROM wallet_accounts WHERE id = ?")
        .bind(wallet_id.to_string())
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    if balance < amount {
        return Err(AppError::InsufficientFunds(format!(
            "wallet balance {} does not cover debit of {}",
            balance, amount
        )));
    }

    sqlx::query("UPDATE wallet_accounts SET balance = balance - ?, updated_at = ? WHERE id = ?")
        .bind(amount)
        .bind(now.naive_utc())
        .bind(wallet_id.to_string())
        .execute(&mut *conn)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    append_entry(conn, wallet_id, TransactionType::Debit, amount, reason, booking_id, now).await
}

/// Credit with its ledger entry.
pub async fn apply_credit(
    conn: &mut SqliteConnection,
    wallet_id: Uuid,
    amount: i64,
    reason: TransactionReason,
    booking_id: Option<Uuid>,
    now: DateTime<Utc>,
) -> Result<()> {
    if amount <= 0 {
        return Err(AppError::Validation("credit amount must be positive".to_string()));
    }

    sqlx::query("UPDATE wallet_accounts SET balance = balance + ?, updated_at = ? WHERE id = ?")
        .bind(amount)
        .bind(now.naive_utc())
        .bind(wallet_id.to_string())
        .execute(&mut *conn)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    append_entry(conn, wallet_id, TransactionType::Credit, amount, reason, booking_id, now).await
}

async fn append_entry(
    conn: &mut SqliteConnection,
    wallet_id: Uuid,
    txn_type: TransactionType,
    amount: i64,
    reason: TransactionReason,
    booking_id: Option<Uuid>,
    now: DateTime<Utc>,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO wallet_transactions (id, wallet_id, booking_id, txn_type, amount, reason, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(wallet_id.to_string())
    .bind(booking_id.map(|id| id.to_string()))
    .bind(txn_type_to_str(&txn_type))
    .bind(amount)
    .bind(reason_to_str(&reason))
    .bind(now.naive_utc())
    .execute(conn)
    .await
    .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(())
}

/// Record the guest's phone on the account when none is known yet.
pub async fn backfill_phone(
    conn: &mut SqliteConnection,
    wallet_id: Uuid,
    phone: &str,
    now: DateTime<Utc>,
) -> Result<()> {
    sqlx::query(
        "UPDATE wallet_accounts SET phone = ?, updated_at = ? WHERE id = ? AND phone IS NULL",
    )
    .bind(phone)
    .bind(now.naive_utc())
    .bind(wallet_id.to_string())
    .execute(conn)
    .await
    .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(())
}

// --- Pool-backed repository ----------------------------------------------

pub struct SqliteWalletRepository {
    pool: SqlitePool,
}

impl SqliteWalletRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WalletRepository for SqliteWalletRepository {
    async fn find_by_user(&self, user_id: Uuid) -> Result<Option<WalletAccount>> {
        let mut conn = self.pool.acquire().await?;
        fetch_by_user(&mut conn, user_id).await
    }

    async fn get_or_create(&self, user_id: Uuid) -> Result<WalletAccount> {
        let mut tx = self.pool.begin().await?;
        let account = get_or_create(&mut tx, user_id, Utc::now()).await?;
        tx.commit().await?;
        Ok(account)
    }

    async fn list_transactions(&self, wallet_id: Uuid) -> Result<Vec<WalletTransaction>> {
        let rows = sqlx::query_as::<_, TransactionRow>(
            // rowid preserves append order even when entries share a
            // timestamp within one transaction.
            "SELECT id, wallet_id, booking_id, txn_type, amount, reason, created_at \
             FROM wallet_transactions WHERE wallet_id = ? ORDER BY rowid",
        )
        .bind(wallet_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(row_to_transaction).collect()
    }

    async fn credit(
        &self,
        user_id: Uuid,
        amount: i64,
        reason: TransactionReason,
        booking_id: Option<Uuid>,
    ) -> Result<WalletAccount> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        let account = get_or_create(&mut tx, user_id, now).await?;
        apply_credit(&mut tx, account.id, amount, reason, booking_id, now).await?;
        tx.commit().await?;

        self.find_by_user(user_id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve wallet".to_string()))
    }

    async fn debit(
        &self,
        user_id: Uuid,
        amount: i64,
        reason: TransactionReason,
        booking_id: Option<Uuid>,
    ) -> Result<WalletAccount> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        let account = get_or_create(&mut tx, user_id, now).await?;
        apply_debit(&mut tx, account.id, amount, reason, booking_id, now).await?;
        tx.commit().await?;

        self.find_by_user(user_id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve wallet".to_string()))
    }
}
