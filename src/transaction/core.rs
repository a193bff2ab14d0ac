//! Defines the core data models and database queries for the transaction
//! ledger.
//!
//! Ledger writes also maintain the owner's running balance, and expense
//! writes refresh the cached goal spending totals, all within a single SQL
//! transaction so the balance can never drift from the ledger.

use rusqlite::{
    Connection, Row,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{Error, goal::refresh_goal_state, user::UserID};

/// Alias for the integer type used for transaction IDs.
pub type TransactionId = i64;

// ============================================================================
// MODELS
// ============================================================================

/// Whether a transaction adds money to the account or takes money out of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionKind {
    /// Money coming into the account, e.g. a pay cheque.
    Income,
    /// Money leaving the account, e.g. groceries.
    Expense,
}

impl TransactionKind {
    /// The string stored in the database for the transaction kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "INCOME",
            TransactionKind::Expense => "EXPENSE",
        }
    }
}

impl FromSql for TransactionKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "INCOME" => Ok(TransactionKind::Income),
            "EXPENSE" => Ok(TransactionKind::Expense),
            other => Err(FromSqlError::Other(
                format!("{other} is not a valid transaction kind").into(),
            )),
        }
    }
}

impl ToSql for TransactionKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

/// The canonical expense categories that clients can offer as defaults.
///
/// The API itself accepts any non-empty category string.
pub const DEFAULT_EXPENSE_CATEGORIES: [&str; 11] = [
    "Food",
    "Services",
    "Home",
    "Shopping",
    "Education",
    "Leisure",
    "Transactions",
    "Health",
    "Transport",
    "Travel",
    "Other",
];

/// The canonical income categories that clients can offer as defaults.
pub const DEFAULT_INCOME_CATEGORIES: [&str; 8] = [
    "Investments",
    "Bonus",
    "Loans",
    "Transaction",
    "Gift",
    "Extra Income",
    "Salary",
    "Other",
];

/// An expense or income, i.e. an event where money was either spent or earned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// A text description of what the transaction was for.
    pub description: String,
    /// The amount of money spent or earned in this transaction.
    /// Always positive, the direction comes from `kind`.
    pub amount: f64,
    /// Whether the transaction is an income or an expense.
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    /// The category the transaction belongs to, e.g. "Groceries", "Transport".
    pub category: String,
    /// When the transaction happened.
    pub date: Date,
    /// Whether the transaction repeats every month, e.g. rent or a salary.
    pub is_recurring: bool,
}

impl Transaction {
    /// The amount with the sign implied by the transaction kind, positive for
    /// income and negative for expenses.
    pub fn signed_amount(&self) -> f64 {
        match self.kind {
            TransactionKind::Income => self.amount,
            TransactionKind::Expense => -self.amount,
        }
    }
}

/// The details needed to record a new transaction in the ledger.
///
/// A draft is validated against today's date when it is inserted, see
/// [create_transaction].
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionDraft {
    /// A text description of what the transaction was for.
    pub description: String,
    /// The amount of money spent or earned. Must be positive.
    pub amount: f64,
    /// Whether the transaction is an income or an expense.
    pub kind: TransactionKind,
    /// The category the transaction belongs to.
    pub category: String,
    /// When the transaction happened. Must fall in the current month.
    pub date: Date,
    /// Whether the transaction repeats every month.
    pub is_recurring: bool,
}

/// The outcome of a ledger write, the affected transaction and the owner's
/// balance after the write.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerChange {
    /// The owner's balance after the ledger was changed.
    pub balance: f64,
    /// The transaction that was inserted or deleted.
    pub transaction: Transaction,
}

fn validate_draft(draft: &TransactionDraft, today: Date) -> Result<(), Error> {
    if draft.description.trim().is_empty() {
        return Err(Error::EmptyDescription);
    }

    if draft.category.trim().is_empty() {
        return Err(Error::EmptyCategory);
    }

    if !draft.amount.is_finite() || draft.amount <= 0.0 {
        return Err(Error::InvalidAmount(draft.amount));
    }

    let draft_month = (draft.date.year(), draft.date.month());
    let current_month = (today.year(), today.month());

    if draft_month > current_month {
        return Err(Error::DateInFutureMonth(draft.date));
    }

    if draft_month < current_month {
        return Err(Error::DateInPastMonth(draft.date));
    }

    Ok(())
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                description TEXT NOT NULL,
                amount REAL NOT NULL,
                kind TEXT NOT NULL,
                category TEXT NOT NULL,
                date TEXT NOT NULL,
                is_recurring INTEGER NOT NULL DEFAULT 0,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    // Ensure the sequence starts at 1
    connection.execute(
        "INSERT OR IGNORE INTO sqlite_sequence (name, seq) VALUES ('transaction', 0)",
        (),
    )?;

    // Composite index used when listing a user's ledger newest first.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_date ON \"transaction\"(user_id, date);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let description = row.get(1)?;
    let amount = row.get(2)?;
    let kind = row.get(3)?;
    let category = row.get(4)?;
    let date = row.get(5)?;
    let is_recurring = row.get(6)?;

    Ok(Transaction {
        id,
        description,
        amount,
        kind,
        category,
        date,
        is_recurring,
    })
}

/// Add `delta` to the balance of the user `user_id` and return the new
/// balance.
fn apply_balance_delta(user_id: UserID, delta: f64, connection: &Connection) -> Result<f64, Error> {
    let balance = connection
        .prepare("UPDATE user SET balance = balance + ?1 WHERE id = ?2 RETURNING balance")?
        .query_one((delta, user_id.as_i64()), |row| row.get(0))?;

    Ok(balance)
}

/// Validate `draft` and insert it into the ledger of the user `user_id`.
///
/// The user's balance is credited for incomes and debited for expenses, and
/// expenses refresh the user's cached goal spending totals. The insert, the
/// balance update and the refresh happen in one SQL transaction.
///
/// `today` is the current date in the server's local timezone. Transactions
/// can only be added to the month that contains `today`.
///
/// # Errors
/// This function will return a:
/// - [Error::EmptyDescription] or [Error::EmptyCategory] if a text field is blank,
/// - or [Error::InvalidAmount] if the amount is not a positive, finite number,
/// - or [Error::DateInFutureMonth] or [Error::DateInPastMonth] if the date is
///   outside the current month,
/// - or [Error::NotFound] if `user_id` does not refer to a registered user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    user_id: UserID,
    draft: TransactionDraft,
    today: Date,
    connection: &mut Connection,
) -> Result<LedgerChange, Error> {
    validate_draft(&draft, today)?;

    let sql_transaction = connection.transaction()?;

    let transaction = sql_transaction
        .prepare(
            "INSERT INTO \"transaction\" \
             (user_id, description, amount, kind, category, date, is_recurring)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             RETURNING id, description, amount, kind, category, date, is_recurring",
        )?
        .query_one(
            (
                user_id.as_i64(),
                &draft.description,
                draft.amount,
                draft.kind,
                &draft.category,
                draft.date,
                draft.is_recurring,
            ),
            map_transaction_row,
        )?;

    let balance = apply_balance_delta(user_id, transaction.signed_amount(), &sql_transaction)?;

    if transaction.kind == TransactionKind::Expense {
        refresh_goal_state(user_id, today, &sql_transaction)?;
    }

    sql_transaction.commit()?;

    Ok(LedgerChange {
        balance,
        transaction,
    })
}

/// Delete the transaction `transaction_id` from the ledger of the user
/// `user_id` and undo its effect on the user's balance.
///
/// Deleting an expense refreshes the user's cached goal spending totals. The
/// delete, the balance update and the refresh happen in one SQL transaction.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingTransaction] if `transaction_id` does not refer to
///   a transaction owned by `user_id`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_transaction(
    user_id: UserID,
    transaction_id: TransactionId,
    today: Date,
    connection: &mut Connection,
) -> Result<LedgerChange, Error> {
    let sql_transaction = connection.transaction()?;

    let transaction = sql_transaction
        .prepare(
            "SELECT id, description, amount, kind, category, date, is_recurring
             FROM \"transaction\" WHERE id = ?1 AND user_id = ?2",
        )?
        .query_one((transaction_id, user_id.as_i64()), map_transaction_row)
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::DeleteMissingTransaction,
            error => error.into(),
        })?;

    sql_transaction.execute(
        "DELETE FROM \"transaction\" WHERE id = ?1",
        (transaction.id,),
    )?;

    let balance = apply_balance_delta(user_id, -transaction.signed_amount(), &sql_transaction)?;

    if transaction.kind == TransactionKind::Expense {
        refresh_goal_state(user_id, today, &sql_transaction)?;
    }

    sql_transaction.commit()?;

    Ok(LedgerChange {
        balance,
        transaction,
    })
}

/// Retrieve the ledger of the user `user_id`, newest transactions first.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn list_transactions(user_id: UserID, connection: &Connection) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(
            "SELECT id, description, amount, kind, category, date, is_recurring
             FROM \"transaction\" WHERE user_id = :user_id
             ORDER BY date DESC, id DESC",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(|error| error.into()))
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================
