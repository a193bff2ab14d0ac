//! Defines the endpoint for reading the ledger.
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;
use serde::Serialize;

use crate::{
    AppState, Error,
    clock::today_in,
    goal::month_totals,
    transaction::{Transaction, core::list_transactions},
    user::{UserID, get_user_by_id},
};

/// The state needed to read the ledger.
#[derive(Debug, Clone)]
pub struct ListTransactionsState {
    /// The database connection for reading transactions.
    db_connection: Arc<Mutex<Connection>>,
    /// The timezone used to work out today's date.
    local_timezone: String,
}

impl FromRef<AppState> for ListTransactionsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// A user's ledger along with the headline figures for the overview page.
#[derive(Debug, Serialize)]
pub struct LedgerSnapshot {
    /// The user's current balance.
    pub balance: f64,
    /// Money earned this calendar month, leaving out balance top-ups.
    pub month_earnings: f64,
    /// Money spent this calendar month.
    pub month_expenses: f64,
    /// Every transaction in the ledger, most recent first.
    pub transactions: Vec<Transaction>,
}

/// A route handler for reading the signed-in user's ledger.
///
/// The response contains the full transaction history sorted most recent
/// first, the current balance and the earnings and expenses for the current
/// calendar month.
pub async fn list_transactions_endpoint(
    State(state): State<ListTransactionsState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<LedgerSnapshot>, Error> {
    let today = today_in(&state.local_timezone)?;
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let user = get_user_by_id(user_id, &connection)?;
    let transactions = list_transactions(user_id, &connection)?;
    let totals = month_totals(&transactions, today);

    Ok(Json(LedgerSnapshot {
        balance: user.balance,
        month_earnings: totals.earnings,
        month_expenses: totals.expenses,
        transactions,
    }))
}
