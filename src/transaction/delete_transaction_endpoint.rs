//! Defines the endpoint for deleting a transaction.
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    clock::today_in,
    transaction::{LedgerChange, TransactionId, core::delete_transaction},
    user::UserID,
};

/// The state needed to delete a transaction.
#[derive(Debug, Clone)]
pub struct DeleteTransactionState {
    /// The database connection for managing transactions.
    db_connection: Arc<Mutex<Connection>>,
    /// The timezone used to work out today's date.
    local_timezone: String,
}

impl FromRef<AppState> for DeleteTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// A route handler for deleting a transaction from the signed-in user's
/// ledger.
///
/// The transaction's effect on the balance is undone and the response
/// contains the removed entry along with the restored balance.
///
/// # Errors
///
/// This function returns a [Error::DeleteMissingTransaction] if
/// `transaction_id` does not refer to a transaction owned by the signed-in
/// user.
pub async fn delete_transaction_endpoint(
    State(state): State<DeleteTransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<TransactionId>,
) -> Result<Json<LedgerChange>, Error> {
    let today = today_in(&state.local_timezone)?;
    let mut connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let change = delete_transaction(user_id, transaction_id, today, &mut connection)?;

    Ok(Json(change))
}
