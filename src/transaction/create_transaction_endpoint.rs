//! Defines the endpoint for creating a new transaction.
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::IntoResponse,
};
use rusqlite::Connection;
use serde::Deserialize;
use time::Date;

use crate::{
    AppState, Error,
    clock::today_in,
    transaction::{TransactionDraft, TransactionKind, core::create_transaction},
    user::UserID,
};

/// The state needed to create a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    /// The database connection for managing transactions.
    db_connection: Arc<Mutex<Connection>>,
    /// The timezone used to work out today's date.
    local_timezone: String,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The data for creating a transaction.
#[derive(Debug, Deserialize)]
pub struct CreateTransactionData {
    /// Text detailing the transaction.
    pub description: String,
    /// The value of the transaction. Must be positive.
    pub amount: f64,
    /// Whether the transaction is an income or an expense.
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    /// The category the transaction belongs to.
    pub category: String,
    /// The date when the transaction occurred.
    pub date: Date,
    /// Whether the transaction repeats every month.
    #[serde(default)]
    pub is_recurring: bool,
}

/// A route handler for recording a new transaction in the signed-in user's
/// ledger.
///
/// Responds with 201 CREATED, the stored transaction and the balance after
/// applying it.
///
/// # Errors
///
/// This function returns:
/// - [Error::EmptyDescription] or [Error::EmptyCategory] if a text field is
///   blank.
/// - [Error::InvalidAmount] if the amount is zero, negative or not a finite
///   number.
/// - [Error::DateInFutureMonth] or [Error::DateInPastMonth] if the date
///   falls outside the current calendar month.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    Extension(user_id): Extension<UserID>,
    Json(data): Json<CreateTransactionData>,
) -> Result<impl IntoResponse, Error> {
    let today = today_in(&state.local_timezone)?;
    let draft = TransactionDraft {
        description: data.description,
        amount: data.amount,
        kind: data.kind,
        category: data.category,
        date: data.date,
        is_recurring: data.is_recurring,
    };

    let mut connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let change = create_transaction(user_id, draft, today, &mut connection)?;

    Ok((StatusCode::CREATED, Json(change)))
}

#[cfg(test)]
mod create_transaction_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error, PasswordHash,
        clock::today_in,
        db::initialize,
        transaction::{TransactionKind, list_transactions},
        user::{NewUser, UserID, create_user, get_user_by_id},
    };

    use super::{CreateTransactionData, CreateTransactionState, create_transaction_endpoint};

    fn get_test_state() -> (CreateTransactionState, UserID) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        let user = create_user(
            NewUser {
                email: "foo@bar.baz".to_owned(),
                full_name: "Foo Bar".to_owned(),
                password_hash: PasswordHash::new_unchecked("hunter2"),
            },
            &conn,
        )
        .unwrap();

        let state = CreateTransactionState {
            db_connection: Arc::new(Mutex::new(conn)),
            local_timezone: "Etc/UTC".to_owned(),
        };

        (state, user.id)
    }

    #[tokio::test]
    async fn can_create_transaction() {
        let (state, user_id) = get_test_state();
        let data = CreateTransactionData {
            description: "Weekly shop".to_owned(),
            amount: 42.5,
            kind: TransactionKind::Expense,
            category: "Groceries".to_owned(),
            date: today_in("Etc/UTC").unwrap(),
            is_recurring: false,
        };

        let response = create_transaction_endpoint(State(state.clone()), Extension(user_id), Json(data))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::CREATED);

        let connection = state.db_connection.lock().unwrap();
        let transactions = list_transactions(user_id, &connection).unwrap();
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].description, "Weekly shop");
        assert_eq!(get_user_by_id(user_id, &connection).unwrap().balance, -42.5);
    }

    #[tokio::test]
    async fn create_rejects_date_outside_current_month() {
        let (state, user_id) = get_test_state();
        let data = CreateTransactionData {
            description: "Time travel".to_owned(),
            amount: 10.0,
            kind: TransactionKind::Expense,
            category: "Misc".to_owned(),
            date: date!(2000 - 01 - 01),
            is_recurring: false,
        };

        let result =
            create_transaction_endpoint(State(state.clone()), Extension(user_id), Json(data)).await;

        assert!(matches!(result, Err(Error::DateInPastMonth(_))));

        let connection = state.db_connection.lock().unwrap();
        assert_eq!(list_transactions(user_id, &connection).unwrap().len(), 0);
    }

    #[tokio::test]
    async fn create_rejects_blank_description() {
        let (state, user_id) = get_test_state();
        let data = CreateTransactionData {
            description: "   ".to_owned(),
            amount: 10.0,
            kind: TransactionKind::Income,
            category: "Misc".to_owned(),
            date: today_in("Etc/UTC").unwrap(),
            is_recurring: false,
        };

        let result =
            create_transaction_endpoint(State(state), Extension(user_id), Json(data)).await;

        assert!(matches!(result, Err(Error::EmptyDescription)));
    }
}
