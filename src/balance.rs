//! Out-of-band balance top-ups.
//!
//! A top-up is recorded as a regular income in the ledger under a fixed
//! sentinel category so that the balance invariant keeps holding, while the
//! earnings shown on the overview leave top-ups out.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;
use serde::Deserialize;
use time::Date;

use crate::{
    AppState, Error,
    clock::today_in,
    transaction::{LedgerChange, TransactionDraft, TransactionKind, create_transaction},
    user::UserID,
};

/// The category that marks a ledger entry as a balance top-up.
pub(crate) const BALANCE_TOP_UP_CATEGORY: &str = "Balance Added";

/// The description given to balance top-up entries.
pub(crate) const BALANCE_TOP_UP_DESCRIPTION: &str = "Balance Added";

/// Credit `amount` to the balance of the user `user_id`.
///
/// The credit is recorded as an income dated `today` under the sentinel
/// category [BALANCE_TOP_UP_CATEGORY].
///
/// # Errors
///
/// This function returns:
/// - [Error::InvalidAmount] if `amount` is zero, negative or not a finite
///   number.
/// - [Error::NotFound] if there is no user with ID `user_id`.
/// - [Error::SqlError] if an unexpected SQL error occurs.
pub fn credit_balance(
    user_id: UserID,
    amount: f64,
    today: Date,
    connection: &mut Connection,
) -> Result<LedgerChange, Error> {
    let draft = TransactionDraft {
        description: BALANCE_TOP_UP_DESCRIPTION.to_owned(),
        amount,
        kind: TransactionKind::Income,
        category: BALANCE_TOP_UP_CATEGORY.to_owned(),
        date: today,
        is_recurring: false,
    };

    create_transaction(user_id, draft, today, connection)
}

/// The data for crediting the signed-in user's balance.
#[derive(Debug, Deserialize)]
pub struct AddBalanceData {
    /// The amount to add to the balance.
    pub amount: f64,
}

/// The state needed to credit a user's balance.
#[derive(Debug, Clone)]
pub struct AddBalanceState {
    /// The database connection for updating the balance.
    db_connection: Arc<Mutex<Connection>>,
    /// The timezone used to work out today's date.
    local_timezone: String,
}

impl FromRef<AppState> for AddBalanceState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// A route handler for crediting the signed-in user's balance.
///
/// The response contains the new balance along with the ledger entry that
/// recorded the top-up.
pub async fn add_balance_endpoint(
    State(state): State<AddBalanceState>,
    Extension(user_id): Extension<UserID>,
    Json(data): Json<AddBalanceData>,
) -> Result<Json<LedgerChange>, Error> {
    let today = today_in(&state.local_timezone)?;
    let mut connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let change = credit_balance(user_id, data.amount, today, &mut connection)?;

    Ok(Json(change))
}

#[cfg(test)]
mod balance_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, Json, extract::State};
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error, PasswordHash,
        db::initialize,
        transaction::{TransactionKind, list_transactions},
        user::{NewUser, UserID, create_user, get_user_by_id},
    };

    use super::{
        AddBalanceData, AddBalanceState, BALANCE_TOP_UP_CATEGORY, add_balance_endpoint,
        credit_balance,
    };

    fn get_test_connection() -> (Connection, UserID) {
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

        (conn, user.id)
    }

    #[test]
    fn credit_increases_balance_and_appends_income() {
        let (mut conn, user_id) = get_test_connection();
        let today = date!(2024 - 06 - 15);

        let change = credit_balance(user_id, 250.0, today, &mut conn).unwrap();

        assert_eq!(change.balance, 250.0);
        assert_eq!(change.transaction.kind, TransactionKind::Income);
        assert_eq!(change.transaction.category, BALANCE_TOP_UP_CATEGORY);
        assert_eq!(change.transaction.amount, 250.0);
        assert_eq!(change.transaction.date, today);

        let user = get_user_by_id(user_id, &conn).unwrap();
        assert_eq!(user.balance, 250.0);
        assert_eq!(list_transactions(user_id, &conn).unwrap().len(), 1);
    }

    #[test]
    fn credit_rejects_non_positive_amount() {
        let (mut conn, user_id) = get_test_connection();
        let today = date!(2024 - 06 - 15);

        for amount in [0.0, -50.0] {
            let result = credit_balance(user_id, amount, today, &mut conn);

            assert_eq!(result, Err(Error::InvalidAmount(amount)));
        }

        let result = credit_balance(user_id, f64::NAN, today, &mut conn);
        assert!(matches!(result, Err(Error::InvalidAmount(_))));

        let user = get_user_by_id(user_id, &conn).unwrap();
        assert_eq!(user.balance, 0.0);
    }

    #[test]
    fn credit_fails_on_unknown_user() {
        let (mut conn, _) = get_test_connection();
        let today = date!(2024 - 06 - 15);

        let result = credit_balance(UserID::new(999), 100.0, today, &mut conn);

        assert_eq!(result, Err(Error::NotFound));
    }

    #[tokio::test]
    async fn add_balance_endpoint_returns_new_balance() {
        let (conn, user_id) = get_test_connection();
        let state = AddBalanceState {
            db_connection: Arc::new(Mutex::new(conn)),
            local_timezone: "Etc/UTC".to_owned(),
        };

        let change = add_balance_endpoint(
            State(state.clone()),
            Extension(user_id),
            Json(AddBalanceData { amount: 125.5 }),
        )
        .await
        .unwrap()
        .0;

        assert_eq!(change.balance, 125.5);
        assert_eq!(change.transaction.description, BALANCE_TOP_UP_CATEGORY);

        let connection = state.db_connection.lock().unwrap();
        let user = get_user_by_id(user_id, &connection).unwrap();
        assert_eq!(user.balance, 125.5);
    }
}
