use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    clock::today_in,
    goal::{GoalStatus, refresh_goal_state},
    user::UserID,
};

/// The state needed to report goal status.
#[derive(Debug, Clone)]
pub struct GoalStatusState {
    /// The database connection for reading and refreshing goal state.
    db_connection: Arc<Mutex<Connection>>,
    /// The timezone used to work out today's date.
    local_timezone: String,
}

impl FromRef<AppState> for GoalStatusState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// A route handler for reading the signed-in user's goal status.
///
/// Stale spending buckets are rolled over and the totals recomputed from the
/// ledger before the status is reported, so a request after midnight sees
/// the new day's totals.
pub async fn get_goals_endpoint(
    State(state): State<GoalStatusState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<GoalStatus>, Error> {
    let today = today_in(&state.local_timezone)?;
    let mut connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;
    let sql_transaction = connection.transaction()?;

    let refreshed = refresh_goal_state(user_id, today, &sql_transaction)?;

    sql_transaction.commit()?;

    Ok(Json(GoalStatus::from(refreshed)))
}
