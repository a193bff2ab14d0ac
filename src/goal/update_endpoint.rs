use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    clock::today_in,
    goal::{GoalStatus, refresh_goal_state},
    user::{GoalType, UserID},
};

/// The data for updating the signed-in user's spending goal.
#[derive(Debug, Deserialize)]
pub struct UpdateGoalsData {
    /// The monthly salary the goal amounts are derived from.
    pub monthly_salary: Option<f64>,
    /// The goal period to report progress against.
    pub goal_type: Option<GoalType>,
}

/// The state needed to update the spending goal.
#[derive(Debug, Clone)]
pub struct UpdateGoalsState {
    /// The database connection for updating goal settings.
    db_connection: Arc<Mutex<Connection>>,
    /// The timezone used to work out today's date.
    local_timezone: String,
}

impl FromRef<AppState> for UpdateGoalsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// A route handler for updating the signed-in user's spending goal.
///
/// Fields left out of the request keep their current values. The updated
/// goal status is sent back so the client can redraw its progress bars
/// without a second request.
///
/// # Errors
///
/// This function returns an [Error::InvalidSalary] if the new salary is
/// zero, negative or not a finite number.
pub async fn update_goals_endpoint(
    State(state): State<UpdateGoalsState>,
    Extension(user_id): Extension<UserID>,
    Json(data): Json<UpdateGoalsData>,
) -> Result<Json<GoalStatus>, Error> {
    if let Some(salary) = data.monthly_salary {
        if !salary.is_finite() || salary <= 0.0 {
            return Err(Error::InvalidSalary(salary));
        }
    }

    let today = today_in(&state.local_timezone)?;
    let mut connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;
    let sql_transaction = connection.transaction()?;

    if let Some(salary) = data.monthly_salary {
        sql_transaction.execute(
            "UPDATE user SET monthly_salary = ?1 WHERE id = ?2",
            (salary, user_id.as_i64()),
        )?;
    }

    if let Some(goal_type) = data.goal_type {
        sql_transaction.execute(
            "UPDATE user SET goal_type = ?1 WHERE id = ?2",
            (goal_type, user_id.as_i64()),
        )?;
    }

    let refreshed = refresh_goal_state(user_id, today, &sql_transaction)?;

    sql_transaction.commit()?;

    Ok(Json(GoalStatus::from(refreshed)))
}

#[cfg(test)]
mod update_goals_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, Json, extract::State};
    use rusqlite::Connection;

    use crate::{
        Error, PasswordHash,
        db::initialize,
        user::{GoalType, NewUser, UserID, create_user, get_user_by_id},
    };

    use super::{UpdateGoalsData, UpdateGoalsState, update_goals_endpoint};

    fn get_test_state() -> (UpdateGoalsState, UserID) {
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

        let state = UpdateGoalsState {
            db_connection: Arc::new(Mutex::new(conn)),
            local_timezone: "Etc/UTC".to_owned(),
        };

        (state, user.id)
    }

    #[tokio::test]
    async fn update_sets_salary_and_goal_amounts() {
        let (state, user_id) = get_test_state();
        let data = UpdateGoalsData {
            monthly_salary: Some(3000.0),
            goal_type: None,
        };

        let status = update_goals_endpoint(State(state.clone()), Extension(user_id), Json(data))
            .await
            .unwrap()
            .0;

        assert_eq!(status.monthly_salary, Some(3000.0));
        assert_eq!(status.goal_amount_daily, 100.0);
        assert_eq!(status.goal_amount_weekly, 750.0);
        assert_eq!(status.goal_amount_monthly, 3000.0);

        let connection = state.db_connection.lock().unwrap();
        let user = get_user_by_id(user_id, &connection).unwrap();
        assert_eq!(user.monthly_salary, Some(3000.0));
    }

    #[tokio::test]
    async fn update_rejects_non_positive_salary() {
        let (state, user_id) = get_test_state();

        for salary in [0.0, -1200.0, f64::NAN] {
            let data = UpdateGoalsData {
                monthly_salary: Some(salary),
                goal_type: None,
            };

            let result =
                update_goals_endpoint(State(state.clone()), Extension(user_id), Json(data)).await;

            assert!(matches!(result, Err(Error::InvalidSalary(_))));
        }
    }

    #[tokio::test]
    async fn update_sets_goal_type_without_touching_salary() {
        let (state, user_id) = get_test_state();
        update_goals_endpoint(
            State(state.clone()),
            Extension(user_id),
            Json(UpdateGoalsData {
                monthly_salary: Some(3000.0),
                goal_type: None,
            }),
        )
        .await
        .unwrap();

        let status = update_goals_endpoint(
            State(state.clone()),
            Extension(user_id),
            Json(UpdateGoalsData {
                monthly_salary: None,
                goal_type: Some(GoalType::Weekly),
            }),
        )
        .await
        .unwrap()
        .0;

        assert_eq!(status.goal_type, GoalType::Weekly);
        assert_eq!(status.monthly_salary, Some(3000.0));

        let connection = state.db_connection.lock().unwrap();
        let user = get_user_by_id(user_id, &connection).unwrap();
        assert_eq!(user.goal_type, GoalType::Weekly);
    }

    #[tokio::test]
    async fn update_reports_progress_for_chosen_goal_type() {
        let (state, user_id) = get_test_state();

        let status = update_goals_endpoint(
            State(state),
            Extension(user_id),
            Json(UpdateGoalsData {
                monthly_salary: Some(3000.0),
                goal_type: Some(GoalType::Daily),
            }),
        )
        .await
        .unwrap()
        .0;

        assert_eq!(status.goal_type, GoalType::Daily);
        assert_eq!(status.progress_percent, 0.0);
        assert_eq!(status.progress_bar_percent, 0.0);
    }
}
