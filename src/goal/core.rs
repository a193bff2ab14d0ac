//! Keeps the cached goal spending state in the user table in step with the
//! ledger.

use rusqlite::Connection;
use serde::Serialize;
use time::Date;

use crate::{
    Error,
    goal::{
        evaluator::{SpentTotals, clamped_progress_percent, goal_targets, progress_percent, spent_totals},
        rollover::{ResetMarks, roll_over},
    },
    transaction::list_transactions,
    user::{GoalType, UserID, get_user_by_id},
};

/// The goal fields left after a refresh, used to build the status payload.
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshedGoals {
    /// The user's monthly salary, if they have set one.
    pub monthly_salary: Option<f64>,
    /// The goal period the user chose to emphasise.
    pub goal_type: GoalType,
    /// The freshly recomputed spending totals.
    pub spent: SpentTotals,
}

/// Roll any stale spending buckets for the user `user_id` forward to `today`,
/// recompute the spent totals from the ledger and persist them.
///
/// Callers that pair this with a ledger write must run both on the same SQL
/// transaction so the cached totals cannot drift from the ledger.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `user_id` does not refer to a registered user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn refresh_goal_state(
    user_id: UserID,
    today: Date,
    connection: &Connection,
) -> Result<RefreshedGoals, Error> {
    let user = get_user_by_id(user_id, connection)?;

    let outcome = roll_over(
        ResetMarks {
            last_daily_reset: user.last_daily_reset,
            last_weekly_reset: user.last_weekly_reset,
        },
        today,
    );

    if outcome.daily_rolled {
        connection.execute(
            "UPDATE user SET spent_daily = 0, last_daily_reset = ?1 WHERE id = ?2",
            (outcome.marks.last_daily_reset, user_id.as_i64()),
        )?;
    }

    if outcome.weekly_rolled {
        connection.execute(
            "UPDATE user SET spent_weekly = 0, last_weekly_reset = ?1 WHERE id = ?2",
            (outcome.marks.last_weekly_reset, user_id.as_i64()),
        )?;
    }

    let transactions = list_transactions(user_id, connection)?;
    let spent = spent_totals(&transactions, today);

    connection.execute(
        "UPDATE user SET spent_daily = ?1, spent_weekly = ?2, spent_monthly = ?3 WHERE id = ?4",
        (spent.daily, spent.weekly, spent.monthly, user_id.as_i64()),
    )?;

    Ok(RefreshedGoals {
        monthly_salary: user.monthly_salary,
        goal_type: user.goal_type,
        spent,
    })
}

/// The JSON payload describing a user's spending goals and their progress
/// towards them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalStatus {
    /// The monthly salary the goals are derived from, if set.
    pub monthly_salary: Option<f64>,
    /// The goal period the user chose to emphasise.
    pub goal_type: GoalType,
    /// The daily spending limit.
    pub goal_amount_daily: f64,
    /// The weekly spending limit.
    pub goal_amount_weekly: f64,
    /// The monthly spending limit.
    pub goal_amount_monthly: f64,
    /// Total spent today.
    pub current_spent_daily: f64,
    /// Total spent this week.
    pub current_spent_weekly: f64,
    /// Total spent this month.
    pub current_spent_monthly: f64,
    /// Progress through the emphasised goal as a percentage. May exceed 100
    /// when overspending.
    pub progress_percent: f64,
    /// [GoalStatus::progress_percent] clamped to the 0 to 100 range.
    pub progress_bar_percent: f64,
}

impl From<RefreshedGoals> for GoalStatus {
    fn from(refreshed: RefreshedGoals) -> Self {
        let targets = goal_targets(refreshed.monthly_salary);
        let (spent_for_goal, target_for_goal) = match refreshed.goal_type {
            GoalType::Daily => (refreshed.spent.daily, targets.daily),
            GoalType::Weekly => (refreshed.spent.weekly, targets.weekly),
            GoalType::Monthly => (refreshed.spent.monthly, targets.monthly),
        };

        Self {
            monthly_salary: refreshed.monthly_salary,
            goal_type: refreshed.goal_type,
            goal_amount_daily: targets.daily,
            goal_amount_weekly: targets.weekly,
            goal_amount_monthly: targets.monthly,
            current_spent_daily: refreshed.spent.daily,
            current_spent_weekly: refreshed.spent.weekly,
            current_spent_monthly: refreshed.spent.monthly,
            progress_percent: progress_percent(spent_for_goal, target_for_goal),
            progress_bar_percent: clamped_progress_percent(spent_for_goal, target_for_goal),
        }
    }
}
