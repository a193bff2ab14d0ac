//! Spend goals for the budgeting application.
//!
//! A goal is a monthly salary split into daily, weekly and monthly spending
//! targets. The user's spending is tracked against each target in cached
//! buckets that roll over when the calendar day or week changes.

mod core;
mod evaluator;
mod rollover;
mod status_endpoint;
mod update_endpoint;

pub use core::{GoalStatus, RefreshedGoals, refresh_goal_state};
pub use evaluator::{MonthTotals, SpentTotals, month_totals};
pub use status_endpoint::get_goals_endpoint;
pub use update_endpoint::update_goals_endpoint;
