//! Pure calendar-window and goal-threshold arithmetic.
//!
//! Spending windows are calendar based: the daily window is a single local
//! date, the weekly window runs Sunday through Saturday, and the monthly
//! window is a calendar month. Only expenses count towards spending, and a
//! transaction counts towards every window that contains its date.

use time::{Date, Duration};

use crate::{
    balance::BALANCE_TOP_UP_CATEGORY,
    transaction::{Transaction, TransactionKind},
};

/// An inclusive range of dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowRange {
    /// The first date inside the window.
    pub start: Date,
    /// The last date inside the window.
    pub end: Date,
}

impl WindowRange {
    /// Whether `date` falls inside the window.
    pub fn contains(&self, date: Date) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Get the Sunday to Saturday week that contains `anchor_date`.
pub fn week_bounds(anchor_date: Date) -> WindowRange {
    let days_from_sunday = anchor_date.weekday().number_days_from_sunday() as i64;
    let start = anchor_date - Duration::days(days_from_sunday);
    let end = start + Duration::days(6);

    WindowRange { start, end }
}

fn in_same_month(date: Date, other: Date) -> bool {
    date.year() == other.year() && date.month() == other.month()
}

/// The total amount spent in each goal window.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SpentTotals {
    /// Total spent on the anchor date.
    pub daily: f64,
    /// Total spent in the week containing the anchor date.
    pub weekly: f64,
    /// Total spent in the month containing the anchor date.
    pub monthly: f64,
}

/// Sum the expenses in `transactions` that fall in the daily, weekly and
/// monthly windows anchored at `today`.
pub fn spent_totals(transactions: &[Transaction], today: Date) -> SpentTotals {
    let week = week_bounds(today);
    let mut totals = SpentTotals::default();

    for transaction in transactions {
        if transaction.kind != TransactionKind::Expense {
            continue;
        }

        if transaction.date == today {
            totals.daily += transaction.amount;
        }

        if week.contains(transaction.date) {
            totals.weekly += transaction.amount;
        }

        if in_same_month(transaction.date, today) {
            totals.monthly += transaction.amount;
        }
    }

    totals
}

/// The spending limits for each goal window, derived from the monthly salary.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GoalTargets {
    /// The daily spending limit, a thirtieth of the monthly salary.
    pub daily: f64,
    /// The weekly spending limit, a quarter of the monthly salary.
    pub weekly: f64,
    /// The monthly spending limit, the monthly salary itself.
    pub monthly: f64,
}

/// Derive the spending limits for each goal window from `monthly_salary`.
///
/// A missing or non-positive salary produces all-zero targets, which clients
/// should read as "no goal set".
pub fn goal_targets(monthly_salary: Option<f64>) -> GoalTargets {
    match monthly_salary {
        Some(salary) if salary > 0.0 => GoalTargets {
            daily: salary / 30.0,
            weekly: salary / 4.0,
            monthly: salary,
        },
        _ => GoalTargets::default(),
    }
}

/// How far through `target` the amount `spent` is, as a percentage.
///
/// Overspending reports more than 100. A target of zero means no goal is
/// set and reports zero progress.
pub fn progress_percent(spent: f64, target: f64) -> f64 {
    if target > 0.0 {
        spent / target * 100.0
    } else {
        0.0
    }
}

/// [progress_percent] clamped to the 0 to 100 range, for rendering progress
/// bars.
pub fn clamped_progress_percent(spent: f64, target: f64) -> f64 {
    progress_percent(spent, target).clamp(0.0, 100.0)
}

/// A month's total earnings and expenses.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MonthTotals {
    /// The sum of income amounts, excluding balance top-ups.
    pub earnings: f64,
    /// The sum of expense amounts.
    pub expenses: f64,
}

/// Sum the incomes and expenses in `transactions` dated in the month that
/// contains `today`.
///
/// Income recorded by a balance top-up is not counted as earnings.
pub fn month_totals(transactions: &[Transaction], today: Date) -> MonthTotals {
    let mut totals = MonthTotals::default();

    for transaction in transactions {
        if !in_same_month(transaction.date, today) {
            continue;
        }

        match transaction.kind {
            TransactionKind::Income if transaction.category != BALANCE_TOP_UP_CATEGORY => {
                totals.earnings += transaction.amount;
            }
            TransactionKind::Income => {}
            TransactionKind::Expense => totals.expenses += transaction.amount,
        }
    }

    totals
}
