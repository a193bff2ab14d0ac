//! Code for creating the user table and fetching user accounts from the
//! database.
//!
//! Besides their credentials, users carry the running balance and the cached
//! spending-goal state that the goal routes maintain.

use std::fmt::Display;

use rusqlite::{
    Connection, Row,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{Error, PasswordHash};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// The goal period a user has chosen to emphasise when reviewing their
/// spending.
///
/// This only affects how goal progress is reported, the spending totals for
/// all three periods are always maintained.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalType {
    /// Report progress against the daily spending goal.
    Daily,
    /// Report progress against the weekly spending goal.
    Weekly,
    /// Report progress against the monthly spending goal.
    #[default]
    Monthly,
}

impl GoalType {
    /// The string stored in the database for the goal type.
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalType::Daily => "daily",
            GoalType::Weekly => "weekly",
            GoalType::Monthly => "monthly",
        }
    }
}

impl FromSql for GoalType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "daily" => Ok(GoalType::Daily),
            "weekly" => Ok(GoalType::Weekly),
            "monthly" => Ok(GoalType::Monthly),
            other => Err(FromSqlError::Other(
                format!("{other} is not a valid goal type").into(),
            )),
        }
    }
}

impl ToSql for GoalType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

/// A user of the application.
///
/// The spent totals and reset dates are caches that are maintained by the
/// goal routes, the ledger remains the source of truth for how much was
/// actually spent.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The email address the user signs in with. Unique across users.
    pub email: String,
    /// The user's full name as given during sign-up.
    pub full_name: String,
    /// The user's password hash.
    pub password_hash: PasswordHash,
    /// The user's current balance, the net sum of their ledger.
    pub balance: f64,
    /// The user's monthly salary, from which the spending goals are derived.
    /// `None` until the user sets a goal.
    pub monthly_salary: Option<f64>,
    /// The goal period the user chose to emphasise.
    pub goal_type: GoalType,
    /// Cached total spent on the day of the last refresh.
    pub spent_daily: f64,
    /// Cached total spent in the week of the last refresh.
    pub spent_weekly: f64,
    /// Cached total spent in the month of the last refresh.
    pub spent_monthly: f64,
    /// The day the daily spending total was last reset.
    pub last_daily_reset: Option<Date>,
    /// The start of the week (Sunday) the weekly spending total was last
    /// reset for.
    pub last_weekly_reset: Option<Date>,
}

/// The details needed to register a new user.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    /// The email address the user will sign in with.
    pub email: String,
    /// The user's full name.
    pub full_name: String,
    /// The hash of the user's password.
    pub password_hash: PasswordHash,
}

/// The subset of the user account that is safe to send to the client.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserProfile {
    /// The email address the user signs in with.
    pub email: String,
    /// The user's full name.
    pub full_name: String,
    /// The first word of the user's full name, used for greetings.
    pub first_name: String,
    /// The user's current balance.
    pub balance: f64,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        let first_name = user
            .full_name
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_owned();

        Self {
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            first_name,
            balance: user.balance,
        }
    }
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email TEXT UNIQUE NOT NULL,
                full_name TEXT NOT NULL,
                password TEXT NOT NULL,
                balance REAL NOT NULL DEFAULT 0,
                monthly_salary REAL,
                goal_type TEXT NOT NULL DEFAULT 'monthly',
                spent_daily REAL NOT NULL DEFAULT 0,
                spent_weekly REAL NOT NULL DEFAULT 0,
                spent_monthly REAL NOT NULL DEFAULT 0,
                last_daily_reset TEXT,
                last_weekly_reset TEXT
                )",
        (),
    )?;

    Ok(())
}

/// Create and insert a new user into the database.
///
/// The new user starts with a zero balance, no monthly salary and the default
/// goal type.
///
/// # Errors
///
/// This function will return an error if:
/// - `new_user.email` already belongs to a registered user
///   ([Error::DuplicateEmail]).
/// - an SQL related error occurred ([Error::SqlError]).
pub fn create_user(new_user: NewUser, connection: &Connection) -> Result<User, Error> {
    connection.execute(
        "INSERT INTO user (email, full_name, password) VALUES (?1, ?2, ?3)",
        (
            &new_user.email,
            &new_user.full_name,
            new_user.password_hash.as_ref(),
        ),
    )?;

    let id = UserID::new(connection.last_insert_rowid());

    Ok(User {
        id,
        email: new_user.email,
        full_name: new_user.full_name,
        password_hash: new_user.password_hash,
        balance: 0.0,
        monthly_salary: None,
        goal_type: GoalType::default(),
        spent_daily: 0.0,
        spent_weekly: 0.0,
        spent_monthly: 0.0,
        last_daily_reset: None,
        last_weekly_reset: None,
    })
}

const USER_COLUMNS: &str = "id, email, full_name, password, balance, monthly_salary, goal_type, \
    spent_daily, spent_weekly, spent_monthly, last_daily_reset, last_weekly_reset";

fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_password_hash: String = row.get("password")?;

    Ok(User {
        id: UserID::new(row.get("id")?),
        email: row.get("email")?,
        full_name: row.get("full_name")?,
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
        balance: row.get("balance")?,
        monthly_salary: row.get("monthly_salary")?,
        goal_type: row.get("goal_type")?,
        spent_daily: row.get("spent_daily")?,
        spent_weekly: row.get("spent_weekly")?,
        spent_monthly: row.get("spent_monthly")?,
        last_daily_reset: row.get("last_daily_reset")?,
        last_weekly_reset: row.get("last_weekly_reset")?,
    })
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user.
/// - there was an error trying to access the database.
pub fn get_user_by_id(user_id: UserID, db_connection: &Connection) -> Result<User, Error> {
    db_connection
        .prepare(&format!("SELECT {USER_COLUMNS} FROM user WHERE id = :id"))?
        .query_row(&[(":id", &user_id.as_i64())], map_user_row)
        .map_err(|error| error.into())
}

/// Get the user from the database with an email equal to `email`.
///
/// # Errors
///
/// This function will return an error if:
/// - `email` does not belong to a registered user.
/// - there was an error trying to access the database.
pub fn get_user_by_email(email: &str, db_connection: &Connection) -> Result<User, Error> {
    db_connection
        .prepare(&format!("SELECT {USER_COLUMNS} FROM user WHERE email = :email"))?
        .query_row(&[(":email", &email)], map_user_row)
        .map_err(|error| error.into())
}

#[cfg(test)]
mod user_tests {
    use rusqlite::Connection;

    use crate::{
        PasswordHash,
        user::{GoalType, NewUser, UserID, UserProfile, create_user, get_user_by_email, get_user_by_id},
    };

    use super::{Error, create_user_table};

    fn get_db_connection() -> Connection {
        let conn =
            Connection::open_in_memory().expect("Could not create in-memory SQLite database");
        create_user_table(&conn).expect("Could not create user table");

        conn
    }

    fn new_test_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_owned(),
            full_name: "Ambrose Burnside".to_owned(),
            password_hash: PasswordHash::new_unchecked("hunter2"),
        }
    }

    #[test]
    fn insert_user_succeeds() {
        let db_connection = get_db_connection();

        let inserted_user = create_user(new_test_user("foo@bar.baz"), &db_connection).unwrap();

        assert!(inserted_user.id.as_i64() > 0);
        assert_eq!(inserted_user.email, "foo@bar.baz");
        assert_eq!(inserted_user.full_name, "Ambrose Burnside");
        assert_eq!(inserted_user.balance, 0.0);
        assert_eq!(inserted_user.monthly_salary, None);
        assert_eq!(inserted_user.goal_type, GoalType::Monthly);
        assert_eq!(inserted_user.last_daily_reset, None);
        assert_eq!(inserted_user.last_weekly_reset, None);
    }

    #[test]
    fn insert_user_fails_with_duplicate_email() {
        let db_connection = get_db_connection();
        create_user(new_test_user("foo@bar.baz"), &db_connection).unwrap();

        let duplicate_user = create_user(new_test_user("foo@bar.baz"), &db_connection);

        assert_eq!(duplicate_user, Err(Error::DuplicateEmail));
    }

    #[test]
    fn get_user_fails_with_non_existent_id() {
        let db_connection = get_db_connection();

        let id = UserID::new(42);

        assert_eq!(get_user_by_id(id, &db_connection), Err(Error::NotFound));
    }

    #[test]
    fn get_user_succeeds_with_existing_id() {
        let db_connection = get_db_connection();
        let test_user = create_user(new_test_user("foo@bar.baz"), &db_connection).unwrap();

        let retrieved_user = get_user_by_id(test_user.id, &db_connection).unwrap();

        assert_eq!(retrieved_user, test_user);
    }

    #[test]
    fn get_user_succeeds_with_existing_email() {
        let db_connection = get_db_connection();
        let test_user = create_user(new_test_user("foo@bar.baz"), &db_connection).unwrap();

        let retrieved_user = get_user_by_email("foo@bar.baz", &db_connection).unwrap();

        assert_eq!(retrieved_user, test_user);
    }

    #[test]
    fn get_user_fails_with_unknown_email() {
        let db_connection = get_db_connection();
        create_user(new_test_user("foo@bar.baz"), &db_connection).unwrap();

        let retrieved_user = get_user_by_email("qux@bar.baz", &db_connection);

        assert_eq!(retrieved_user, Err(Error::NotFound));
    }

    #[test]
    fn profile_takes_first_name_from_full_name() {
        let db_connection = get_db_connection();
        let test_user = create_user(new_test_user("foo@bar.baz"), &db_connection).unwrap();

        let profile = UserProfile::from(&test_user);

        assert_eq!(profile.first_name, "Ambrose");
        assert_eq!(profile.full_name, "Ambrose Burnside");
        assert_eq!(profile.balance, 0.0);
    }

    #[test]
    fn profile_handles_single_word_name() {
        let user = crate::user::User {
            full_name: "Cher".to_owned(),
            ..create_user(new_test_user("foo@bar.baz"), &get_db_connection()).unwrap()
        };

        assert_eq!(UserProfile::from(&user).first_name, "Cher");
    }
}
