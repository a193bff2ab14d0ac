//! Carteira is a web app for tracking day-to-day spending against a monthly
//! pay cheque.
//!
//! This library provides a JSON REST API over a SQLite database. Each account
//! keeps a running balance, a ledger of income and expense transactions, and
//! spending goals that are derived from the account's monthly salary and
//! recalculated as the ledger changes.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{Json, http::StatusCode, response::IntoResponse};
use axum_server::Handle;
use serde::Serialize;
use time::Date;
use tokio::signal;

mod app_state;
mod auth;
mod balance;
mod clock;
mod db;
mod endpoints;
mod goal;
mod log_in;
mod log_out;
mod logging;
mod password;
mod routing;
mod sign_up;
pub mod transaction;
pub mod user;

pub use app_state::AppState;
pub use balance::credit_balance;
pub use db::initialize as initialize_db;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use password::{PasswordHash, ValidatedPassword};
pub use routing::build_router;

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The email and password combination did not match a registered user,
    /// or the session token in the request could not be trusted.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The session token cookie is missing from the cookie jar in the request.
    #[error("no session cookie in the cookie jar")]
    CookieMissing,

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// The password and the confirmation password did not match during sign-up.
    #[error("the passwords do not match")]
    PasswordsDoNotMatch,

    /// The email used to sign up already belongs to a registered user.
    #[error("the email address is already in use")]
    DuplicateEmail,

    /// An empty string was used as a full name during sign-up.
    #[error("Full name cannot be empty")]
    EmptyFullName,

    /// An empty string was used as an email address during sign-up.
    #[error("Email cannot be empty")]
    EmptyEmail,

    /// An empty string was used as a transaction description.
    #[error("Description cannot be empty")]
    EmptyDescription,

    /// An empty string was used as a transaction category.
    #[error("Category cannot be empty")]
    EmptyCategory,

    /// A money amount was zero, negative or not a finite number.
    #[error("{0} is not a valid amount, amounts must be positive")]
    InvalidAmount(f64),

    /// A date in a month after the current one was used to create a transaction.
    ///
    /// The ledger only accepts transactions for the month that is underway.
    #[error("{0} is a date in a future month, which is not allowed")]
    DateInFutureMonth(Date),

    /// A date in a month before the current one was used to create a transaction.
    ///
    /// Past months are considered closed and can no longer be changed.
    #[error("{0} is a date in a past month, which is not allowed")]
    DateInPastMonth(Date),

    /// The monthly salary was zero, negative or not a finite number.
    #[error("{0} is not a valid monthly salary, salaries must be positive")]
    InvalidSalary(f64),

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// Tried to delete a transaction that does not exist or that belongs to
    /// another user.
    #[error("tried to delete a transaction that is not in the database")]
    DeleteMissingTransaction,

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// An error occurred while serializing a struct as JSON
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("user.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

/// The JSON body sent to the client when a request fails.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let (status_code, error) = match self {
            Error::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "Incorrect email or password.".to_owned(),
            ),
            Error::CookieMissing => (
                StatusCode::UNAUTHORIZED,
                "You must be logged in to do that.".to_owned(),
            ),
            Error::TooWeak(feedback) => (
                StatusCode::BAD_REQUEST,
                format!("The password is too weak: {feedback}"),
            ),
            Error::PasswordsDoNotMatch => (
                StatusCode::BAD_REQUEST,
                "The passwords do not match.".to_owned(),
            ),
            Error::DuplicateEmail => (
                StatusCode::BAD_REQUEST,
                "An account with this email already exists.".to_owned(),
            ),
            Error::EmptyFullName => (
                StatusCode::BAD_REQUEST,
                "Full name cannot be empty.".to_owned(),
            ),
            Error::EmptyEmail => (StatusCode::BAD_REQUEST, "Email cannot be empty.".to_owned()),
            Error::EmptyDescription => (
                StatusCode::BAD_REQUEST,
                "Description cannot be empty.".to_owned(),
            ),
            Error::EmptyCategory => (
                StatusCode::BAD_REQUEST,
                "Category cannot be empty.".to_owned(),
            ),
            Error::InvalidAmount(amount) => (
                StatusCode::BAD_REQUEST,
                format!("The amount must be a positive number, got {amount}."),
            ),
            Error::DateInFutureMonth(date) => (
                StatusCode::BAD_REQUEST,
                format!(
                    "{date} is in a future month. \
                    Transactions can only be added to the current month."
                ),
            ),
            Error::DateInPastMonth(date) => (
                StatusCode::BAD_REQUEST,
                format!(
                    "{date} is in a past month. \
                    Past months are closed and can no longer be changed."
                ),
            ),
            Error::InvalidSalary(salary) => (
                StatusCode::BAD_REQUEST,
                format!("The monthly salary must be a positive number, got {salary}."),
            ),
            Error::NotFound => (
                StatusCode::NOT_FOUND,
                "The requested resource could not be found.".to_owned(),
            ),
            Error::DeleteMissingTransaction => (
                StatusCode::NOT_FOUND,
                "The transaction could not be found. \
                It may have already been deleted."
                    .to_owned(),
            ),
            // Any errors that are not handled above are not intended to be
            // shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);

                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected error occurred, check the server logs for more details."
                        .to_owned(),
                )
            }
        };

        (status_code, Json(ErrorBody { error })).into_response()
    }
}
