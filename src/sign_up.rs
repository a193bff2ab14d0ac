//! The sign-up route for creating a new account.
use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::IntoResponse,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error, PasswordHash, ValidatedPassword,
    user::{NewUser, UserProfile, create_user},
};

/// The state needed for creating a new user.
#[derive(Debug, Clone)]
pub struct SignUpState {
    /// The database connection for creating users.
    db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for SignUpState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The data entered by the user when signing up.
#[derive(Serialize, Deserialize)]
pub struct SignUpData {
    /// The user's full name, e.g. "Jane Doe".
    pub full_name: String,
    /// The email to register the account under.
    pub email: String,
    /// The password to protect the account with.
    pub password: String,
    /// The password typed a second time, to catch typos.
    pub confirm_password: String,
}

/// Handler for creating a new account.
///
/// Responds with 201 CREATED and the new user's profile. The user still has
/// to log in afterwards, signing up does not start a session.
///
/// # Errors
///
/// This function returns:
/// - [Error::EmptyFullName] or [Error::EmptyEmail] if a text field is blank.
/// - [Error::TooWeak] if the password is too easy to guess.
/// - [Error::PasswordsDoNotMatch] if the confirmation password differs.
/// - [Error::DuplicateEmail] if the email is already registered.
pub async fn sign_up(
    State(state): State<SignUpState>,
    Json(user_data): Json<SignUpData>,
) -> Result<impl IntoResponse, Error> {
    if user_data.full_name.trim().is_empty() {
        return Err(Error::EmptyFullName);
    }

    if user_data.email.trim().is_empty() {
        return Err(Error::EmptyEmail);
    }

    let validated_password = ValidatedPassword::new(&user_data.password)?;

    if user_data.password != user_data.confirm_password {
        return Err(Error::PasswordsDoNotMatch);
    }

    let password_hash = PasswordHash::new(validated_password, PasswordHash::DEFAULT_COST)?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let user = create_user(
        NewUser {
            email: user_data.email.trim().to_owned(),
            full_name: user_data.full_name.trim().to_owned(),
            password_hash,
        },
        &connection,
    )?;

    Ok((StatusCode::CREATED, Json(UserProfile::from(&user))))
}
