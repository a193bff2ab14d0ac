//! This file defines the route for handling log-in requests.
//! The auth module handles the lower level cookie auth logic.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{
    AppState, Error,
    auth::set_auth_cookie,
    user::{UserProfile, get_user_by_email},
};

/// How long the auth cookie should last if the user selects "remember me" at log-in.
const REMEMBER_ME_COOKIE_DURATION: Duration = Duration::days(7);

/// The state needed to perform a login.
#[derive(Clone)]
pub struct LogInState {
    /// The key to be used for signing and encrypting private cookies.
    cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    cookie_duration: Duration,
    /// The database connection for looking up users.
    db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LogInState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<LogInState> for Key {
    fn from_ref(state: &LogInState) -> Self {
        state.cookie_key.clone()
    }
}

/// The raw data entered by the user in the log-in form.
///
/// The email and password are stored as plain strings. There is no need for validation here since
/// they will be compared against the email and password in the database, which have been verified.
#[derive(Clone, Serialize, Deserialize)]
pub struct LogInData {
    /// Email entered during log-in.
    pub email: String,
    /// Password entered during log-in.
    pub password: String,
    /// Whether to extend the initial auth cookie duration.
    #[serde(default)]
    pub remember_me: bool,
}

/// Handler for log-in requests via the POST method.
///
/// On a successful log-in request the auth cookie is set and the response
/// contains the user's profile, so the client can greet the user without a
/// second request.
///
/// # Errors
///
/// This function returns an [Error::InvalidCredentials] if the email does
/// not belong to a registered user or the password is wrong. The two cases
/// are not distinguished in the response.
pub async fn post_log_in(
    State(state): State<LogInState>,
    jar: PrivateCookieJar,
    Json(user_data): Json<LogInData>,
) -> Result<(PrivateCookieJar, Json<UserProfile>), Error> {
    let user = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        get_user_by_email(&user_data.email, &connection).map_err(|error| match error {
            Error::NotFound => Error::InvalidCredentials,
            other => other,
        })?
    };

    let is_password_valid = user
        .password_hash
        .verify(&user_data.password)
        .map_err(|error| {
            tracing::error!("Unhandled error while verifying credentials: {error}");
            Error::HashingError(error.to_string())
        })?;

    if !is_password_valid {
        return Err(Error::InvalidCredentials);
    }

    let cookie_duration = if user_data.remember_me {
        REMEMBER_ME_COOKIE_DURATION
    } else {
        state.cookie_duration
    };

    let jar = set_auth_cookie(jar, user.id, cookie_duration)?;

    Ok((jar, Json(UserProfile::from(&user))))
}

#[cfg(test)]
mod log_in_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Router, routing::post};
    use axum_extra::extract::cookie::Key;
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::json;
    use sha2::{Digest, Sha512};
    use time::{Duration, OffsetDateTime};

    use crate::{
        PasswordHash,
        auth::{COOKIE_TOKEN, DEFAULT_COOKIE_DURATION},
        db::initialize,
        endpoints,
        user::{NewUser, create_user},
    };

    use super::{LogInState, post_log_in};

    const TEST_EMAIL: &str = "foo@bar.baz";
    const TEST_PASSWORD: &str = "geeseflysouthforwinter";

    fn get_test_server() -> TestServer {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        create_user(
            NewUser {
                email: TEST_EMAIL.to_owned(),
                full_name: "Foo Bar".to_owned(),
                password_hash: PasswordHash::from_raw_password(TEST_PASSWORD, 4).unwrap(),
            },
            &conn,
        )
        .unwrap();

        let state = LogInState {
            cookie_key: Key::from(&Sha512::digest(b"foobar")),
            cookie_duration: DEFAULT_COOKIE_DURATION,
            db_connection: Arc::new(Mutex::new(conn)),
        };

        let app = Router::new()
            .route(endpoints::LOG_IN, post(post_log_in))
            .with_state(state);

        TestServer::new(app).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn log_in_succeeds_with_valid_credentials() {
        let server = get_test_server();

        let response = server
            .post(endpoints::LOG_IN)
            .json(&json!({"email": TEST_EMAIL, "password": TEST_PASSWORD}))
            .await;

        response.assert_status_ok();
        response.assert_json(&json!({
            "email": TEST_EMAIL,
            "full_name": "Foo Bar",
            "first_name": "Foo",
            "balance": 0.0,
        }));

        let cookie = response.cookie(COOKIE_TOKEN);
        let expiry = cookie.expires_datetime().unwrap();
        assert!(
            (expiry - (OffsetDateTime::now_utc() + Duration::minutes(5))).abs()
                < Duration::seconds(5)
        );
    }

    #[tokio::test]
    async fn log_in_with_remember_me_sets_long_lived_cookie() {
        let server = get_test_server();

        let response = server
            .post(endpoints::LOG_IN)
            .json(&json!({
                "email": TEST_EMAIL,
                "password": TEST_PASSWORD,
                "remember_me": true,
            }))
            .await;

        response.assert_status_ok();
        let cookie = response.cookie(COOKIE_TOKEN);
        let expiry = cookie.expires_datetime().unwrap();
        assert!(
            (expiry - (OffsetDateTime::now_utc() + Duration::days(7))).abs()
                < Duration::seconds(5)
        );
    }

    #[tokio::test]
    async fn log_in_fails_with_wrong_password() {
        let server = get_test_server();

        let response = server
            .post(endpoints::LOG_IN)
            .json(&json!({"email": TEST_EMAIL, "password": "wrongpassword123"}))
            .await;

        response.assert_status_unauthorized();
        response.assert_json(&json!({"error": "Incorrect email or password."}));
    }

    #[tokio::test]
    async fn log_in_fails_with_unknown_email() {
        let server = get_test_server();

        let response = server
            .post(endpoints::LOG_IN)
            .json(&json!({"email": "nobody@bar.baz", "password": TEST_PASSWORD}))
            .await;

        response.assert_status_unauthorized();
        response.assert_json(&json!({"error": "Incorrect email or password."}));
    }
}
