//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Json, Router,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use serde_json::{Value, json};

use crate::{
    AppState, Error,
    auth::auth_guard,
    balance::add_balance_endpoint,
    endpoints,
    goal::{get_goals_endpoint, update_goals_endpoint},
    log_in::post_log_in,
    log_out::post_log_out,
    sign_up::sign_up,
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, list_transactions_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::ROOT, get(get_service_info))
        .route(endpoints::COFFEE, get(get_coffee))
        .route(endpoints::SIGN_UP, post(sign_up))
        .route(endpoints::LOG_IN, post(post_log_in))
        .route(endpoints::LOG_OUT, post(post_log_out));

    let protected_routes = Router::new()
        .route(
            endpoints::TRANSACTIONS,
            get(list_transactions_endpoint).post(create_transaction_endpoint),
        )
        .route(endpoints::TRANSACTION, delete(delete_transaction_endpoint))
        .route(endpoints::BALANCE, put(add_balance_endpoint))
        .route(
            endpoints::GOALS,
            get(get_goals_endpoint).post(update_goals_endpoint),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .with_state(state)
}

/// Attempt to get a cup of coffee from the server.
async fn get_coffee() -> Response {
    (
        StatusCode::IM_A_TEAPOT,
        Json(json!({"error": "I'm a teapot"})),
    )
        .into_response()
}

/// The root path reports the service name and version, mostly as a cheap
/// liveness check.
async fn get_service_info() -> Json<Value> {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn get_404_not_found() -> Response {
    Error::NotFound.into_response()
}
