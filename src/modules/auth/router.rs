use axum::{
    Router, middleware,
    routing::{get, patch, post},
};

use super::controller::{change_password, get_me, login, logout, register, upgrade_to_seller};
use crate::middleware::policy::{AccessPolicy, enforce_policy};
use crate::state::AppState;

pub fn init_auth_router(state: &AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/", post(register))
        .route("/register", post(register))
        .route("/login", post(login));

    let authenticated = Router::new()
        .route("/logout", get(logout))
        .route("/me", get(get_me))
        .route("/upgrade-to-seller", patch(upgrade_to_seller))
        .route("/password", patch(change_password))
        .route_layer(middleware::from_fn_with_state(
            AccessPolicy::authenticated().bind(state.clone()),
            enforce_policy,
        ));

    public.merge(authenticated)
}
