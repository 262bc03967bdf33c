use axum::{extract::DefaultBodyLimit, Router};

use crate::state::AppState;

mod dto;
pub mod extractors;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod services;
pub mod tokens;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::auth_routes())
        .layer(DefaultBodyLimit::max(10 * 1024))
}
