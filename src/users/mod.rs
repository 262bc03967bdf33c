use axum::{extract::DefaultBodyLimit, Router};

use crate::state::AppState;

mod dto;
pub mod handlers;
#[cfg(test)]
pub mod memory;
pub mod repo;
pub mod repo_types;
mod services;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::user_routes())
        .layer(DefaultBodyLimit::max(10 * 1024))
}
