use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::instrument;

use crate::{
    auth::extractors::{AuthUser, MaybeAuthUser},
    error::AppError,
    i18n::Lang,
    state::AppState,
    users::{
        dto::{DataResponse, SessionData, UpdateUserRequest, UserData},
        services,
    },
    validation::json_rejection,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(get_user))
        .route("/users/profile", get(get_user))
        .route("/users/me", get(get_me))
        .route("/users/update", post(update_user))
}

#[instrument(skip_all)]
pub async fn get_user(AuthUser(user): AuthUser) -> Json<DataResponse<UserData>> {
    Json(DataResponse::success(UserData { user: user.into() }))
}

/// Session summary for the navigation bar; anonymous callers get
/// `isConnect: false`.
#[instrument(skip_all)]
pub async fn get_me(MaybeAuthUser(user): MaybeAuthUser) -> Json<DataResponse<SessionData>> {
    Json(DataResponse::success(services::session(user.as_ref())))
}

#[instrument(skip_all)]
pub async fn update_user(
    State(state): State<AppState>,
    lang: Lang,
    AuthUser(user): AuthUser,
    body: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(req) = body.map_err(json_rejection)?;
    services::update_profile(&state, &user, req, lang).await?;
    Ok(Json(json!({ "status": "success" })))
}
