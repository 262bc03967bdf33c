use axum::http::StatusCode;
use tracing::{error, info, instrument, warn};

use crate::{
    error::{AppError, FieldError},
    i18n::{Lang, Msg},
    state::AppState,
    users::{
        dto::{SessionData, UpdateUserRequest},
        repo_types::{User, UserInformations},
    },
    validation::{check_email, check_username},
};

pub fn session(user: Option<&User>) -> SessionData {
    SessionData {
        is_connect: user.is_some(),
        informations: user.map(UserInformations::from),
    }
}

/// Applies the profile form. Only the username is written; the email must be
/// present and well-formed but is not changed here.
#[instrument(skip(state, user, req), fields(user_id = %user.id))]
pub async fn update_profile(
    state: &AppState,
    user: &User,
    req: UpdateUserRequest,
    lang: Lang,
) -> Result<User, AppError> {
    let username = req.username.map(|u| u.trim().to_string()).unwrap_or_default();
    let email = req.email.map(|e| e.trim().to_lowercase()).unwrap_or_default();
    if username.is_empty() || email.is_empty() {
        warn!("profile update without username or email");
        return Err(AppError::localized(
            StatusCode::BAD_REQUEST,
            Msg::ProfileFieldsRequired,
            lang,
        ));
    }

    let mut errors: Vec<FieldError> = Vec::new();
    check_username(&username, &mut errors);
    check_email(&email, &mut errors);
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let failed = || AppError::localized(StatusCode::BAD_REQUEST, Msg::ProfileUpdateFailed, lang);
    match state.users.update_username(user.id, &username).await {
        Ok(Some(updated)) => {
            info!("profile updated");
            Ok(updated)
        }
        Ok(None) => Err(failed()),
        Err(e) => {
            error!(error = %e, "profile update failed");
            Err(failed())
        }
    }
}
