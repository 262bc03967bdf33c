use axum::http::StatusCode;
use time::OffsetDateTime;
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginInput, RegisterInput},
        password::{hash_password, verify_password},
        tokens::{self, OneTimeToken},
    },
    email,
    error::AppError,
    i18n::{Lang, Msg},
    state::AppState,
    users::{
        repo::RepoError,
        repo_types::{NewUser, User},
    },
};

/// Creates an unverified account and mails its verification link.
#[instrument(skip(state, input), fields(email = %input.email))]
pub async fn register(state: &AppState, input: RegisterInput, lang: Lang) -> Result<User, AppError> {
    let conflict = || AppError::localized(StatusCode::CONFLICT, Msg::EmailAlreadyExists, lang);

    if state.users.find_by_email(&input.email).await?.is_some() {
        warn!("email already registered");
        return Err(conflict());
    }

    let password_hash = hash_password(&input.password)?;
    let code = OneTimeToken::generate();

    let user = state
        .users
        .create(NewUser {
            username: input.username,
            email: input.email,
            password_hash,
            verification_code: Some(code.digest),
        })
        .await
        .map_err(|e| match e {
            RepoError::EmailTaken => {
                warn!("email taken by a concurrent registration");
                conflict()
            }
            other => other.into(),
        })?;

    let url = format!("{}/verify-email/{}", state.config.client_url, code.raw);
    if let Err(e) = email::send_verification_code(state.mailer.as_ref(), &user, &url, lang).await {
        error!(error = %e, user_id = %user.id, "verification email failed");
        state.users.set_verification_code(user.id, None).await?;
        return Err(AppError::localized(
            StatusCode::INTERNAL_SERVER_ERROR,
            Msg::RegisterEmailFailed,
            lang,
        ));
    }

    info!(user_id = %user.id, "user registered");
    Ok(user)
}

/// Checks credentials and signs an access token for the account.
#[instrument(skip(state, input), fields(email = %input.email))]
pub async fn login(state: &AppState, input: LoginInput, lang: Lang) -> Result<String, AppError> {
    let invalid = || AppError::localized(StatusCode::BAD_REQUEST, Msg::InvalidCredentials, lang);

    let Some(user) = state.users.find_by_email(&input.email).await? else {
        warn!("login unknown email");
        return Err(invalid());
    };

    // Before the password check, so the answer doesn't reveal whether it matched.
    if !user.verified {
        warn!(user_id = %user.id, "login on unverified account");
        return Err(AppError::localized(
            StatusCode::UNAUTHORIZED,
            Msg::AccountNotVerified,
            lang,
        ));
    }

    if !verify_password(&input.password, &user.password)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(invalid());
    }

    let token = state.keys.sign_access(user.id)?;
    info!(user_id = %user.id, "user logged in");
    Ok(token)
}

#[instrument(skip_all)]
pub async fn verify_email(state: &AppState, raw_code: &str, lang: Lang) -> Result<(), AppError> {
    match state.users.verify_by_code(&tokens::digest(raw_code)).await? {
        Some(user) => {
            info!(user_id = %user.id, "email verified");
            Ok(())
        }
        None => {
            warn!("unknown or used verification code");
            Err(AppError::localized(
                StatusCode::UNAUTHORIZED,
                Msg::CouldNotVerifyEmail,
                lang,
            ))
        }
    }
}

/// Issues a reset link. Unknown addresses get the same answer as known ones.
#[instrument(skip(state))]
pub async fn forgot_password(state: &AppState, email_address: &str, lang: Lang) -> Result<(), AppError> {
    let Some(user) = state.users.find_by_email(email_address).await? else {
        info!("password reset requested for unknown email");
        return Ok(());
    };

    if !user.verified {
        return Err(AppError::localized(
            StatusCode::FORBIDDEN,
            Msg::ResetRequiresVerification,
            lang,
        ));
    }

    let token = OneTimeToken::generate();
    let expires_at = tokens::reset_expiry(OffsetDateTime::now_utc());
    state
        .users
        .set_password_reset(user.id, Some(&token.digest), Some(expires_at))
        .await?;

    let url = format!("{}/reset-password/{}", state.config.client_url, token.raw);
    if let Err(e) = email::send_password_reset_token(state.mailer.as_ref(), &user, &url, lang).await {
        error!(error = %e, user_id = %user.id, "password reset email failed");
        state.users.set_password_reset(user.id, None, None).await?;
        return Err(AppError::localized(
            StatusCode::INTERNAL_SERVER_ERROR,
            Msg::ResetEmailFailed,
            lang,
        ));
    }

    info!(user_id = %user.id, "password reset link issued");
    Ok(())
}

#[instrument(skip_all)]
pub async fn reset_password(
    state: &AppState,
    raw_token: &str,
    new_password: &str,
    lang: Lang,
) -> Result<(), AppError> {
    let password_hash = hash_password(new_password)?;
    let user = state
        .users
        .reset_password_by_token(&tokens::digest(raw_token), &password_hash, OffsetDateTime::now_utc())
        .await?;

    match user {
        Some(user) => {
            info!(user_id = %user.id, "password reset");
            Ok(())
        }
        None => {
            warn!("invalid or expired reset token");
            Err(AppError::localized(
                StatusCode::FORBIDDEN,
                Msg::ResetTokenInvalid,
                lang,
            ))
        }
    }
}
