//! Transactional email: verification codes and password reset links.

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, instrument};

use crate::{
    i18n::{Lang, Msg},
    users::repo_types::User,
};

#[cfg(test)]
pub mod fake;
pub mod smtp;
mod templates;

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("address error: {0}")]
    Address(String),

    #[error("message building error: {0}")]
    Message(String),

    #[error("SMTP error: {0}")]
    Smtp(String),
}

/// A rendered email, ready for the transport.
#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn deliver(&self, message: EmailMessage) -> Result<(), EmailError>;
}

/// Greeting name: the first word of the username.
fn first_name(username: &str) -> &str {
    username.split_whitespace().next().unwrap_or(username)
}

fn compose(user: &User, url: &str, lang: Lang, kind: templates::Kind) -> EmailMessage {
    let subject = match kind {
        templates::Kind::VerificationCode => Msg::VerificationSubject,
        templates::Kind::PasswordReset => Msg::ResetSubject,
    }
    .text(lang);
    let (html_body, text_body) = templates::render(kind, lang, first_name(&user.username), subject, url);
    EmailMessage {
        to: user.email.clone(),
        subject: subject.to_string(),
        text_body,
        html_body,
    }
}

#[instrument(skip(transport, user, url), fields(user_id = %user.id))]
pub async fn send_verification_code(
    transport: &dyn MailTransport,
    user: &User,
    url: &str,
    lang: Lang,
) -> Result<(), EmailError> {
    transport
        .deliver(compose(user, url, lang, templates::Kind::VerificationCode))
        .await?;
    info!("verification email sent");
    Ok(())
}

#[instrument(skip(transport, user, url), fields(user_id = %user.id))]
pub async fn send_password_reset_token(
    transport: &dyn MailTransport,
    user: &User,
    url: &str,
    lang: Lang,
) -> Result<(), EmailError> {
    transport
        .deliver(compose(user, url, lang, templates::Kind::PasswordReset))
        .await?;
    info!("password reset email sent");
    Ok(())
}
