use std::convert::Infallible;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::ACCEPT_LANGUAGE, request::Parts, HeaderMap},
};
use serde::Serialize;

/// Response language negotiated per request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    #[default]
    Fr,
    En,
}

impl Lang {
    pub const SUPPORTED: [Lang; 2] = [Lang::Fr, Lang::En];

    pub fn as_str(self) -> &'static str {
        match self {
            Lang::Fr => "fr",
            Lang::En => "en",
        }
    }

    pub fn from_headers(headers: &HeaderMap) -> Lang {
        negotiate(headers.get(ACCEPT_LANGUAGE).and_then(|v| v.to_str().ok()))
    }

    /// Matches a BCP 47 tag on its primary subtag (`en-US` -> `en`).
    pub fn from_tag(tag: &str) -> Option<Lang> {
        let primary = tag.split('-').next()?.trim();
        Lang::SUPPORTED
            .into_iter()
            .find(|l| primary.eq_ignore_ascii_case(l.as_str()))
    }
}

/// Tags of an Accept-Language header, highest quality first.
/// Entries with `q=0` are dropped; equal weights keep header order.
pub fn parse_accept_language(header: &str) -> Vec<String> {
    let mut entries: Vec<(String, f32)> = header
        .split(',')
        .filter_map(|entry| {
            let mut parts = entry.split(';');
            let tag = parts.next()?.trim();
            if tag.is_empty() {
                return None;
            }
            let q = parts
                .filter_map(|p| p.trim().strip_prefix("q="))
                .find_map(|v| v.trim().parse::<f32>().ok())
                .unwrap_or(1.0);
            (q > 0.0).then(|| (tag.to_ascii_lowercase(), q))
        })
        .collect();
    entries.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    entries.into_iter().map(|(tag, _)| tag).collect()
}

/// First supported language the client accepts, if any. A wildcard accepts
/// the default.
pub fn best_match(header: &str) -> Option<Lang> {
    parse_accept_language(header).iter().find_map(|tag| {
        if tag == "*" {
            Some(Lang::default())
        } else {
            Lang::from_tag(tag)
        }
    })
}

pub fn negotiate(header: Option<&str>) -> Lang {
    header.and_then(best_match).unwrap_or_default()
}

#[async_trait]
impl<S> FromRequestParts<S> for Lang
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Lang::from_headers(&parts.headers))
    }
}

/// User-facing messages, each available in every supported language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Msg {
    VerificationEmailSent,
    RegisterEmailFailed,
    EmailAlreadyExists,
    InvalidCredentials,
    AccountNotVerified,
    CouldNotVerifyEmail,
    EmailVerified,
    ResetLinkSent,
    ResetRequiresVerification,
    ResetEmailFailed,
    ResetTokenInvalid,
    PasswordResetDone,
    NotLoggedIn,
    InvalidToken,
    SessionExpired,
    ProfileFieldsRequired,
    ProfileUpdateFailed,
    FileTooLarge,
    NoFileUploaded,
    UploadFailed,
    FileUploaded,
    VerificationSubject,
    ResetSubject,
}

impl Msg {
    pub fn text(self, lang: Lang) -> &'static str {
        let (fr, en) = match self {
            Msg::VerificationEmailSent => (
                "Un email avec un code de vérification a été envoyé à votre email",
                "An email with a verification code has been sent to your email",
            ),
            Msg::RegisterEmailFailed => (
                "Erreur lors de l'envoi de l'email, veuillez réessayer.",
                "There was an error sending email, please try again",
            ),
            Msg::EmailAlreadyExists => (
                "Cet email existe déjà, veuillez utiliser une autre adresse email",
                "Email already exist, please use another email address",
            ),
            Msg::InvalidCredentials => (
                "Email ou mot de passe invalide.",
                "Invalid email or password.",
            ),
            Msg::AccountNotVerified => (
                "Votre compte n'est pas vérifié, veuillez vérifier vos e-mails pour vous connecter.",
                "You are not verified, please verify your email to login.",
            ),
            Msg::CouldNotVerifyEmail => (
                "Impossible de vérifier votre email.",
                "Could not verify email.",
            ),
            Msg::EmailVerified => ("Email vérifié avec succès", "Email verified successfully"),
            Msg::ResetLinkSent => (
                "Nous avons envoyé un email avec un lien pour réinitialiser votre mot de passe. Veuillez vérifier votre email.",
                "We have sent an email with a link to reset your password. Please check your email.",
            ),
            Msg::ResetRequiresVerification => (
                "Vous ne pouvez pas réinitialiser votre mot de passe tant que votre compte n'est pas vérifié.",
                "You can't reset password until you verify your email.",
            ),
            Msg::ResetEmailFailed => (
                "Erreur lors de l'envoi de l'email.",
                "There was an error sending email.",
            ),
            Msg::ResetTokenInvalid => (
                "Le token est invalide ou a expiré.",
                "The token has expired or is invalid.",
            ),
            Msg::PasswordResetDone => (
                "Réinitialisation du mot de passe réussie",
                "Password reset successfully",
            ),
            Msg::NotLoggedIn => ("Vous n'êtes pas connecté.", "You are not logged in."),
            Msg::InvalidToken => (
                "Token invalide ou utilisateur inexistant.",
                "Invalid token or user doesn't exist.",
            ),
            Msg::SessionExpired => (
                "Token invalide ou session expirée.",
                "Invalid token or session has expired.",
            ),
            Msg::ProfileFieldsRequired => (
                "L'adresse email et le nom d'utilisateur sont requis.",
                "Email adress and username are required.",
            ),
            Msg::ProfileUpdateFailed => (
                "Erreur lors de la mise à jour du profil.",
                "Error while updating the profile.",
            ),
            Msg::FileTooLarge => (
                "Le fichier est trop volumineux. La taille maximale est de 5 Mo.",
                "File size is too large. Maximum size is 5MB.",
            ),
            Msg::NoFileUploaded => ("Aucun fichier envoyé.", "No file uploaded."),
            Msg::UploadFailed => (
                "Une erreur inconnue est survenue lors de l'envoi du fichier.",
                "An unknown error occurred during file upload.",
            ),
            Msg::FileUploaded => ("Fichier envoyé avec succès.", "File uploaded successfully."),
            Msg::VerificationSubject => (
                "Votre code d'activation de compte",
                "Your account activation code",
            ),
            Msg::ResetSubject => (
                "Votre réinitialisation de mot de passe (valide pour seulement 10 minutes)",
                "Your password reset token (valid for only 10 minutes)",
            ),
        };
        match lang {
            Lang::Fr => fr,
            Lang::En => en,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_header_defaults_to_french() {
        assert_eq!(negotiate(None), Lang::Fr);
    }

    #[test]
    fn region_subtags_match_primary_language() {
        assert_eq!(negotiate(Some("en-US,en;q=0.9")), Lang::En);
        assert_eq!(negotiate(Some("fr-CA")), Lang::Fr);
    }

    #[test]
    fn quality_values_decide_order() {
        assert_eq!(negotiate(Some("fr;q=0.4, en;q=0.8")), Lang::En);
        assert_eq!(negotiate(Some("de, en;q=0.5, fr;q=0.7")), Lang::Fr);
    }

    #[test]
    fn unsupported_or_refused_languages_fall_back() {
        assert_eq!(best_match("de-DE, es"), None);
        assert_eq!(negotiate(Some("de-DE, es")), Lang::Fr);
        assert_eq!(best_match("en;q=0"), None);
    }

    #[test]
    fn parse_keeps_header_order_for_equal_weights() {
        assert_eq!(
            parse_accept_language("en-GB, fr, de;q=0.1"),
            vec!["en-gb".to_string(), "fr".to_string(), "de".to_string()]
        );
    }

    #[test]
    fn every_message_is_translated() {
        for msg in [Msg::NotLoggedIn, Msg::InvalidToken, Msg::SessionExpired] {
            assert_ne!(msg.text(Lang::Fr), msg.text(Lang::En));
        }
        assert_eq!(Msg::NotLoggedIn.text(Lang::En), "You are not logged in.");
    }
}
