use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    Json,
};
use lazy_static::lazy_static;
use regex::Regex;
use serde::de::DeserializeOwned;

use crate::error::{AppError, FieldError};

/// Turns a raw request body into its checked form, reporting every failed
/// rule at once.
pub trait Validate {
    type Output;

    fn validate(self) -> Result<Self::Output, Vec<FieldError>>;
}

/// Column widths of the `users` table.
pub const USERNAME_MAX: usize = 100;
pub const EMAIL_MAX: usize = 255;

/// Malformed or oversized JSON bodies are a plain 400.
pub fn json_rejection(rejection: JsonRejection) -> AppError {
    AppError::new(StatusCode::BAD_REQUEST, rejection.body_text())
}

/// JSON body extractor that runs [`Validate`] before the handler sees it.
pub struct ValidatedJson<T: Validate>(pub T::Output);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(body) = Json::<T>::from_request(req, state)
            .await
            .map_err(json_rejection)?;
        body.validate().map(ValidatedJson).map_err(AppError::Validation)
    }
}

pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Records a `required` error when the field is absent.
pub fn required(
    value: Option<String>,
    field: &str,
    message: &str,
    errors: &mut Vec<FieldError>,
) -> Option<String> {
    if value.is_none() {
        errors.push(FieldError::required(field, message));
    }
    value
}

pub fn check_email(email: &str, errors: &mut Vec<FieldError>) {
    if !is_valid_email(email) {
        errors.push(FieldError::new("email", "invalid_string", "Invalid email address"));
    }
    if email.chars().count() > EMAIL_MAX {
        errors.push(FieldError::too_big(
            "email",
            EMAIL_MAX,
            &format!("Email address must not exceed {EMAIL_MAX} characters"),
        ));
    }
}

pub fn check_username(username: &str, errors: &mut Vec<FieldError>) {
    if username.chars().count() > USERNAME_MAX {
        errors.push(FieldError::too_big(
            "username",
            USERNAME_MAX,
            &format!("Username must not exceed {USERNAME_MAX} characters"),
        ));
    }
}

/// Length rules of a new password; counts characters, not bytes.
pub fn check_password_length(
    password: &str,
    max: Option<usize>,
    errors: &mut Vec<FieldError>,
) {
    const MIN: usize = 8;
    let len = password.chars().count();
    if len < MIN {
        errors.push(FieldError::too_small(
            "password",
            MIN,
            "Password must be at least 8 characters",
        ));
    }
    if let Some(max) = max.filter(|max| len > *max) {
        errors.push(FieldError::too_big(
            "password",
            max,
            &format!("Password must not exceed {max} characters"),
        ));
    }
}

pub fn check_confirmation(password: &str, confirm: &str, errors: &mut Vec<FieldError>) {
    if password != confirm {
        errors.push(FieldError::new(
            "passwordConfirm",
            "custom",
            "Passwords do not match",
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shape() {
        assert!(is_valid_email("bob@x.com"));
        assert!(!is_valid_email("bob@x"));
        assert!(!is_valid_email("bob x@y.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn column_widths_are_enforced() {
        let mut errors = Vec::new();
        check_username(&"u".repeat(USERNAME_MAX), &mut errors);
        check_email(&format!("{}@x.com", "a".repeat(EMAIL_MAX - 6)), &mut errors);
        assert!(errors.is_empty());

        check_username(&"u".repeat(USERNAME_MAX + 1), &mut errors);
        check_email(&format!("{}@x.com", "a".repeat(EMAIL_MAX)), &mut errors);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].path, vec!["username".to_string()]);
        assert_eq!(errors[0].maximum, Some(USERNAME_MAX));
        assert_eq!(errors[1].path, vec!["email".to_string()]);
        assert_eq!(errors[1].code, "too_big");
    }

    #[test]
    fn password_length_bounds() {
        let mut errors = Vec::new();
        check_password_length("short", Some(32), &mut errors);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, "too_small");

        errors.clear();
        check_password_length(&"x".repeat(33), Some(32), &mut errors);
        assert_eq!(errors[0].code, "too_big");
        assert_eq!(errors[0].maximum, Some(32));

        errors.clear();
        check_password_length(&"x".repeat(33), None, &mut errors);
        check_password_length("exactly8", Some(32), &mut errors);
        assert!(errors.is_empty());
    }

    #[test]
    fn confirmation_error_points_at_confirm_field() {
        let mut errors = Vec::new();
        check_confirmation("pw123456", "pw654321", &mut errors);
        assert_eq!(errors[0].path, vec!["passwordConfirm".to_string()]);
        assert_eq!(errors[0].message, "Passwords do not match");
    }
}
