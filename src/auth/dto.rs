use serde::{Deserialize, Serialize};

use crate::{
    error::FieldError,
    validation::{
        check_confirmation, check_email, check_password_length, check_username, required, Validate,
    },
};

const PASSWORD_MAX: usize = 32;

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    #[serde(rename = "passwordConfirm")]
    pub password_confirm: Option<String>,
}

#[derive(Debug)]
pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl Validate for RegisterRequest {
    type Output = RegisterInput;

    fn validate(self) -> Result<RegisterInput, Vec<FieldError>> {
        let mut errors = Vec::new();

        let username = required(self.username, "username", "Username is required", &mut errors)
            .map(|u| u.trim().to_string());
        let email = required(self.email, "email", "Email address is required", &mut errors)
            .map(|e| e.trim().to_lowercase());
        let password = required(self.password, "password", "Password is required", &mut errors);
        let confirm = required(
            self.password_confirm,
            "passwordConfirm",
            "Please confirm your password",
            &mut errors,
        );

        if let Some(username) = &username {
            check_username(username, &mut errors);
        }
        if let Some(email) = &email {
            check_email(email, &mut errors);
        }
        if let Some(password) = &password {
            check_password_length(password, Some(PASSWORD_MAX), &mut errors);
        }
        if let (Some(password), Some(confirm)) = (&password, &confirm) {
            check_confirmation(password, confirm, &mut errors);
        }

        match (username, email, password) {
            (Some(username), Some(email), Some(password)) if errors.is_empty() => {
                Ok(RegisterInput {
                    username,
                    email,
                    password,
                })
            }
            _ => Err(errors),
        }
    }
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

impl Validate for LoginRequest {
    type Output = LoginInput;

    fn validate(self) -> Result<LoginInput, Vec<FieldError>> {
        let mut errors = Vec::new();
        let email = required(self.email, "email", "Email address is required", &mut errors)
            .map(|e| e.trim().to_lowercase());
        let password = required(self.password, "password", "Password is required", &mut errors);

        if let Some(email) = &email {
            check_email(email, &mut errors);
        }
        if let Some(password) = &password {
            check_password_length(password, None, &mut errors);
        }

        match (email, password) {
            (Some(email), Some(password)) if errors.is_empty() => Ok(LoginInput { email, password }),
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: Option<String>,
}

impl Validate for ForgotPasswordRequest {
    type Output = String;

    fn validate(self) -> Result<String, Vec<FieldError>> {
        let mut errors = Vec::new();
        let email = required(self.email, "email", "Email address is required", &mut errors)
            .map(|e| e.trim().to_lowercase());
        if let Some(email) = &email {
            check_email(email, &mut errors);
        }
        match email {
            Some(email) if errors.is_empty() => Ok(email),
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub password: Option<String>,
    #[serde(rename = "passwordConfirm")]
    pub password_confirm: Option<String>,
}

impl Validate for ResetPasswordRequest {
    /// The new password.
    type Output = String;

    fn validate(self) -> Result<String, Vec<FieldError>> {
        let mut errors = Vec::new();
        let password = required(self.password, "password", "Password is required", &mut errors);
        let confirm = required(
            self.password_confirm,
            "passwordConfirm",
            "Please confirm your password",
            &mut errors,
        );
        if let Some(password) = &password {
            check_password_length(password, None, &mut errors);
        }
        if let (Some(password), Some(confirm)) = (&password, &confirm) {
            check_confirmation(password, confirm, &mut errors);
        }
        match password {
            Some(password) if errors.is_empty() => Ok(password),
            _ => Err(errors),
        }
    }
}

/// Body returned by a successful login; the token is also set as a cookie.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub status: &'static str,
    pub access_token: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub status: &'static str,
    pub message: &'static str,
}

impl MessageResponse {
    pub fn success(message: &'static str) -> Self {
        Self {
            status: "success",
            message,
        }
    }
}
