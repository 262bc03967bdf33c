use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub private_key: String,
    pub public_key: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub production: bool,
    pub client_url: String,
    pub server_url: String,
    pub upload_dir: String,
    pub public_dir: String,
    pub jwt: JwtConfig,
    pub smtp: SmtpConfig,
}

fn required(key: &str) -> anyhow::Result<String> {
    std::env::var(key).with_context(|| format!("missing environment variable {key}"))
}

fn optional(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

/// PEM blocks pasted into a single-line env var usually carry literal `\n`.
fn pem_from_env(key: &str) -> anyhow::Result<String> {
    Ok(required(key)?.replace("\\n", "\n"))
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let jwt = JwtConfig {
            private_key: pem_from_env("JWT_ACCESS_TOKEN_PRIVATE_KEY")?,
            public_key: pem_from_env("JWT_ACCESS_TOKEN_PUBLIC_KEY")?,
            issuer: optional("JWT_ISSUER", "tournament"),
            audience: optional("JWT_AUDIENCE", "tournament-users"),
            ttl_minutes: std::env::var("ACCESS_TOKEN_EXPIRES_IN")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(15),
        };

        let smtp = SmtpConfig {
            host: required("EMAIL_HOST")?,
            port: required("EMAIL_PORT")?
                .parse()
                .context("EMAIL_PORT must be a port number")?,
            username: optional("EMAIL_USER", ""),
            password: optional("EMAIL_PASS", ""),
            from: optional("EMAIL_FROM", "Tournament <contact@tournament.com>"),
        };

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            host: optional("APP_HOST", "0.0.0.0"),
            port: optional("APP_PORT", "8080")
                .parse()
                .context("APP_PORT must be a port number")?,
            production: optional("APP_ENV", "development") == "production",
            client_url: required("CLIENT_URL")?,
            server_url: required("SERVER_URL")?,
            upload_dir: optional("UPLOAD_DIR", "uploads"),
            public_dir: optional("PUBLIC_DIR", "public"),
            jwt,
            smtp,
        })
    }
}
