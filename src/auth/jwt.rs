use std::time::Duration;

use anyhow::Context;
use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use crate::{config::JwtConfig, state::AppState};

/// JWT payload of an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,   // user ID
    pub iat: usize,  // issued at (unix timestamp)
    pub exp: usize,  // expires at (unix timestamp)
    pub iss: String, // issuer
    pub aud: String, // audience
}

/// RS256 key pair plus the claims every token must carry.
#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
    pub access_ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        state.keys.clone()
    }
}

impl JwtKeys {
    pub fn from_config(cfg: &JwtConfig) -> anyhow::Result<Self> {
        let encoding = EncodingKey::from_rsa_pem(cfg.private_key.as_bytes())
            .context("parse JWT_ACCESS_TOKEN_PRIVATE_KEY")?;
        let decoding = DecodingKey::from_rsa_pem(cfg.public_key.as_bytes())
            .context("parse JWT_ACCESS_TOKEN_PUBLIC_KEY")?;
        Ok(Self {
            encoding,
            decoding,
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            access_ttl: Duration::from_secs(cfg.ttl_minutes.max(1) as u64 * 60),
        })
    }

    fn sign_claims(&self, claims: &Claims) -> anyhow::Result<String> {
        let token = encode(&Header::new(Algorithm::RS256), claims, &self.encoding)?;
        Ok(token)
    }

    pub fn sign_access(&self, user_id: Uuid) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = now + TimeDuration::seconds(self.access_ttl.as_secs() as i64);
        let token = self.sign_claims(&Claims {
            sub: user_id,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        })?;
        debug!(user_id = %user_id, "access token signed");
        Ok(token)
    }

    /// Checks signature, expiry, issuer and audience.
    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        debug!(user_id = %data.claims.sub, "access token verified");
        Ok(data.claims)
    }
}

#[cfg(test)]
pub(crate) mod test_keys {
    use super::*;

    pub const PRIVATE_PEM: &str = include_str!("../../testdata/jwt_private.pem");
    pub const PUBLIC_PEM: &str = include_str!("../../testdata/jwt_public.pem");
    /// Unrelated key, for tokens the service must not accept.
    pub const FOREIGN_PRIVATE_PEM: &str = include_str!("../../testdata/other_private.pem");

    pub fn config() -> JwtConfig {
        JwtConfig {
            private_key: PRIVATE_PEM.into(),
            public_key: PUBLIC_PEM.into(),
            issuer: "test-issuer".into(),
            audience: "test-aud".into(),
            ttl_minutes: 15,
        }
    }

    pub fn keys() -> JwtKeys {
        JwtKeys::from_config(&config()).expect("test keys parse")
    }

    /// Same claims layout, signed with the foreign key.
    pub fn forged_token(user_id: Uuid) -> String {
        let keys = keys();
        let forger = JwtKeys {
            encoding: EncodingKey::from_rsa_pem(FOREIGN_PRIVATE_PEM.as_bytes()).unwrap(),
            ..keys
        };
        forger.sign_access(user_id).unwrap()
    }
}
