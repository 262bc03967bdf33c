use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use time::{Duration, OffsetDateTime};

/// How long a password reset link stays usable.
pub const RESET_TOKEN_TTL: Duration = Duration::minutes(10);

/// Single-use secret: `raw` goes out by email, only `digest` is stored.
pub struct OneTimeToken {
    pub raw: String,
    pub digest: String,
}

impl OneTimeToken {
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        OsRng.fill_bytes(&mut bytes);
        let raw = hex::encode(bytes);
        let digest = digest(&raw);
        Self { raw, digest }
    }
}

/// Hex SHA-256 of a raw token, the form tokens are looked up by.
pub fn digest(raw: &str) -> String {
    hex::encode(Sha256::digest(raw.as_bytes()))
}

pub fn reset_expiry(now: OffsetDateTime) -> OffsetDateTime {
    now + RESET_TOKEN_TTL
}
