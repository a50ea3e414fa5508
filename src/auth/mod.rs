//! Password hashing and session tokens.
//!
//! Passwords are stored as `salt$digest` (salted SHA-256, base64). A session
//! token is the JSON claims sealed with AES-256-GCM under a key derived from
//! the server secret, so a token that decrypts is also authentic.

pub mod extract;

pub use extract::{AuthUser, TOKEN_COOKIE, clear_token_cookie, token_cookie};

use aes_gcm::{
    Aes256Gcm, Key, Nonce,
    aead::{Aead, KeyInit},
};
use base64::{
    Engine as _,
    engine::general_purpose::{STANDARD as BASE64, URL_SAFE_NO_PAD},
};
use chrono::{Duration, Utc};
use rand::{RngCore, rngs::OsRng};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;

const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("failed to seal session token")]
    Seal,
    #[error("malformed session token")]
    Malformed,
    #[error("session token expired")]
    Expired,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    /// Expiry, unix seconds.
    pub exp: i64,
}

pub struct Authenticator {
    cipher: Aes256Gcm,
    token_ttl: Duration,
}

impl Authenticator {
    pub fn new(secret: &str, token_ttl_days: i64) -> Self {
        let digest = Sha256::digest(secret.as_bytes());
        let key = Key::<Aes256Gcm>::from_slice(digest.as_slice());
        Self {
            cipher: Aes256Gcm::new(key),
            token_ttl: Duration::days(token_ttl_days),
        }
    }

    pub fn hash_password(&self, password: &str) -> String {
        let mut salt = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);
        format!(
            "{}${}",
            BASE64.encode(salt),
            BASE64.encode(digest_password(&salt, password))
        )
    }

    pub fn verify_password(&self, password: &str, stored: &str) -> bool {
        let Some((salt, expected)) = stored.split_once('$') else {
            return false;
        };
        let (Ok(salt), Ok(expected)) = (BASE64.decode(salt), BASE64.decode(expected)) else {
            return false;
        };
        digest_password(&salt, password).as_slice().ct_eq(&expected).into()
    }

    pub fn issue_token(&self, user_id: &str) -> Result<String, AuthError> {
        let claims = Claims {
            sub: user_id.to_string(),
            exp: (Utc::now() + self.token_ttl).timestamp(),
        };
        self.seal(&claims)
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        let sealed = URL_SAFE_NO_PAD.decode(token).map_err(|_| AuthError::Malformed)?;
        if sealed.len() < NONCE_LEN {
            return Err(AuthError::Malformed);
        }

        let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| AuthError::Malformed)?;
        let claims: Claims = serde_json::from_slice(&plaintext).map_err(|_| AuthError::Malformed)?;

        if claims.exp <= Utc::now().timestamp() {
            return Err(AuthError::Expired);
        }
        Ok(claims)
    }

    fn seal(&self, claims: &Claims) -> Result<String, AuthError> {
        let plaintext = serde_json::to_vec(claims).map_err(|_| AuthError::Seal)?;

        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);
        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext.as_slice())
            .map_err(|_| AuthError::Seal)?;

        let mut sealed = nonce.to_vec();
        sealed.extend(ciphertext);
        Ok(URL_SAFE_NO_PAD.encode(sealed))
    }
}

fn digest_password(salt: &[u8], password: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(b":");
    hasher.update(password.as_bytes());
    hasher.finalize().into()
}
