/// CSRF Binder
///
/// A CSRF token is the HMAC of the refresh session identifier under a
/// dedicated secret. Nothing is stored: the server recomputes it from the
/// session id carried in an already verified refresh token.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::AppError;

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone)]
pub struct CsrfBinder {
    secret: Vec<u8>,
}

impl CsrfBinder {
    pub fn new(secret: &str) -> Self {
        Self {
            secret: secret.as_bytes().to_vec(),
        }
    }

    /// Derive the CSRF token bound to `session_id`
    pub fn derive(&self, session_id: &str) -> Result<String, AppError> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| AppError::Internal(format!("CSRF key rejected: {}", e)))?;
        mac.update(session_id.as_bytes());
        Ok(URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes()))
    }

    /// Compare `presented` against the token derived from `session_id` in constant time
    pub fn check(&self, presented: &str, session_id: &str) -> Result<bool, AppError> {
        let expected = self.derive(session_id)?;
        Ok(expected.as_bytes().ct_eq(presented.as_bytes()).into())
    }
}
