/// JWT Token Codec
///
/// Signs and verifies HS512 tokens carrying typed claims. The accepted
/// algorithm is pinned: the header's `alg` is inspected before any decoding
/// and anything other than HS512 is reported as an invalid signature.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{AppError, AuthError};

pub const TOKEN_ALGORITHM: Algorithm = Algorithm::HS512;
const TOKEN_ALGORITHM_NAME: &str = "HS512";

/// Signs and verifies one kind of token under one secret
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    pub fn new(secret: &str, issuer: &str) -> Self {
        let mut validation = Validation::new(TOKEN_ALGORITHM);
        validation.leeway = 0;
        validation.set_issuer(&[issuer]);
        validation.set_required_spec_claims(&["exp", "iss"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Serialize and sign `claims`
    ///
    /// # Errors
    /// Returns an internal error if serialization or signing fails
    pub fn issue<C: Serialize>(&self, claims: &C) -> Result<String, AppError> {
        encode(&Header::new(TOKEN_ALGORITHM), claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
    }

    /// Verify signature, algorithm, issuer and expiry, then decode the claims
    pub fn verify<C: DeserializeOwned>(&self, token: &str) -> Result<C, AuthError> {
        check_pinned_algorithm(token)?;

        decode::<C>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                let error = classify(e.kind());
                tracing::debug!(error = %e, classified = %error, "JWT validation failed");
                error
            })
    }
}

fn classify(kind: &ErrorKind) -> AuthError {
    match kind {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        ErrorKind::InvalidSignature
        | ErrorKind::InvalidAlgorithm
        | ErrorKind::InvalidAlgorithmName => AuthError::SignatureInvalid,
        _ => AuthError::MalformedToken,
    }
}

/// Reads `alg` from the raw header so that names jsonwebtoken does not know
/// (e.g. `none`) are still classified as a signature problem.
fn check_pinned_algorithm(token: &str) -> Result<(), AuthError> {
    let header = token
        .split('.')
        .next()
        .filter(|segment| !segment.is_empty())
        .ok_or(AuthError::MalformedToken)?;

    let bytes = URL_SAFE_NO_PAD
        .decode(header)
        .map_err(|_| AuthError::MalformedToken)?;
    let header: serde_json::Value =
        serde_json::from_slice(&bytes).map_err(|_| AuthError::MalformedToken)?;

    match header.get("alg").and_then(serde_json::Value::as_str) {
        Some(TOKEN_ALGORITHM_NAME) => Ok(()),
        Some(_) => Err(AuthError::SignatureInvalid),
        None => Err(AuthError::MalformedToken),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::claims::{AccessClaims, RefreshClaims};
    use chrono::Utc;
    use uuid::Uuid;

    const SECRET: &str = "test-secret-key-at-least-32-characters-long";

    fn codec() -> TokenCodec {
        TokenCodec::new(SECRET, "test")
    }

    fn access_claims(exp_offset: i64) -> AccessClaims {
        let now = Utc::now().timestamp();
        AccessClaims::new(Uuid::new_v4(), now, now + exp_offset, "test")
    }

    #[test]
    fn test_issue_and_verify() {
        let codec = codec();
        let claims = RefreshClaims::new(
            Uuid::new_v4(),
            "session".to_string(),
            Utc::now().timestamp(),
            Utc::now().timestamp() + 3600,
            "test",
        );

        let token = codec.issue(&claims).expect("Failed to issue token");
        let decoded: RefreshClaims = codec.verify(&token).expect("Failed to verify token");

        assert_eq!(decoded, claims);
    }

    #[test]
    fn test_header_uses_hs512() {
        let token = codec().issue(&access_claims(60)).unwrap();
        let header = jsonwebtoken::decode_header(&token).unwrap();
        assert_eq!(header.alg, Algorithm::HS512);
    }

    #[test]
    fn test_expired_token() {
        let codec = codec();
        let token = codec.issue(&access_claims(-10)).unwrap();

        let result = codec.verify::<AccessClaims>(&token);
        assert_eq!(result.unwrap_err(), AuthError::TokenExpired);
    }

    #[test]
    fn test_wrong_secret() {
        let token = codec().issue(&access_claims(60)).unwrap();
        let other = TokenCodec::new("another-secret-key-at-least-32-characters", "test");

        let result = other.verify::<AccessClaims>(&token);
        assert_eq!(result.unwrap_err(), AuthError::SignatureInvalid);
    }

    #[test]
    fn test_other_hmac_algorithm_rejected() {
        let token = encode(
            &Header::new(Algorithm::HS256),
            &access_claims(60),
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        let result = codec().verify::<AccessClaims>(&token);
        assert_eq!(result.unwrap_err(), AuthError::SignatureInvalid);
    }

    #[test]
    fn test_none_algorithm_rejected() {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&access_claims(60)).unwrap());
        let token = format!("{}.{}.", header, payload);

        let result = codec().verify::<AccessClaims>(&token);
        assert_eq!(result.unwrap_err(), AuthError::SignatureInvalid);
    }

    #[test]
    fn test_malformed_token() {
        let codec = codec();
        for token in ["", "invalid.token.here", "not-a-jwt", "...."] {
            assert_eq!(
                codec.verify::<AccessClaims>(token).unwrap_err(),
                AuthError::MalformedToken,
                "token: {:?}",
                token
            );
        }
    }

    #[test]
    fn test_wrong_issuer() {
        let token = codec().issue(&access_claims(60)).unwrap();
        let other_issuer = TokenCodec::new(SECRET, "wrong-issuer");

        assert!(other_issuer.verify::<AccessClaims>(&token).is_err());
    }

    #[test]
    fn test_claims_shape_mismatch() {
        let codec = codec();
        let token = codec.issue(&access_claims(60)).unwrap();

        // An access token does not carry userID/sessionID
        assert_eq!(
            codec.verify::<RefreshClaims>(&token).unwrap_err(),
            AuthError::MalformedToken
        );
    }
}
