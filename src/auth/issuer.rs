/// Credential Issuer
///
/// Mints the (access, refresh, csrf) triple for a verified identity. Each
/// issuance gets a fresh random session identifier; the refresh expiry is
/// either `now + refresh_ttl` or an absolute ceiling supplied by the caller.

use chrono::{DateTime, Duration, Utc};
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use uuid::Uuid;

use crate::auth::claims::{AccessClaims, RefreshClaims};
use crate::auth::csrf::CsrfBinder;
use crate::auth::jwt::TokenCodec;
use crate::configuration::SessionSettings;
use crate::error::{AppError, AuthError};

const SESSION_ID_LENGTH: usize = 64;

/// Generate a new session identifier
///
/// 64 alphanumeric characters drawn from the thread-local CSPRNG.
pub fn generate_session_id() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SESSION_ID_LENGTH)
        .map(char::from)
        .collect()
}

/// A freshly minted credential triple plus the metadata the transport needs
#[derive(Debug, Clone)]
pub struct IssuedCredentials {
    pub user_id: Uuid,
    pub session_id: String,
    pub access_token: String,
    pub refresh_token: String,
    pub csrf_token: String,
    pub issued_at: DateTime<Utc>,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct CredentialIssuer {
    access: TokenCodec,
    refresh: TokenCodec,
    csrf: CsrfBinder,
    access_ttl: Duration,
    refresh_ttl: Duration,
    issuer: String,
}

impl CredentialIssuer {
    pub fn new(settings: &SessionSettings) -> Self {
        Self {
            access: TokenCodec::new(&settings.access_secret, &settings.issuer),
            refresh: TokenCodec::new(&settings.refresh_secret, &settings.issuer),
            csrf: CsrfBinder::new(&settings.csrf_secret),
            access_ttl: Duration::seconds(settings.access_token_ttl),
            refresh_ttl: Duration::seconds(settings.refresh_token_ttl),
            issuer: settings.issuer.clone(),
        }
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    /// Issue a full credential triple for `user_id`
    ///
    /// `absolute_expiry` pins the refresh token expiry (rotation); without it
    /// the refresh window starts now (login). Nothing is returned unless all
    /// three tokens were produced.
    ///
    /// # Errors
    /// Returns an internal error if signing or CSRF derivation fails
    pub fn issue(
        &self,
        user_id: Uuid,
        absolute_expiry: Option<DateTime<Utc>>,
    ) -> Result<IssuedCredentials, AppError> {
        let session_id = generate_session_id();
        let issued_at = Utc::now();
        let refresh_expires_at = absolute_expiry.unwrap_or(issued_at + self.refresh_ttl);
        let access_expires_at = issued_at + self.access_ttl;

        let access_claims = AccessClaims::new(
            user_id,
            issued_at.timestamp(),
            access_expires_at.timestamp(),
            &self.issuer,
        );
        let access_token = self.access.issue(&access_claims)?;

        let refresh_claims = RefreshClaims::new(
            user_id,
            session_id.clone(),
            issued_at.timestamp(),
            refresh_expires_at.timestamp(),
            &self.issuer,
        );
        let refresh_token = self.refresh.issue(&refresh_claims)?;

        let csrf_token = self.csrf.derive(&session_id)?;

        Ok(IssuedCredentials {
            user_id,
            session_id,
            access_token,
            refresh_token,
            csrf_token,
            issued_at,
            access_expires_at,
            refresh_expires_at,
        })
    }

    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, AuthError> {
        self.access.verify(token)
    }

    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, AuthError> {
        self.refresh.verify(token)
    }

    /// True when `presented` is the CSRF token bound to `session_id`
    ///
    /// Derivation errors count as a mismatch.
    pub fn csrf_matches(&self, presented: &str, session_id: &str) -> bool {
        match self.csrf.check(presented, session_id) {
            Ok(matches) => matches,
            Err(e) => {
                tracing::error!(error = %e, "CSRF check failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_settings() -> SessionSettings {
        SessionSettings {
            access_secret: "access-secret-key-at-least-32-bytes-long".to_string(),
            refresh_secret: "refresh-secret-key-at-least-32-bytes-long".to_string(),
            csrf_secret: "csrf-secret-key-at-least-32-bytes-long!!".to_string(),
            access_token_ttl: 900,
            refresh_token_ttl: 604800,
            issuer: "test".to_string(),
        }
    }

    #[test]
    fn test_generate_session_id() {
        let id = generate_session_id();

        assert_eq!(id.len(), SESSION_ID_LENGTH);
        assert!(id.chars().all(|c| c.is_alphanumeric()));
        assert_ne!(id, generate_session_id());
    }

    #[test]
    fn test_issue_triple() {
        let issuer = CredentialIssuer::new(&test_settings());
        let user_id = Uuid::new_v4();

        let creds = issuer.issue(user_id, None).expect("Failed to issue credentials");

        let access = issuer.verify_access(&creds.access_token).unwrap();
        assert_eq!(access.sub, user_id);
        assert_eq!(access.exp - access.iat, 900);

        let refresh = issuer.verify_refresh(&creds.refresh_token).unwrap();
        assert_eq!(refresh.user_id, user_id);
        assert_eq!(refresh.session_id, creds.session_id);
        assert_eq!(refresh.exp - refresh.iat, 604800);

        assert!(issuer.csrf_matches(&creds.csrf_token, &creds.session_id));
    }

    #[test]
    fn test_absolute_expiry_override() {
        let issuer = CredentialIssuer::new(&test_settings());
        let ceiling = Utc::now() + Duration::hours(2);

        let creds = issuer.issue(Uuid::new_v4(), Some(ceiling)).unwrap();
        let refresh = issuer.verify_refresh(&creds.refresh_token).unwrap();

        assert_eq!(refresh.exp, ceiling.timestamp());
        assert_eq!(creds.refresh_expires_at, ceiling);
        // Access lifetime does not follow the refresh ceiling
        let access = issuer.verify_access(&creds.access_token).unwrap();
        assert_eq!(access.exp - access.iat, 900);
    }

    #[test]
    fn test_fresh_session_per_issuance() {
        let issuer = CredentialIssuer::new(&test_settings());
        let user_id = Uuid::new_v4();

        let first = issuer.issue(user_id, None).unwrap();
        let second = issuer.issue(user_id, None).unwrap();

        assert_ne!(first.session_id, second.session_id);
        assert_ne!(first.csrf_token, second.csrf_token);
        assert!(!issuer.csrf_matches(&first.csrf_token, &second.session_id));
    }

    #[test]
    fn test_secrets_are_not_interchangeable() {
        let issuer = CredentialIssuer::new(&test_settings());
        let creds = issuer.issue(Uuid::new_v4(), None).unwrap();

        assert_eq!(
            issuer.verify_access(&creds.refresh_token).unwrap_err(),
            AuthError::SignatureInvalid
        );
        assert_eq!(
            issuer.verify_refresh(&creds.access_token).unwrap_err(),
            AuthError::SignatureInvalid
        );
    }
}
