/// Session Lifecycle Controller
///
/// Drives login, logout and refresh rotation on top of the credential issuer
/// and the session record store, and enforces CSRF binding for mutating
/// requests.
///
/// Per request the session moves through:
/// `Anonymous -> Authenticated` (login),
/// `Authenticated -> Revoked` (logout),
/// `Authenticated -> RotationRequested -> Authenticated | Revoked` (refresh).
/// Revoked sessions only recover through a fresh login.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::auth::{AccessClaims, CredentialIssuer, IssuedCredentials, RefreshClaims};
use crate::error::{AppError, AuthError};
use crate::store::{SessionRecord, SessionStore};

/// What logout did on the server side. The client sees success either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutOutcome {
    /// The presented session was current and has been deleted
    Revoked,
    /// A newer session (or none) is stored; nothing was deleted
    StaleSession,
}

#[derive(Clone)]
pub struct SessionController {
    issuer: CredentialIssuer,
    store: Arc<dyn SessionStore>,
}

impl SessionController {
    pub fn new(issuer: CredentialIssuer, store: Arc<dyn SessionStore>) -> Self {
        Self { issuer, store }
    }

    pub fn issuer(&self) -> &CredentialIssuer {
        &self.issuer
    }

    /// Start a new session for an already verified identity
    ///
    /// Overwrites any session the user had, so a login anywhere ends the
    /// session everywhere else. The record is persisted before the tokens
    /// are returned; a store failure returns no tokens.
    #[tracing::instrument(name = "session_login", skip(self))]
    pub async fn login(&self, user_id: Uuid) -> Result<IssuedCredentials, AppError> {
        let credentials = self.issuer.issue(user_id, None)?;

        self.store
            .put(&SessionRecord {
                user_id,
                session_id: credentials.session_id.clone(),
                created_at: credentials.issued_at,
            })
            .await?;

        tracing::info!(
            session_expires_at = %credentials.refresh_expires_at,
            "Session started"
        );
        Ok(credentials)
    }

    /// End the presented session
    ///
    /// Both tokens must verify. The stored record is deleted only if it is
    /// still the presented session; a newer session is left alone.
    #[tracing::instrument(name = "session_logout", skip_all)]
    pub async fn logout(
        &self,
        access_token: Option<&str>,
        refresh_token: Option<&str>,
    ) -> Result<LogoutOutcome, AppError> {
        let access_token = access_token.ok_or(AuthError::MissingToken)?;
        let refresh_token = refresh_token.ok_or(AuthError::MissingToken)?;

        self.issuer.verify_access(access_token)?;
        let claims = self.issuer.verify_refresh(refresh_token)?;

        let deleted = self
            .store
            .delete_if_current(claims.user_id, &claims.session_id)
            .await?;

        if deleted {
            tracing::info!(user_id = %claims.user_id, "Session revoked on logout");
            Ok(LogoutOutcome::Revoked)
        } else {
            tracing::warn!(
                user_id = %claims.user_id,
                "Logout presented a session that is no longer current"
            );
            Ok(LogoutOutcome::StaleSession)
        }
    }

    /// Exchange a current refresh token for a new credential triple
    ///
    /// Only the refresh token is checked. Presenting a superseded session
    /// revokes the stored one as well and fails with `SessionMismatch`.
    /// The new refresh token keeps the session's original absolute expiry.
    #[tracing::instrument(name = "session_rotate", skip_all)]
    pub async fn rotate(&self, refresh_token: Option<&str>) -> Result<IssuedCredentials, AppError> {
        let refresh_token = refresh_token.ok_or(AuthError::MissingToken)?;
        let claims = self.issuer.verify_refresh(refresh_token)?;
        let user_id = claims.user_id;

        let record = match self.store.get(user_id).await? {
            Some(record) => record,
            None => {
                tracing::warn!(user_id = %user_id, "Refresh for a user without a session");
                return Err(AuthError::SessionNotFound.into());
            }
        };

        if record.session_id != claims.session_id {
            return Err(self.revoke_after_reuse(user_id, &record.session_id).await);
        }

        let absolute_expiry = record.created_at + self.issuer.refresh_ttl();
        if absolute_expiry <= Utc::now() {
            tracing::info!(user_id = %user_id, "Session reached its absolute expiry");
            return Err(AuthError::TokenExpired.into());
        }

        let credentials = self.issuer.issue(user_id, Some(absolute_expiry))?;

        let swapped = self
            .store
            .rotate(user_id, &claims.session_id, &credentials.session_id)
            .await?;
        if !swapped {
            // Another request replaced the session between read and swap
            return Err(self.revoke_after_reuse(user_id, &record.session_id).await);
        }

        tracing::info!(
            user_id = %user_id,
            session_expires_at = %credentials.refresh_expires_at,
            "Session rotated"
        );
        Ok(credentials)
    }

    /// Check the CSRF header of a mutating request
    ///
    /// Missing header, missing or invalid refresh token and a wrong CSRF
    /// value all give the same `CsrfMismatch`.
    pub fn enforce_csrf(
        &self,
        csrf_header: Option<&str>,
        refresh_token: Option<&str>,
    ) -> Result<RefreshClaims, AuthError> {
        let (presented, refresh_token) = match (csrf_header, refresh_token) {
            (Some(presented), Some(refresh_token)) => (presented, refresh_token),
            _ => return Err(AuthError::CsrfMismatch),
        };

        let claims = self
            .issuer
            .verify_refresh(refresh_token)
            .map_err(|_| AuthError::CsrfMismatch)?;

        if self.issuer.csrf_matches(presented, &claims.session_id) {
            Ok(claims)
        } else {
            Err(AuthError::CsrfMismatch)
        }
    }

    /// Verify an access token for protected routes
    pub fn authenticate(&self, access_token: Option<&str>) -> Result<AccessClaims, AuthError> {
        let access_token = access_token.ok_or(AuthError::MissingToken)?;
        self.issuer.verify_access(access_token)
    }

    /// Revoke the session observed during this rotation. A record written
    /// after that read (a concurrent login) is left in place.
    async fn revoke_after_reuse(&self, user_id: Uuid, observed_session_id: &str) -> AppError {
        match self.store.delete_if_current(user_id, observed_session_id).await {
            Ok(revoked) => {
                tracing::warn!(
                    user_id = %user_id,
                    revoked,
                    "Superseded refresh token presented"
                );
                AuthError::SessionMismatch.into()
            }
            Err(e) => e.into(),
        }
    }
}
