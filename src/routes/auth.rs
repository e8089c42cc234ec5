/// Authentication Routes
///
/// Registration, login, refresh rotation, logout and the current user.
/// Tokens travel only in HttpOnly cookies; the CSRF token is returned in the
/// JSON body and the `X-CSRF-Token` response header.

use actix_web::{
    http::StatusCode, web, HttpRequest, HttpResponse, HttpResponseBuilder, ResponseError,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{AccessClaims, IssuedCredentials};
use crate::error::{AppError, AuthError, ErrorContext};
use crate::identity::{IdentityProvider, NewUser};
use crate::routes::cookies::{
    read_bearer_token, read_cookie, CookiePolicy, ACCESS_COOKIE, CSRF_HEADER, REFRESH_COOKIE,
};
use crate::session::SessionController;
use crate::validators::{is_valid_email, is_valid_name};

/// User registration request
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// User login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Body of every response that starts or rotates a session
#[derive(Serialize)]
pub struct SessionResponse {
    pub user_id: Uuid,
    pub csrf_token: String,
    pub access_expires_at: DateTime<Utc>,
    pub session_expires_at: DateTime<Utc>,
}

/// User information response
#[derive(Serialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub name: String,
}

fn session_response(
    status: StatusCode,
    credentials: &IssuedCredentials,
    policy: &CookiePolicy,
) -> HttpResponse {
    let mut builder = HttpResponseBuilder::new(status);
    for cookie in policy.session_cookies(credentials) {
        builder.cookie(cookie);
    }

    builder
        .insert_header((CSRF_HEADER, credentials.csrf_token.as_str()))
        .json(SessionResponse {
            user_id: credentials.user_id,
            csrf_token: credentials.csrf_token.clone(),
            access_expires_at: credentials.access_expires_at,
            session_expires_at: credentials.refresh_expires_at,
        })
}

fn clear_session_cookies(response: &mut HttpResponse, policy: &CookiePolicy) -> Result<(), AppError> {
    for cookie in policy.removal_cookies() {
        response
            .add_cookie(&cookie)
            .map_err(|e| AppError::Internal(format!("Failed to clear cookie: {}", e)))?;
    }
    Ok(())
}

/// POST /auth/register
///
/// Create a user and start their first session.
///
/// # Errors
/// - 400: Invalid email, name or weak password
/// - 409: Email already registered
/// - 500: Internal server error
pub async fn register(
    form: web::Json<RegisterRequest>,
    sessions: web::Data<SessionController>,
    identities: web::Data<dyn IdentityProvider>,
    cookies: web::Data<CookiePolicy>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_registration");
    let form = form.into_inner();

    let email = is_valid_email(&form.email)?;
    let name = is_valid_name(&form.name)?;

    let identity = identities
        .register(NewUser {
            email,
            name,
            password: form.password,
        })
        .await
        .map_err(|e| {
            context.log_error(&e);
            e
        })?;

    let credentials = sessions.login(identity.user_id).await?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = %identity.user_id,
        "User registered"
    );

    Ok(session_response(StatusCode::CREATED, &credentials, &cookies))
}

/// POST /auth/login
///
/// Verify credentials and start a session, ending any other session the user
/// had.
///
/// # Errors
/// - 400: Malformed email
/// - 401: Unknown email or wrong password (same body for both)
/// - 403: Account is inactive
/// - 500: Internal server error
pub async fn login(
    form: web::Json<LoginRequest>,
    sessions: web::Data<SessionController>,
    identities: web::Data<dyn IdentityProvider>,
    cookies: web::Data<CookiePolicy>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_login");

    let email = is_valid_email(&form.email)?;

    let identity = match identities.verify_credentials(&email, &form.password).await {
        Ok(identity) => identity,
        Err(e) => {
            if matches!(e, AppError::Auth(AuthError::UnknownIdentity)) {
                tracing::info!(request_id = %context.request_id, "Login for unknown email");
            }
            context.log_error(&e);
            return Err(e);
        }
    };

    let credentials = sessions.login(identity.user_id).await?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = %identity.user_id,
        "User logged in"
    );

    Ok(session_response(StatusCode::OK, &credentials, &cookies))
}

/// POST /auth/refresh
///
/// Rotate the session in the `refresh_token` cookie.
///
/// # Errors
/// - 401: Missing, invalid or expired token, or no stored session
/// - 403: Superseded token presented; the session is revoked and the cookies
///   are cleared
/// - 500: Internal server error
pub async fn refresh(
    req: HttpRequest,
    sessions: web::Data<SessionController>,
    cookies: web::Data<CookiePolicy>,
) -> Result<HttpResponse, AppError> {
    let refresh_token = read_cookie(&req, REFRESH_COOKIE);

    match sessions.rotate(refresh_token.as_deref()).await {
        Ok(credentials) => Ok(session_response(StatusCode::OK, &credentials, &cookies)),
        Err(e) if e.is_session_invalidated() => {
            let mut response = e.error_response();
            clear_session_cookies(&mut response, &cookies)?;
            Ok(response)
        }
        Err(e) => Err(e),
    }
}

/// POST /auth/logout
///
/// Revoke the presented session. Behind the CSRF guard.
///
/// Logging out a session that was already replaced or revoked succeeds
/// without touching the stored record.
///
/// # Errors
/// - 401: Missing or invalid tokens, or CSRF mismatch
/// - 500: Internal server error
pub async fn logout(
    req: HttpRequest,
    sessions: web::Data<SessionController>,
    cookies: web::Data<CookiePolicy>,
) -> Result<HttpResponse, AppError> {
    let access_token = read_cookie(&req, ACCESS_COOKIE).or_else(|| read_bearer_token(&req));
    let refresh_token = read_cookie(&req, REFRESH_COOKIE);

    let outcome = sessions
        .logout(access_token.as_deref(), refresh_token.as_deref())
        .await?;
    tracing::debug!(outcome = ?outcome, "Logout handled");

    let mut response = HttpResponse::Ok().json(serde_json::json!({
        "message": "Logged out"
    }));
    clear_session_cookies(&mut response, &cookies)?;

    Ok(response)
}

/// GET /api/me
///
/// Current user for the access token injected by the access guard.
///
/// # Errors
/// - 401: Missing or invalid token (handled by middleware), or the user no
///   longer exists
/// - 500: Internal server error
pub async fn get_current_user(
    claims: web::ReqData<AccessClaims>,
    identities: web::Data<dyn IdentityProvider>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("current_user").with_user_id(claims.sub.to_string());

    let identity = match identities.find(claims.sub).await? {
        Some(identity) => identity,
        None => {
            let e = AppError::from(AuthError::UnknownIdentity);
            context.log_error(&e);
            return Err(e);
        }
    };

    Ok(HttpResponse::Ok().json(UserResponse {
        id: identity.user_id.to_string(),
        email: identity.email,
        name: identity.name,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_session_response_serializes_timestamps() {
        let expiry = Utc.with_ymd_and_hms(2030, 1, 2, 3, 4, 5).unwrap();
        let response = SessionResponse {
            user_id: Uuid::nil(),
            csrf_token: "csrf".to_string(),
            access_expires_at: expiry,
            session_expires_at: expiry,
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["session_expires_at"], "2030-01-02T03:04:05Z");
        assert_eq!(json["access_expires_at"], "2030-01-02T03:04:05Z");
        assert_eq!(json["csrf_token"], "csrf");
    }
}
