/// Session cookies and the CSRF header
///
/// Both token cookies are HttpOnly and scoped to `/`; `Secure`, `SameSite`
/// and `Domain` follow configuration.

use actix_web::cookie::{time::Duration, Cookie, SameSite};
use actix_web::HttpRequest;
use chrono::Utc;

use crate::auth::IssuedCredentials;
use crate::configuration::{CookieSettings, SameSitePolicy};

pub const ACCESS_COOKIE: &str = "access_token";
pub const REFRESH_COOKIE: &str = "refresh_token";
pub const CSRF_HEADER: &str = "X-CSRF-Token";

#[derive(Clone, Debug)]
pub struct CookiePolicy {
    settings: CookieSettings,
}

impl CookiePolicy {
    pub fn new(settings: CookieSettings) -> Self {
        Self { settings }
    }

    /// Cookies carrying a freshly issued access/refresh pair
    pub fn session_cookies(&self, credentials: &IssuedCredentials) -> [Cookie<'static>; 2] {
        let now = Utc::now();
        let access_max_age = (credentials.access_expires_at - now).num_seconds().max(0);
        let refresh_max_age = (credentials.refresh_expires_at - now).num_seconds().max(0);

        [
            self.build(ACCESS_COOKIE, credentials.access_token.clone(), access_max_age),
            self.build(REFRESH_COOKIE, credentials.refresh_token.clone(), refresh_max_age),
        ]
    }

    /// Cookies that make the browser drop both tokens
    pub fn removal_cookies(&self) -> [Cookie<'static>; 2] {
        [ACCESS_COOKIE, REFRESH_COOKIE].map(|name| {
            let mut cookie = self.build(name, String::new(), 0);
            cookie.make_removal();
            cookie
        })
    }

    fn build(&self, name: &'static str, value: String, max_age_seconds: i64) -> Cookie<'static> {
        let same_site = match self.settings.same_site {
            SameSitePolicy::Lax => SameSite::Lax,
            SameSitePolicy::Strict => SameSite::Strict,
        };

        let mut cookie = Cookie::build(name, value)
            .path("/")
            .http_only(true)
            .secure(self.settings.secure)
            .same_site(same_site)
            .max_age(Duration::seconds(max_age_seconds))
            .finish();

        if let Some(domain) = &self.settings.domain {
            cookie.set_domain(domain.clone());
        }

        cookie
    }
}

pub fn read_cookie(req: &HttpRequest, name: &str) -> Option<String> {
    req.cookie(name)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}

pub fn read_csrf_header(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get(CSRF_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

/// `Authorization: Bearer <token>`, for non-browser clients
pub fn read_bearer_token(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get("Authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_string)
}
