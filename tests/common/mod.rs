//! Shared harness: the real server on a random port over in-memory adapters

#![allow(dead_code)]

use reqwest::header::{HeaderMap, COOKIE, SET_COOKIE};
use serde_json::{json, Value};
use session_lifecycle::auth::CredentialIssuer;
use session_lifecycle::configuration::{CookieSettings, SameSitePolicy, SessionSettings};
use session_lifecycle::identity::{IdentityProvider, InMemoryIdentityProvider};
use session_lifecycle::session::SessionController;
use session_lifecycle::startup::run;
use session_lifecycle::store::{InMemorySessionStore, SessionStore};
use std::net::TcpListener;
use std::sync::Arc;

pub const PASSWORD: &str = "SecurePass123";

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
    pub store: Arc<InMemorySessionStore>,
}

/// Tokens a browser would hold after a session response
#[derive(Debug, Clone)]
pub struct SessionCookies {
    pub access_token: String,
    pub refresh_token: String,
    pub csrf_token: String,
}

impl SessionCookies {
    pub fn cookie_header(&self) -> String {
        format!(
            "access_token={}; refresh_token={}",
            self.access_token, self.refresh_token
        )
    }
}

pub fn session_settings() -> SessionSettings {
    SessionSettings {
        access_secret: "integration-access-secret-0123456789abcdef".to_string(),
        refresh_secret: "integration-refresh-secret-0123456789abcdef".to_string(),
        csrf_secret: "integration-csrf-secret-0123456789abcdef".to_string(),
        access_token_ttl: 900,
        refresh_token_ttl: 604800,
        issuer: "session_lifecycle_tests".to_string(),
    }
}

pub fn spawn_app() -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    let store = Arc::new(InMemorySessionStore::new());
    let sessions = SessionController::new(
        CredentialIssuer::new(&session_settings()),
        store.clone() as Arc<dyn SessionStore>,
    );
    let identities: Arc<dyn IdentityProvider> = Arc::new(InMemoryIdentityProvider::with_cost(4));
    let cookies = CookieSettings {
        secure: false,
        same_site: SameSitePolicy::Lax,
        domain: None,
    };

    let server = run(listener, sessions, identities, cookies).expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        client: reqwest::Client::new(),
        store,
    }
}

/// `name -> value` pairs from every `Set-Cookie` header
pub fn set_cookies(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| value.split(';').next())
        .filter_map(|pair| pair.split_once('='))
        .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
        .collect()
}

pub fn set_cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    set_cookies(headers)
        .into_iter()
        .find(|(cookie, _)| cookie == name)
        .map(|(_, value)| value)
}

impl TestApp {
    pub async fn register(&self, email: &str) -> reqwest::Response {
        self.client
            .post(&format!("{}/auth/register", self.address))
            .json(&json!({
                "name": "Ursula Le Guin",
                "email": email,
                "password": PASSWORD
            }))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn login(&self, email: &str, password: &str) -> reqwest::Response {
        self.client
            .post(&format!("{}/auth/login", self.address))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn refresh(&self, refresh_token: &str) -> reqwest::Response {
        self.client
            .post(&format!("{}/auth/refresh", self.address))
            .header(COOKIE, format!("refresh_token={}", refresh_token))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn logout(&self, session: &SessionCookies, csrf: Option<&str>) -> reqwest::Response {
        let mut request = self
            .client
            .post(&format!("{}/auth/logout", self.address))
            .header(COOKIE, session.cookie_header());
        if let Some(csrf) = csrf {
            request = request.header("X-CSRF-Token", csrf);
        }
        request.send().await.expect("Failed to execute request.")
    }

    pub async fn me(&self, session: &SessionCookies) -> reqwest::Response {
        self.client
            .get(&format!("{}/api/me", self.address))
            .header(COOKIE, session.cookie_header())
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// Register `email` and return the session the registration started
    pub async fn signed_up(&self, email: &str) -> SessionCookies {
        let response = self.register(email).await;
        assert_eq!(201, response.status().as_u16());
        session_from(response).await
    }
}

/// Read the cookies and CSRF token of a successful session response
pub async fn session_from(response: reqwest::Response) -> SessionCookies {
    let headers = response.headers().clone();
    let body: Value = response.json().await.expect("Failed to parse response");

    let csrf_token = body["csrf_token"].as_str().expect("csrf_token missing").to_string();
    assert_eq!(
        headers.get("X-CSRF-Token").and_then(|v| v.to_str().ok()),
        Some(csrf_token.as_str())
    );

    SessionCookies {
        access_token: set_cookie_value(&headers, "access_token").expect("access cookie missing"),
        refresh_token: set_cookie_value(&headers, "refresh_token").expect("refresh cookie missing"),
        csrf_token,
    }
}
