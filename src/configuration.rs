use crate::error::ConfigError;

const MIN_SECRET_LENGTH: usize = 32;
const MAX_TOKEN_TTL_SECONDS: i64 = 365 * 24 * 60 * 60;

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub application: ApplicationSettings,
    pub session: SessionSettings,
    #[serde(default)]
    pub cookies: CookieSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
}

#[derive(serde::Deserialize, Clone)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    pub port: u16,
    pub host: String,
    pub database_name: String,
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database_name
        )
    }
}

/// Token signing and lifetime settings
///
/// The three secrets must be pairwise distinct so that leaking one of them
/// cannot be used to forge the other kinds of token.
#[derive(serde::Deserialize, Clone)]
pub struct SessionSettings {
    pub access_secret: String,
    pub refresh_secret: String,
    pub csrf_secret: String,
    pub access_token_ttl: i64,  // seconds (e.g., 900 for 15 minutes)
    pub refresh_token_ttl: i64, // seconds (e.g., 604800 for 7 days)
    pub issuer: String,
}

impl SessionSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let secrets = [
            ("session.access_secret", &self.access_secret),
            ("session.refresh_secret", &self.refresh_secret),
            ("session.csrf_secret", &self.csrf_secret),
        ];

        for (key, secret) in secrets {
            if secret.is_empty() {
                return Err(ConfigError::MissingRequired(key.to_string()));
            }
            if secret.len() < MIN_SECRET_LENGTH {
                return Err(ConfigError::InvalidValue(format!(
                    "{} must be at least {} bytes",
                    key, MIN_SECRET_LENGTH
                )));
            }
        }

        if self.access_secret == self.refresh_secret
            || self.access_secret == self.csrf_secret
            || self.refresh_secret == self.csrf_secret
        {
            return Err(ConfigError::InvalidValue(
                "access, refresh and csrf secrets must all differ".to_string(),
            ));
        }

        if self.access_token_ttl <= 0 || self.refresh_token_ttl <= 0 {
            return Err(ConfigError::InvalidValue(
                "token lifetimes must be positive".to_string(),
            ));
        }

        if self.access_token_ttl > MAX_TOKEN_TTL_SECONDS
            || self.refresh_token_ttl > MAX_TOKEN_TTL_SECONDS
        {
            return Err(ConfigError::InvalidValue(format!(
                "token lifetimes must not exceed {} seconds",
                MAX_TOKEN_TTL_SECONDS
            )));
        }

        if self.access_token_ttl >= self.refresh_token_ttl {
            return Err(ConfigError::InvalidValue(
                "access_token_ttl must be shorter than refresh_token_ttl".to_string(),
            ));
        }

        if self.issuer.trim().is_empty() {
            return Err(ConfigError::MissingRequired("session.issuer".to_string()));
        }

        Ok(())
    }
}

#[derive(serde::Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SameSitePolicy {
    #[default]
    Lax,
    Strict,
}

/// Attributes for the session cookies
#[derive(serde::Deserialize, Clone, Debug)]
pub struct CookieSettings {
    #[serde(default = "default_secure")]
    pub secure: bool,
    #[serde(default)]
    pub same_site: SameSitePolicy,
    #[serde(default)]
    pub domain: Option<String>,
}

fn default_secure() -> bool {
    true
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self {
            secure: default_secure(),
            same_site: SameSitePolicy::Lax,
            domain: None,
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.session.validate()
    }
}

/// Load settings from `configuration.{yaml,toml,json}` and `APP_*` variables.
///
/// Nested keys use `__`, e.g. `APP_SESSION__REFRESH_SECRET`.
pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;
    settings.try_deserialize::<Settings>()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_settings() -> SessionSettings {
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
    fn test_valid_settings() {
        assert!(session_settings().validate().is_ok());
    }

    #[test]
    fn test_shared_secret_rejected() {
        let mut settings = session_settings();
        settings.refresh_secret = settings.access_secret.clone();
        assert!(matches!(settings.validate(), Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_oversized_ttl_rejected() {
        let mut settings = session_settings();
        settings.refresh_token_ttl = i64::MAX;
        assert!(matches!(settings.validate(), Err(ConfigError::InvalidValue(_))));

        let mut settings = session_settings();
        settings.refresh_token_ttl = MAX_TOKEN_TTL_SECONDS;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_short_secret_rejected() {
        let mut settings = session_settings();
        settings.csrf_secret = "short".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_empty_secret_rejected() {
        let mut settings = session_settings();
        settings.access_secret = String::new();
        assert!(matches!(settings.validate(), Err(ConfigError::MissingRequired(_))));
    }

    #[test]
    fn test_access_ttl_must_be_shorter() {
        let mut settings = session_settings();
        settings.access_token_ttl = settings.refresh_token_ttl;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_cookie_defaults() {
        let cookies = CookieSettings::default();
        assert!(cookies.secure);
        assert_eq!(cookies.same_site, SameSitePolicy::Lax);
        assert!(cookies.domain.is_none());
    }
}
