use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use uuid::Uuid;

use super::{IdentityProvider, NewUser, VerifiedIdentity};
use crate::auth::{hash_password, verify_password, DEFAULT_COST};
use crate::error::{AppError, AuthError, StoreError};

struct StoredUser {
    identity: VerifiedIdentity,
    password_hash: String,
}

/// Process-local identities keyed by email
pub struct InMemoryIdentityProvider {
    users: RwLock<HashMap<String, StoredUser>>,
    cost: u32,
}

impl InMemoryIdentityProvider {
    pub fn new() -> Self {
        Self::with_cost(DEFAULT_COST)
    }

    /// Use a custom bcrypt cost (tests use the minimum, 4)
    pub fn with_cost(cost: u32) -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            cost,
        }
    }
}

impl Default for InMemoryIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned() -> AppError {
    StoreError::Unexpected("identity store lock poisoned".to_string()).into()
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn register(&self, new_user: NewUser) -> Result<VerifiedIdentity, AppError> {
        let password_hash = hash_password(&new_user.password, self.cost)?;
        let mut users = self.users.write().map_err(|_| poisoned())?;

        if users.contains_key(&new_user.email) {
            return Err(StoreError::UniqueConstraintViolation(
                "Email already registered".to_string(),
            )
            .into());
        }

        let identity = VerifiedIdentity {
            user_id: Uuid::new_v4(),
            email: new_user.email.clone(),
            name: new_user.name,
        };
        users.insert(
            new_user.email,
            StoredUser {
                identity: identity.clone(),
                password_hash,
            },
        );

        Ok(identity)
    }

    async fn verify_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<VerifiedIdentity, AppError> {
        let (identity, password_hash) = {
            let users = self.users.read().map_err(|_| poisoned())?;
            let user = users.get(email).ok_or(AuthError::UnknownIdentity)?;
            (user.identity.clone(), user.password_hash.clone())
        };

        if !verify_password(password, &password_hash)? {
            return Err(AuthError::InvalidCredentials.into());
        }

        Ok(identity)
    }

    async fn find(&self, user_id: Uuid) -> Result<Option<VerifiedIdentity>, AppError> {
        let users = self.users.read().map_err(|_| poisoned())?;
        Ok(users
            .values()
            .find(|user| user.identity.user_id == user_id)
            .map(|user| user.identity.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            name: "Ursula".to_string(),
            password: "SecurePass123".to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_and_verify() {
        let provider = InMemoryIdentityProvider::with_cost(4);
        let registered = provider.register(new_user("ursula@example.com")).await.unwrap();

        let verified = provider
            .verify_credentials("ursula@example.com", "SecurePass123")
            .await
            .unwrap();
        assert_eq!(verified, registered);

        let found = provider.find(registered.user_id).await.unwrap();
        assert_eq!(found, Some(registered));
    }

    #[tokio::test]
    async fn test_failures_are_classified() {
        let provider = InMemoryIdentityProvider::with_cost(4);
        provider.register(new_user("ursula@example.com")).await.unwrap();

        let wrong_password = provider
            .verify_credentials("ursula@example.com", "WrongPass123")
            .await
            .unwrap_err();
        assert!(matches!(wrong_password, AppError::Auth(AuthError::InvalidCredentials)));

        let unknown = provider
            .verify_credentials("nobody@example.com", "SecurePass123")
            .await
            .unwrap_err();
        assert!(matches!(unknown, AppError::Auth(AuthError::UnknownIdentity)));
    }

    #[tokio::test]
    async fn test_duplicate_email() {
        let provider = InMemoryIdentityProvider::with_cost(4);
        provider.register(new_user("ursula@example.com")).await.unwrap();

        let err = provider.register(new_user("ursula@example.com")).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Store(StoreError::UniqueConstraintViolation(_))
        ));
    }
}
