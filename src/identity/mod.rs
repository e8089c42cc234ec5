/// Identity verification
///
/// Resolves credentials to a stable user id. The session layer only ever
/// receives the resolved `VerifiedIdentity`.

mod memory;
mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppError;

pub use memory::InMemoryIdentityProvider;
pub use postgres::PgIdentityProvider;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct VerifiedIdentity {
    pub user_id: Uuid,
    pub email: String,
    pub name: String,
}

/// Already validated registration input
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password: String,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Create a user; duplicate emails are a unique-constraint store error
    async fn register(&self, new_user: NewUser) -> Result<VerifiedIdentity, AppError>;

    /// Check `password` for `email`
    ///
    /// Fails with `UnknownIdentity` when no such user exists and
    /// `InvalidCredentials` on a wrong password. Both answer identically over
    /// HTTP.
    async fn verify_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<VerifiedIdentity, AppError>;

    async fn find(&self, user_id: Uuid) -> Result<Option<VerifiedIdentity>, AppError>;
}
