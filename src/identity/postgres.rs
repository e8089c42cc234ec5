use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use super::{IdentityProvider, NewUser, VerifiedIdentity};
use crate::auth::{hash_password, verify_password, DEFAULT_COST};
use crate::error::{AppError, AuthError};

/// `users` table backed identities
#[derive(Clone)]
pub struct PgIdentityProvider {
    pool: PgPool,
}

impl PgIdentityProvider {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityProvider for PgIdentityProvider {
    async fn register(&self, new_user: NewUser) -> Result<VerifiedIdentity, AppError> {
        let password_hash = hash_password(&new_user.password, DEFAULT_COST)?;
        let user_id = Uuid::new_v4();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO users (id, email, name, password_hash, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(user_id)
        .bind(&new_user.email)
        .bind(&new_user.name)
        .bind(&password_hash)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(VerifiedIdentity {
            user_id,
            email: new_user.email,
            name: new_user.name,
        })
    }

    async fn verify_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<VerifiedIdentity, AppError> {
        let (user_id, email, name, password_hash, is_active) =
            sqlx::query_as::<_, (Uuid, String, String, String, bool)>(
                "SELECT id, email, name, password_hash, is_active FROM users WHERE email = $1",
            )
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AuthError::UnknownIdentity)?;

        if !verify_password(password, &password_hash)? {
            return Err(AuthError::InvalidCredentials.into());
        }

        if !is_active {
            return Err(AuthError::AccountInactive.into());
        }

        Ok(VerifiedIdentity {
            user_id,
            email,
            name,
        })
    }

    async fn find(&self, user_id: Uuid) -> Result<Option<VerifiedIdentity>, AppError> {
        let row = sqlx::query_as::<_, (Uuid, String, String)>(
            "SELECT id, email, name FROM users WHERE id = $1 AND is_active = true",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(user_id, email, name)| VerifiedIdentity {
            user_id,
            email,
            name,
        }))
    }
}
