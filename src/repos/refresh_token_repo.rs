use sqlx::PgPool;

use crate::repos::error::RepoResult;

/// DB access for the refresh token registry.
///
/// Notes:
/// - One row per issued refresh token, holding the signed token string itself.
/// - Expiry lives inside the token, so the table has no expiry column.
/// - The schema is assumed to be:
///   - refresh_token_store.refresh_token (text, primary key)
#[derive(Clone, Debug)]
pub struct RefreshTokenRepo {
    pool: PgPool,
}

impl RefreshTokenRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Register an issued refresh token.
    ///
    /// Two logins by the same user within one second sign the same token, so an
    /// already registered token is left as is.
    pub async fn insert(&self, refresh_token: &str) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO refresh_token_store (refresh_token)
            VALUES ($1)
            ON CONFLICT (refresh_token) DO NOTHING
            "#,
        )
        .bind(refresh_token)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn contains(&self, refresh_token: &str) -> RepoResult<bool> {
        let found = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM refresh_token_store
                WHERE refresh_token = $1
            )
            "#,
        )
        .bind(refresh_token)
        .fetch_one(&self.pool)
        .await?;

        Ok(found)
    }
}
