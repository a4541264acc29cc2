use sqlx::{FromRow, PgPool};

use crate::repos::error::RepoResult;

/// Read-only access to the banking user directory.
///
/// The schema is assumed to have at least:
/// - users.username (text), users.password (text), users.role (text)
/// - users.customer_id (nullable; NULL for staff/admin users)
/// - accounts.account_id, accounts.customer_id
#[derive(Clone, Debug)]
pub struct UserRepo {
    pool: PgPool,
}

#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub username: String,
    pub role: String,
    pub customer_id: Option<String>,
    /// Comma-joined account ids; NULL when the customer has no accounts.
    pub account_numbers: Option<String>,
}

impl UserRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Match a username/password pair and aggregate the customer's accounts.
    pub async fn find_by_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> RepoResult<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT
                u.username,
                u.role,
                u.customer_id::text AS customer_id,
                string_agg(a.account_id::text, ',' ORDER BY a.account_id) AS account_numbers
            FROM users u
            LEFT JOIN accounts a ON a.customer_id = u.customer_id
            WHERE u.username = $1
                AND u.password = $2
            GROUP BY u.username, u.role, u.customer_id
            LIMIT 1
            "#,
        )
        .bind(username)
        .bind(password)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }
}
