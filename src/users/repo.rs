use sqlx::PgPool;
use uuid::Uuid;

use crate::users::repo_types::User;

impl User {
    /// Find a user by email (exact match, case-sensitive as stored).
    pub async fn find_by_email(db: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, role, is_verified,
                   verification_token, verification_sent_at, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, role, is_verified,
                   verification_token, verification_sent_at, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await
    }

    /// Create a new unverified user with a hashed password and default role.
    pub async fn create(
        db: &PgPool,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, name, email, password_hash, role, is_verified,
                      verification_token, verification_sent_at, created_at
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .fetch_one(db)
        .await
    }

    /// Attach a fresh verification token, stamping its issue time for the
    /// verification TTL and the resend path.
    pub async fn set_verification_token(
        db: &PgPool,
        id: Uuid,
        token: &str,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET verification_token = $2, verification_sent_at = now()
            WHERE id = $1
            RETURNING id, name, email, password_hash, role, is_verified,
                      verification_token, verification_sent_at, created_at
            "#,
        )
        .bind(id)
        .bind(token)
        .fetch_one(db)
        .await
    }

    pub async fn find_by_verification_token(
        db: &PgPool,
        token: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, role, is_verified,
                   verification_token, verification_sent_at, created_at
            FROM users
            WHERE verification_token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(db)
        .await
    }

    /// Flip the account to verified and clear the token in one statement, so
    /// a token can only ever be consumed once. Returns `None` when the token
    /// was already used (or never existed).
    pub async fn consume_verification_token(
        db: &PgPool,
        token: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET is_verified = TRUE, verification_token = NULL, verification_sent_at = NULL
            WHERE verification_token = $1
            RETURNING id, name, email, password_hash, role, is_verified,
                      verification_token, verification_sent_at, created_at
            "#,
        )
        .bind(token)
        .fetch_optional(db)
        .await
    }
}
