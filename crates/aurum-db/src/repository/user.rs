//! # User Repository
//!
//! Persistence for the accounts behind the auth layer. Password hashing and
//! token issuance live in the application; this repository only stores and
//! retrieves the already-hashed credential.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use aurum_core::User;

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Inserts a new user.
    pub async fn insert(&self, user: &User) -> DbResult<()> {
        debug!(email = %user.email, "Inserting user");

        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password_hash, role, last_login, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(user.last_login)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a user by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, role, last_login, created_at, updated_at
            FROM users
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Gets a user by email.
    pub async fn get_by_email(&self, email: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, role, last_login, created_at, updated_at
            FROM users
            WHERE email = ?1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Whether the email is already registered.
    pub async fn email_exists(&self, email: &str) -> DbResult<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = ?1")
            .bind(email)
            .fetch_one(&self.pool)
            .await?;

        Ok(count > 0)
    }

    /// Records a successful login.
    pub async fn touch_last_login(&self, id: &str) -> DbResult<()> {
        let now = Utc::now();

        let result =
            sqlx::query("UPDATE users SET last_login = ?2, updated_at = ?2 WHERE id = ?1")
                .bind(id)
                .bind(now)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        Ok(())
    }

    /// Replaces the stored password hash.
    pub async fn update_password(&self, id: &str, password_hash: &str) -> DbResult<()> {
        debug!(id = %id, "Updating password hash");

        let result =
            sqlx::query("UPDATE users SET password_hash = ?2, updated_at = ?3 WHERE id = ?1")
                .bind(id)
                .bind(password_hash)
                .bind(Utc::now())
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        Ok(())
    }

    /// Lists all users, oldest first.
    pub async fn list(&self) -> DbResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, role, last_login, created_at, updated_at
            FROM users
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use aurum_core::Role;
    use uuid::Uuid;

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn make_user(email: &str, role: Role) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4().to_string(),
            name: "Ana Costa".to_string(),
            email: email.to_string(),
            password_hash: "$argon2id$stub".to_string(),
            role,
            last_login: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_and_fetch() {
        let db = setup().await;
        let user = make_user("ana@example.com", Role::Admin);
        db.users().insert(&user).await.unwrap();

        let fetched = db.users().get_by_email("ana@example.com").await.unwrap().unwrap();
        assert_eq!(fetched.id, user.id);
        assert_eq!(fetched.role, Role::Admin);
        assert!(fetched.last_login.is_none());

        assert!(db.users().email_exists("ana@example.com").await.unwrap());
        assert!(!db.users().email_exists("nobody@example.com").await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected() {
        let db = setup().await;
        db.users()
            .insert(&make_user("ana@example.com", Role::User))
            .await
            .unwrap();

        let err = db
            .users()
            .insert(&make_user("ana@example.com", Role::User))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_touch_last_login() {
        let db = setup().await;
        let user = make_user("ana@example.com", Role::User);
        db.users().insert(&user).await.unwrap();

        db.users().touch_last_login(&user.id).await.unwrap();

        let fetched = db.users().get_by_id(&user.id).await.unwrap().unwrap();
        assert!(fetched.last_login.is_some());

        let err = db.users().touch_last_login("missing").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_update_password() {
        let db = setup().await;
        let user = make_user("ana@example.com", Role::User);
        db.users().insert(&user).await.unwrap();

        db.users()
            .update_password(&user.id, "$argon2id$new")
            .await
            .unwrap();

        let fetched = db.users().get_by_id(&user.id).await.unwrap().unwrap();
        assert_eq!(fetched.password_hash, "$argon2id$new");
    }

    #[tokio::test]
    async fn test_list() {
        let db = setup().await;
        db.users()
            .insert(&make_user("a@example.com", Role::Admin))
            .await
            .unwrap();
        db.users()
            .insert(&make_user("b@example.com", Role::User))
            .await
            .unwrap();

        let users = db.users().list().await.unwrap();
        assert_eq!(users.len(), 2);
    }
}
