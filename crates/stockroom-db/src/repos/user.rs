//! User repository: identities, credentials, roles and refresh sessions

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::store::CredentialStore;
use crate::{
    DbError, DbRefreshSession, DbResult, DbUser, DbUserSecurity, NewRefreshSession, NewUserBundle,
    RefreshRotation,
};

const USER_COLUMNS: &str = "id, email, status, email_verified, created_at, updated_at, deleted_at";

const SESSION_COLUMNS: &str =
    "id, user_id, device_id, token_hash, created_at, expires_at, last_used_at, revoked_at";

/// User repository for authentication and session management
#[derive(Clone)]
pub struct UserRepo {
    pool: PgPool,
}

impl UserRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for UserRepo {
    async fn find_user_by_email(&self, email: &str) -> DbResult<Option<DbUser>> {
        let user = sqlx::query_as::<_, DbUser>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1 AND deleted_at IS NULL"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> DbResult<Option<DbUser>> {
        let user = sqlx::query_as::<_, DbUser>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_security(&self, user_id: Uuid) -> DbResult<Option<DbUserSecurity>> {
        let security = sqlx::query_as::<_, DbUserSecurity>(
            "SELECT id, user_id, password_hash, updated_at FROM user_securities WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(security)
    }

    async fn create_user_bundle(&self, bundle: NewUserBundle) -> DbResult<DbUser> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::Transaction(e.to_string()))?;

        let user = sqlx::query_as::<_, DbUser>(&format!(
            r#"
            INSERT INTO users (email, status, email_verified)
            VALUES ($1, $2, $3)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&bundle.email)
        .bind(&bundle.status)
        .bind(bundle.email_verified)
        .fetch_one(&mut *tx)
        .await
        .map_err(DbError::from_write)?;

        sqlx::query("INSERT INTO user_profiles (user_id, full_name) VALUES ($1, $2)")
            .bind(user.id)
            .bind(&bundle.full_name)
            .execute(&mut *tx)
            .await
            .map_err(DbError::from_write)?;

        sqlx::query("INSERT INTO user_securities (user_id, password_hash) VALUES ($1, $2)")
            .bind(user.id)
            .bind(&bundle.password_hash)
            .execute(&mut *tx)
            .await
            .map_err(DbError::from_write)?;

        sqlx::query("INSERT INTO user_roles (user_id, role) VALUES ($1, $2)")
            .bind(user.id)
            .bind(&bundle.role)
            .execute(&mut *tx)
            .await
            .map_err(DbError::from_write)?;

        // Dropping `tx` on any early return above rolls the bundle back.
        tx.commit()
            .await
            .map_err(|e| DbError::Transaction(e.to_string()))?;

        Ok(user)
    }

    async fn update_password(&self, user_id: Uuid, password_hash: &str) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE user_securities SET password_hash = $2, updated_at = NOW() WHERE user_id = $1",
        )
        .bind(user_id)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("credentials for user {}", user_id)));
        }

        Ok(())
    }

    async fn find_role(&self, user_id: Uuid) -> DbResult<Option<String>> {
        let role: Option<String> =
            sqlx::query_scalar("SELECT role FROM user_roles WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(role)
    }

    async fn assign_role(&self, user_id: Uuid, role: &str) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO user_roles (user_id, role)
            VALUES ($1, $2)
            ON CONFLICT (user_id)
            DO UPDATE SET role = EXCLUDED.role, updated_at = NOW()
            "#,
        )
        .bind(user_id)
        .bind(role)
        .execute(&self.pool)
        .await
        .map_err(DbError::from_write)?;

        Ok(())
    }

    async fn upsert_refresh_session(&self, session: NewRefreshSession) -> DbResult<DbRefreshSession> {
        let stored = sqlx::query_as::<_, DbRefreshSession>(&format!(
            r#"
            INSERT INTO refresh_sessions (user_id, device_id, token_hash, expires_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, device_id)
            DO UPDATE SET
                token_hash = EXCLUDED.token_hash,
                expires_at = EXCLUDED.expires_at,
                last_used_at = NOW(),
                revoked_at = NULL
            RETURNING {SESSION_COLUMNS}
            "#
        ))
        .bind(session.user_id)
        .bind(&session.device_id)
        .bind(&session.token_hash)
        .bind(session.expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(DbError::from_write)?;

        Ok(stored)
    }

    async fn find_refresh_session(
        &self,
        token_hash: &str,
        device_id: &str,
    ) -> DbResult<Option<DbRefreshSession>> {
        let session = sqlx::query_as::<_, DbRefreshSession>(&format!(
            "SELECT {SESSION_COLUMNS} FROM refresh_sessions WHERE token_hash = $1 AND device_id = $2"
        ))
        .bind(token_hash)
        .bind(device_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    async fn rotate_refresh_session(&self, rotation: RefreshRotation) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE refresh_sessions
            SET token_hash = $3, expires_at = $4, last_used_at = NOW()
            WHERE id = $1 AND token_hash = $2 AND revoked_at IS NULL
            "#,
        )
        .bind(rotation.session_id)
        .bind(&rotation.expected_hash)
        .bind(&rotation.new_hash)
        .bind(rotation.expires_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn revoke_refresh_session(&self, token_hash: &str) -> DbResult<u64> {
        let result = sqlx::query(
            "UPDATE refresh_sessions SET revoked_at = NOW() WHERE token_hash = $1 AND revoked_at IS NULL",
        )
        .bind(token_hash)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn revoke_refresh_session_for_device(&self, user_id: Uuid, device_id: &str) -> DbResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE refresh_sessions SET revoked_at = NOW()
            WHERE user_id = $1 AND device_id = $2 AND revoked_at IS NULL
            "#,
        )
        .bind(user_id)
        .bind(device_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn ping(&self) -> DbResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
