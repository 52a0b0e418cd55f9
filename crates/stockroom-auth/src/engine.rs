//! Authentication engine
//!
//! Orchestrates signup, signin, password change, refresh rotation, role
//! change and signout over the credential store, the password hasher and
//! the token issuer.

use std::sync::Arc;

use chrono::Utc;
use stockroom_db::{
    user_status, CredentialStore, DbUser, NewRefreshSession, NewUserBundle, RefreshRotation,
    SessionStore,
};
use uuid::Uuid;
use validator::ValidateEmail;
use zeroize::Zeroizing;

use crate::config::AuthConfig;
use crate::error::{AuthError, AuthResult};
use crate::jwt::TokenIssuer;
use crate::password::PasswordService;
use crate::session::{generate_refresh_token, hash_token};
use crate::types::{Role, TokenClass, TokenPair};

/// New account details
#[derive(Clone)]
pub struct SignupInput {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

impl std::fmt::Debug for SignupInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignupInput")
            .field("email", &self.email)
            .field("full_name", &self.full_name)
            .finish_non_exhaustive()
    }
}

/// Authentication engine
#[derive(Clone)]
pub struct AuthEngine {
    credentials: Arc<dyn CredentialStore>,
    issuer: TokenIssuer,
    passwords: PasswordService,
    refresh_lifetime: chrono::Duration,
}

impl AuthEngine {
    pub fn new(
        config: &AuthConfig,
        credentials: Arc<dyn CredentialStore>,
        sessions: Arc<dyn SessionStore>,
    ) -> AuthResult<Self> {
        let refresh_lifetime = chrono::Duration::from_std(config.jwt.refresh_token_lifetime)
            .map_err(|e| AuthError::Internal(format!("refresh lifetime out of range: {}", e)))?;

        Ok(Self {
            credentials,
            issuer: TokenIssuer::new(&config.jwt, sessions),
            passwords: PasswordService::new(config.password.clone()),
            refresh_lifetime,
        })
    }

    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    /// Register a new active, verified user with the default role.
    pub async fn signup(&self, input: SignupInput) -> AuthResult<DbUser> {
        if !input.email.validate_email() {
            return Err(AuthError::Validation("email is not a valid address".to_string()));
        }
        if input.full_name.trim().is_empty() {
            return Err(AuthError::Validation("full_name is required".to_string()));
        }
        self.passwords.validate_password(&input.password)?;

        if self.credentials.find_user_by_email(&input.email).await?.is_some() {
            return Err(AuthError::DuplicateEmail);
        }

        let password_hash = self.hash(input.password).await?;

        let user = self
            .credentials
            .create_user_bundle(NewUserBundle {
                email: input.email,
                status: user_status::ACTIVE.to_string(),
                email_verified: true,
                full_name: input.full_name,
                password_hash,
                role: Role::default().as_str().to_string(),
            })
            .await?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Check credentials and open (or replace) the session for `device_id`.
    pub async fn signin(&self, email: &str, password: &str, device_id: &str) -> AuthResult<TokenPair> {
        let Some(user) = self.credentials.find_user_by_email(email).await? else {
            tracing::info!(reason = "unknown_email", "Signin rejected");
            return Err(AuthError::InvalidCredentials);
        };

        let Some(security) = self.credentials.find_security(user.id).await? else {
            tracing::warn!(user_id = %user.id, reason = "missing_credentials", "Signin rejected");
            return Err(AuthError::InvalidCredentials);
        };

        if !self.verify(password, security.password_hash).await? {
            tracing::info!(user_id = %user.id, reason = "wrong_password", "Signin rejected");
            return Err(AuthError::InvalidCredentials);
        }

        if !user.is_active() {
            tracing::info!(user_id = %user.id, status = %user.status, reason = "inactive", "Signin rejected");
            return Err(AuthError::InvalidCredentials);
        }

        let role = self.resolve_role(user.id).await?;
        let access_token = self
            .issuer
            .issue(user.id, &user.email, role, TokenClass::Access)
            .await?;
        let refresh_token = self
            .issuer
            .issue(user.id, &user.email, role, TokenClass::Refresh)
            .await?;

        let session = NewRefreshSession {
            user_id: user.id,
            device_id: device_id.to_string(),
            token_hash: hash_token(&refresh_token),
            expires_at: Utc::now() + self.refresh_lifetime,
        };
        if let Err(e) = self.credentials.upsert_refresh_session(session).await {
            tracing::error!(user_id = %user.id, device_id = %device_id, error = %e, "Failed to store refresh session");
            self.withdraw(&access_token).await;
            self.withdraw(&refresh_token).await;
            return Err(e.into());
        }

        tracing::info!(user_id = %user.id, device_id = %device_id, role = %role, "User signed in");
        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Replace the password after checking the current one.
    ///
    /// Existing sessions and tokens stay valid.
    pub async fn change_password(&self, user_id: Uuid, old_password: &str, new_password: &str) -> AuthResult<()> {
        let security = self
            .credentials
            .find_security(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !self.verify(old_password, security.password_hash).await? {
            tracing::info!(user_id = %user_id, "Password change rejected");
            return Err(AuthError::InvalidCredentials);
        }

        self.passwords.validate_password(new_password)?;
        let new_hash = self.hash(new_password.to_string()).await?;
        self.credentials.update_password(user_id, &new_hash).await?;

        tracing::info!(user_id = %user_id, "Password changed");
        Ok(())
    }

    /// Exchange a refresh token for a new pair, rotating the stored hash.
    ///
    /// Rotation is a compare-and-swap on the presented hash: of two
    /// concurrent refreshes with the same token at most one succeeds, and
    /// the loser's freshly minted access token is withdrawn.
    pub async fn refresh(&self, refresh_token: &str, device_id: &str) -> AuthResult<TokenPair> {
        let presented_hash = hash_token(refresh_token);

        let session = self
            .credentials
            .find_refresh_session(&presented_hash, device_id)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        if session.is_revoked() {
            tracing::info!(user_id = %session.user_id, device_id = %device_id, "Refresh with revoked session");
            return Err(AuthError::TokenRevoked);
        }
        if session.is_expired_at(Utc::now()) {
            return Err(AuthError::TokenExpired);
        }

        let user = self
            .credentials
            .find_user_by_id(session.user_id)
            .await?
            .filter(DbUser::is_active)
            .ok_or(AuthError::InvalidToken)?;
        let role = self.resolve_role(user.id).await?;

        let access_token = self
            .issuer
            .issue(user.id, &user.email, role, TokenClass::Access)
            .await?;
        let refresh_token = generate_refresh_token();

        let rotation = RefreshRotation {
            session_id: session.id,
            expected_hash: presented_hash,
            new_hash: hash_token(&refresh_token),
            expires_at: Utc::now() + self.refresh_lifetime,
        };

        match self.credentials.rotate_refresh_session(rotation).await {
            Ok(true) => {
                tracing::info!(user_id = %user.id, device_id = %device_id, "Refresh token rotated");
                Ok(TokenPair {
                    access_token,
                    refresh_token,
                })
            }
            Ok(false) => {
                tracing::warn!(user_id = %user.id, device_id = %device_id, "Refresh rotation lost a race");
                self.withdraw(&access_token).await;
                Err(AuthError::TokenRevoked)
            }
            Err(e) => {
                self.withdraw(&access_token).await;
                Err(e.into())
            }
        }
    }

    /// Overwrite the user's role assignment.
    pub async fn change_role(&self, user_id: Uuid, role: Role) -> AuthResult<()> {
        if self.credentials.find_user_by_id(user_id).await?.is_none() {
            return Err(AuthError::UserNotFound);
        }

        self.credentials.assign_role(user_id, role.as_str()).await?;

        tracing::info!(user_id = %user_id, role = %role, "Role changed");
        Ok(())
    }

    /// Revoke the refresh session holding this token.
    ///
    /// Access tokens already issued stay in the ledger until they expire.
    pub async fn signout(&self, refresh_token: &str) -> AuthResult<()> {
        let revoked = self
            .credentials
            .revoke_refresh_session(&hash_token(refresh_token))
            .await?;

        if revoked == 0 {
            tracing::debug!("Signout matched no active session");
        } else {
            tracing::info!(sessions = revoked, "Signed out");
        }
        Ok(())
    }

    /// Revoke the user's refresh session on `device_id`.
    pub async fn signout_device(&self, user_id: Uuid, device_id: &str) -> AuthResult<()> {
        let revoked = self
            .credentials
            .revoke_refresh_session_for_device(user_id, device_id)
            .await?;

        if revoked == 0 {
            tracing::debug!(user_id = %user_id, device_id = %device_id, "Signout matched no active session");
        } else {
            tracing::info!(user_id = %user_id, device_id = %device_id, "Signed out");
        }
        Ok(())
    }

    /// Missing assignment means the default role.
    async fn resolve_role(&self, user_id: Uuid) -> AuthResult<Role> {
        match self.credentials.find_role(user_id).await? {
            None => Ok(Role::default()),
            Some(raw) => raw.parse::<Role>().or_else(|_| {
                tracing::warn!(user_id = %user_id, role = %raw, "Unknown stored role, using default");
                Ok(Role::default())
            }),
        }
    }

    async fn withdraw(&self, token: &str) {
        if let Err(e) = self.issuer.revoke(token).await {
            tracing::error!(error = %e, "Failed to withdraw issued token");
        }
    }

    async fn hash(&self, password: String) -> AuthResult<String> {
        let passwords = self.passwords.clone();
        let password = Zeroizing::new(password);
        tokio::task::spawn_blocking(move || passwords.hash_password(&password))
            .await
            .map_err(|e| AuthError::Internal(format!("hashing task failed: {}", e)))?
    }

    async fn verify(&self, password: &str, hash: String) -> AuthResult<bool> {
        let passwords = self.passwords.clone();
        let password = Zeroizing::new(password.to_string());
        tokio::task::spawn_blocking(move || passwords.verify_password(&password, &hash))
            .await
            .map_err(|e| AuthError::Internal(format!("verification task failed: {}", e)))?
    }
}
