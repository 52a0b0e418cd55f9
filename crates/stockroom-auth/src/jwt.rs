//! Token issuer
//!
//! Signs HS256 tokens for the two token classes and keeps the issued-token
//! ledger in the session store: every issued token is written as
//! `token -> user_id` with the class lifetime as TTL, and a token that is
//! not in the ledger is never accepted, whatever its signature says.

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::sync::Arc;
use std::time::Duration;
use stockroom_db::SessionStore;
use uuid::Uuid;

use crate::config::JwtConfig;
use crate::error::{AuthError, AuthResult};
use crate::types::{Role, TokenClaims, TokenClass};

/// Signing material and lifetime for one token class
#[derive(Clone)]
struct ClassKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    lifetime: Duration,
}

impl ClassKeys {
    fn new(secret: &str, lifetime: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            lifetime,
        }
    }
}

/// Issues, verifies and revokes bearer tokens
#[derive(Clone)]
pub struct TokenIssuer {
    access: ClassKeys,
    refresh: ClassKeys,
    issuer: String,
    ledger: Arc<dyn SessionStore>,
}

impl TokenIssuer {
    pub fn new(config: &JwtConfig, ledger: Arc<dyn SessionStore>) -> Self {
        Self {
            access: ClassKeys::new(&config.access_secret, config.access_token_lifetime),
            refresh: ClassKeys::new(&config.refresh_secret, config.refresh_token_lifetime),
            issuer: config.issuer.clone(),
            ledger,
        }
    }

    fn keys(&self, class: TokenClass) -> &ClassKeys {
        match class {
            TokenClass::Access => &self.access,
            TokenClass::Refresh => &self.refresh,
        }
    }

    /// Lifetime of tokens of the given class
    pub fn lifetime(&self, class: TokenClass) -> Duration {
        self.keys(class).lifetime
    }

    /// Sign a token and register it in the ledger.
    ///
    /// The token is only returned once the ledger write succeeded.
    pub async fn issue(
        &self,
        user_id: Uuid,
        email: &str,
        role: Role,
        class: TokenClass,
    ) -> AuthResult<String> {
        let keys = self.keys(class);
        let now = Utc::now().timestamp();
        let claims = TokenClaims {
            sub: user_id.to_string(),
            iss: self.issuer.clone(),
            email: email.to_string(),
            role,
            class,
            iat: now,
            exp: now + keys.lifetime.as_secs() as i64,
            jti: Uuid::new_v4().to_string(),
        };

        let token = self.sign(&claims, class)?;

        self.ledger
            .set_ex(&token, &claims.sub, keys.lifetime)
            .await
            .map_err(|e| {
                tracing::error!(user_id = %user_id, error = %e, "Failed to register token");
                AuthError::SigningError(format!("ledger write failed: {}", e))
            })?;

        Ok(token)
    }

    /// Verify a token of the expected class.
    ///
    /// Checks run in a fixed order: ledger presence, signature (HS256 only),
    /// expiry and issuer, class, then that the ledger entry belongs to the
    /// subject.
    pub async fn verify(&self, token: &str, class: TokenClass) -> AuthResult<TokenClaims> {
        let owner = self
            .ledger
            .get(token)
            .await
            .map_err(AuthError::from)?
            .ok_or(AuthError::TokenNotRegistered)?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);
        validation.set_issuer(&[self.issuer.as_str()]);

        let claims = decode::<TokenClaims>(token, &self.keys(class).decoding, &validation)?.claims;

        if claims.class != class {
            return Err(AuthError::InvalidToken);
        }
        if owner != claims.sub {
            tracing::warn!(subject = %claims.sub, "Ledger entry does not match token subject");
            return Err(AuthError::InvalidToken);
        }

        Ok(claims)
    }

    /// Remove a token from the ledger. Returns whether it was present.
    pub async fn revoke(&self, token: &str) -> AuthResult<bool> {
        Ok(self.ledger.delete(token).await?)
    }

    fn sign(&self, claims: &TokenClaims, class: TokenClass) -> AuthResult<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.keys(class).encoding)
            .map_err(|e| AuthError::SigningError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockroom_db::mock::MemoryStores;

    fn test_config() -> JwtConfig {
        JwtConfig {
            access_secret: "access-secret-key-for-tests-min-32-bytes!".to_string(),
            refresh_secret: "refresh-secret-key-for-tests-min-32-bytes".to_string(),
            access_token_lifetime: Duration::from_secs(900),
            refresh_token_lifetime: Duration::from_secs(3600),
            issuer: "test".to_string(),
        }
    }

    fn issuer() -> (TokenIssuer, MemoryStores) {
        let stores = MemoryStores::new();
        (TokenIssuer::new(&test_config(), stores.sessions.clone()), stores)
    }

    #[tokio::test]
    async fn test_issue_and_verify() {
        let (issuer, stores) = issuer();
        let user_id = Uuid::new_v4();

        let token = issuer
            .issue(user_id, "test@example.com", Role::Admin, TokenClass::Access)
            .await
            .unwrap();
        assert!(stores.sessions.contains(&token));

        let claims = issuer.verify(&token, TokenClass::Access).await.unwrap();
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.email, "test@example.com");
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.class, TokenClass::Access);
    }

    #[tokio::test]
    async fn test_unregistered_token_rejected() {
        let (issuer, _stores) = issuer();
        let token = issuer
            .issue(Uuid::new_v4(), "a@b.co", Role::User, TokenClass::Access)
            .await
            .unwrap();

        let (other, _) = self::issuer();
        let result = other.verify(&token, TokenClass::Access).await;
        assert!(matches!(result, Err(AuthError::TokenNotRegistered)));
    }

    #[tokio::test]
    async fn test_revoked_token_rejected() {
        let (issuer, _stores) = issuer();
        let token = issuer
            .issue(Uuid::new_v4(), "a@b.co", Role::User, TokenClass::Access)
            .await
            .unwrap();

        assert!(issuer.revoke(&token).await.unwrap());
        let result = issuer.verify(&token, TokenClass::Access).await;
        assert!(matches!(result, Err(AuthError::TokenNotRegistered)));
    }

    #[tokio::test]
    async fn test_access_token_fails_as_refresh() {
        let (issuer, _stores) = issuer();
        let token = issuer
            .issue(Uuid::new_v4(), "a@b.co", Role::User, TokenClass::Access)
            .await
            .unwrap();

        let result = issuer.verify(&token, TokenClass::Refresh).await;
        assert!(matches!(result, Err(AuthError::InvalidSignature)));
    }

    #[tokio::test]
    async fn test_class_claim_must_match() {
        let (issuer, stores) = issuer();
        let now = Utc::now().timestamp();
        // Signed with the access secret but claiming to be a refresh token.
        let claims = TokenClaims {
            sub: Uuid::new_v4().to_string(),
            iss: "test".into(),
            email: "a@b.co".into(),
            role: Role::User,
            class: TokenClass::Refresh,
            iat: now,
            exp: now + 60,
            jti: "j".into(),
        };
        let token = issuer.sign(&claims, TokenClass::Access).unwrap();
        stores.sessions.set_ex(&token, &claims.sub, Duration::from_secs(60)).await.unwrap();

        let result = issuer.verify(&token, TokenClass::Access).await;
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[tokio::test]
    async fn test_expired_token_rejected() {
        let (issuer, stores) = issuer();
        let now = Utc::now().timestamp();
        let claims = TokenClaims {
            sub: Uuid::new_v4().to_string(),
            iss: "test".into(),
            email: "a@b.co".into(),
            role: Role::User,
            class: TokenClass::Access,
            iat: now - 120,
            exp: now - 60,
            jti: "j".into(),
        };
        let token = issuer.sign(&claims, TokenClass::Access).unwrap();
        stores.sessions.set_ex(&token, &claims.sub, Duration::from_secs(60)).await.unwrap();

        let result = issuer.verify(&token, TokenClass::Access).await;
        assert!(matches!(result, Err(AuthError::TokenExpired)));
    }

    #[tokio::test]
    async fn test_ledger_owner_must_match_subject() {
        let (issuer, stores) = issuer();
        let token = issuer
            .issue(Uuid::new_v4(), "a@b.co", Role::User, TokenClass::Access)
            .await
            .unwrap();
        stores
            .sessions
            .set_ex(&token, &Uuid::new_v4().to_string(), Duration::from_secs(60))
            .await
            .unwrap();

        let result = issuer.verify(&token, TokenClass::Access).await;
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[tokio::test]
    async fn test_non_hs256_rejected() {
        let (issuer, stores) = issuer();
        let now = Utc::now().timestamp();
        let claims = TokenClaims {
            sub: Uuid::new_v4().to_string(),
            iss: "test".into(),
            email: "a@b.co".into(),
            role: Role::User,
            class: TokenClass::Access,
            iat: now,
            exp: now + 60,
            jti: "j".into(),
        };
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(test_config().access_secret.as_bytes()),
        )
        .unwrap();
        stores.sessions.set_ex(&token, &claims.sub, Duration::from_secs(60)).await.unwrap();

        let result = issuer.verify(&token, TokenClass::Access).await;
        assert!(matches!(result, Err(AuthError::InvalidSignature)));
    }

    #[tokio::test]
    async fn test_ledger_failure_withholds_token() {
        let (issuer, stores) = issuer();
        stores.sessions.fail_all(true);

        let result = issuer
            .issue(Uuid::new_v4(), "a@b.co", Role::User, TokenClass::Access)
            .await;
        assert!(matches!(result, Err(AuthError::SigningError(_))));
    }

    #[tokio::test]
    async fn test_tokens_are_distinct() {
        let (issuer, _stores) = issuer();
        let user_id = Uuid::new_v4();
        let a = issuer.issue(user_id, "a@b.co", Role::User, TokenClass::Access).await.unwrap();
        let b = issuer.issue(user_id, "a@b.co", Role::User, TokenClass::Access).await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_foreign_issuer_rejected() {
        let (issuer, stores) = issuer();
        let user_id = Uuid::new_v4();
        let token = issuer.issue(user_id, "a@b.co", Role::User, TokenClass::Access).await.unwrap();
        let claims = issuer.verify(&token, TokenClass::Access).await.unwrap();
        assert_eq!(claims.iss, "test");

        // Same secret, different issuer name
        let mut config = test_config();
        config.issuer = "elsewhere".to_string();
        let other = TokenIssuer::new(&config, stores.sessions.clone());
        let foreign = other.issue(user_id, "a@b.co", Role::User, TokenClass::Access).await.unwrap();

        let result = issuer.verify(&foreign, TokenClass::Access).await;
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }
}
