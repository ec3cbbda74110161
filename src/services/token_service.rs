use std::sync::Arc;

use crate::errors::AuthError;
use crate::models::dto::TokenPair;
use crate::repositories::{SessionRepository, UserRepository};
use crate::utils::jwt::{self, JwtConfig, TokenError};

/// Émission, rotation et validation des JWT.
///
/// Cycle d'une session: aucune -> émise (login) -> tournée (refresh, N fois)
/// -> remplacée par un login plus récent.
pub struct TokenService {
    config: JwtConfig,
    sessions: Arc<dyn SessionRepository>,
    users: Arc<dyn UserRepository>,
}

impl TokenService {
    pub fn new(
        config: JwtConfig,
        sessions: Arc<dyn SessionRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            config,
            sessions,
            users,
        }
    }

    fn sign_pair(&self, user_id: i32) -> Result<TokenPair, AuthError> {
        let access_token = jwt::generate_token(user_id, self.config.access_ttl, &self.config)
            .map_err(|e| AuthError::Internal(e.to_string()))?;
        let refresh_token = jwt::generate_token(user_id, self.config.refresh_ttl, &self.config)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Nouvelle paire + upsert de la session (écrase la précédente)
    pub async fn issue(&self, user_id: i32) -> Result<TokenPair, AuthError> {
        let pair = self.sign_pair(user_id)?;
        self.sessions.upsert(user_id, &pair.refresh_token).await?;

        tracing::debug!(user_id, "Token pair issued");
        Ok(pair)
    }

    /// Échange un refresh token contre une nouvelle paire (usage unique)
    pub async fn rotate(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let claims = jwt::verify_token(refresh_token, &self.config)
            .map_err(|_| AuthError::unauthorized("Invalid or expired refresh token"))?;

        let pair = self.sign_pair(claims.user_id)?;
        let replaced = self
            .sessions
            .replace(claims.user_id, refresh_token, &pair.refresh_token)
            .await?;

        if !replaced {
            tracing::warn!(user_id = claims.user_id, "Refresh token not recognised");
            return Err(AuthError::unauthorized("Invalid or expired refresh token"));
        }

        tracing::debug!(user_id = claims.user_id, "Refresh token rotated");
        Ok(pair)
    }

    /// Signature + expiration, puis existence de l'utilisateur
    pub async fn validate_access(&self, access_token: &str) -> Result<i32, AuthError> {
        let claims = jwt::verify_token(access_token, &self.config).map_err(|e| match e {
            TokenError::Expired => AuthError::TokenExpired,
            _ => AuthError::TokenInvalid,
        })?;

        match self.users.find_by_id(claims.user_id).await? {
            Some(user) => Ok(user.id),
            None => Err(AuthError::not_found("User not found")),
        }
    }
}
