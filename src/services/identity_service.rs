use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::errors::AuthError;
use crate::models::social::SocialPayload;
use crate::models::users::{self, AuthProvider};
use crate::repositories::{NewAccount, ProfileSeed, UserRepository};

/// Qui se présente: une adresse email ou un payload social déjà parsé
#[derive(Debug, Clone)]
pub enum Identity {
    Email(String),
    Social(SocialPayload),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedUser {
    pub user_id: i32,
    pub created: bool,
    /// Présent quand un token de confirmation vient d'être (ré)émis
    pub confirmation_token: Option<String>,
}

pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Retrouve ou crée le compte correspondant à une identité
pub struct IdentityResolver {
    users: Arc<dyn UserRepository>,
    confirmation_ttl: Duration,
}

impl IdentityResolver {
    pub fn new(users: Arc<dyn UserRepository>, confirmation_ttl: Duration) -> Self {
        Self {
            users,
            confirmation_ttl,
        }
    }

    /// Nouveau token de confirmation (UUID v4) et sa date d'expiration
    pub fn new_confirmation(&self) -> (String, DateTime<Utc>) {
        (
            Uuid::new_v4().to_string(),
            Utc::now() + self.confirmation_ttl,
        )
    }

    /// Recherche sans jamais créer: (provider, social_id) puis email
    pub async fn find(&self, identity: &Identity) -> Result<Option<users::Model>, AuthError> {
        match identity {
            Identity::Email(email) => Ok(self.users.find_by_email(&normalize_email(email)).await?),
            Identity::Social(payload) => {
                if let Some(user) = self
                    .users
                    .find_by_social(payload.provider(), payload.social_id())
                    .await?
                {
                    return Ok(Some(user));
                }
                match payload.email() {
                    Some(email) => Ok(self.users.find_by_email(&normalize_email(email)).await?),
                    None => Ok(None),
                }
            }
        }
    }

    /// Recherche stricte sur (provider, social_id), sans repli sur l'email.
    /// C'est la seule recherche autorisée pour un login social.
    pub async fn find_social(
        &self,
        payload: &SocialPayload,
    ) -> Result<Option<users::Model>, AuthError> {
        Ok(self
            .users
            .find_by_social(payload.provider(), payload.social_id())
            .await?)
    }

    pub async fn resolve_or_create(
        &self,
        identity: &Identity,
        seed: ProfileSeed,
    ) -> Result<ResolvedUser, AuthError> {
        match identity {
            Identity::Social(payload) => self.resolve_social(identity, payload, seed).await,
            Identity::Email(email) => self.resolve_email(&normalize_email(email), seed).await,
        }
    }

    async fn resolve_social(
        &self,
        identity: &Identity,
        payload: &SocialPayload,
        seed: ProfileSeed,
    ) -> Result<ResolvedUser, AuthError> {
        let provider = payload.provider();

        if let Some(user) = self.find(identity).await? {
            self.users
                .update_social_identity(user.id, provider, payload.social_id(), payload.social_data())
                .await?;
            tracing::info!(user_id = user.id, %provider, "Social identity refreshed");
            return Ok(ResolvedUser {
                user_id: user.id,
                created: false,
                confirmation_token: None,
            });
        }

        // Les champs explicites de la requête priment sur ceux du provider
        let profile = ProfileSeed {
            name: seed.name.or_else(|| payload.display_name()),
            gender: seed.gender.or_else(|| payload.gender()),
            birth_date: seed.birth_date.or_else(|| payload.birth_date()),
            avatars: seed.avatars,
        };

        let user = self
            .users
            .create_account(NewAccount {
                email: payload.email().map(normalize_email),
                provider,
                social_id: Some(payload.social_id().to_string()),
                social_data: Some(payload.social_data()),
                is_confirmed: true,
                confirmation_token: None,
                confirmation_expires: None,
                profile,
            })
            .await?;

        tracing::info!(user_id = user.id, %provider, "Social account created");
        Ok(ResolvedUser {
            user_id: user.id,
            created: true,
            confirmation_token: None,
        })
    }

    async fn resolve_email(&self, email: &str, seed: ProfileSeed) -> Result<ResolvedUser, AuthError> {
        let (token, expires) = self.new_confirmation();

        match self.users.find_by_email(email).await? {
            Some(user) if user.is_confirmed => Err(AuthError::validation(
                "User with this email already exists",
            )),
            Some(user) => {
                // Inscription relancée avant confirmation: nouveau token, pas de second profil
                self.users
                    .set_confirmation(user.id, &token, expires, false)
                    .await?;
                tracing::info!(user_id = user.id, "Confirmation token re-issued");
                Ok(ResolvedUser {
                    user_id: user.id,
                    created: false,
                    confirmation_token: Some(token),
                })
            }
            None => {
                let user = self
                    .users
                    .create_account(NewAccount {
                        email: Some(email.to_string()),
                        provider: AuthProvider::Email,
                        social_id: None,
                        social_data: None,
                        is_confirmed: false,
                        confirmation_token: Some(token.clone()),
                        confirmation_expires: Some(expires),
                        profile: seed,
                    })
                    .await?;
                tracing::info!(user_id = user.id, "Email account created");
                Ok(ResolvedUser {
                    user_id: user.id,
                    created: true,
                    confirmation_token: Some(token),
                })
            }
        }
    }
}
