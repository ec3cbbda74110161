// ============================================================================
// REPOSITORIES
// ============================================================================
//
// Description:
//   Accès aux tables users / people / avatars / user_sessions.
//   Les services ne voient que les traits, l'implémentation SeaORM est dans
//   sea_orm_store.rs (un double en mémoire existe pour les tests).
//
// Points d'attention:
//   - create_account écrit user + profil + 10 slots dans UNE transaction
//   - SessionRepository::replace est un UPDATE conditionnel (rotation atomique)
//
// ============================================================================

pub mod sea_orm_store;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::DbErr;
use serde_json::Value;

use crate::models::dto::AvatarSelections;
use crate::models::people::Gender;
use crate::models::users::{self, AuthProvider};

pub use sea_orm_store::SeaOrmStore;

/// Nom du profil créé à l'inscription quand le provider n'en fournit pas
pub const DEFAULT_PROFILE_NAME: &str = "Я";

/// Profil "people" + avatars, écrit uniquement à la création du compte
#[derive(Debug, Clone, Default)]
pub struct ProfileSeed {
    pub name: Option<String>,
    pub gender: Option<Gender>,
    pub birth_date: Option<NaiveDate>,
    pub avatars: AvatarSelections,
}

impl ProfileSeed {
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| DEFAULT_PROFILE_NAME.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: Option<String>,
    pub provider: AuthProvider,
    pub social_id: Option<String>,
    pub social_data: Option<Value>,
    pub is_confirmed: bool,
    pub confirmation_token: Option<String>,
    pub confirmation_expires: Option<DateTime<Utc>>,
    pub profile: ProfileSeed,
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: i32) -> Result<Option<users::Model>, DbErr>;

    /// `email` doit déjà être en minuscules
    async fn find_by_email(&self, email: &str) -> Result<Option<users::Model>, DbErr>;

    async fn find_by_social(
        &self,
        provider: AuthProvider,
        social_id: &str,
    ) -> Result<Option<users::Model>, DbErr>;

    async fn find_by_confirmation_token(&self, token: &str) -> Result<Option<users::Model>, DbErr>;

    /// Tout ou rien: user, profil et slots d'avatars
    async fn create_account(&self, account: NewAccount) -> Result<users::Model, DbErr>;

    /// Rafraîchit provider/social_id/social_data et confirme le compte
    async fn update_social_identity(
        &self,
        user_id: i32,
        provider: AuthProvider,
        social_id: &str,
        social_data: Value,
    ) -> Result<(), DbErr>;

    async fn set_confirmation(
        &self,
        user_id: i32,
        token: &str,
        expires: DateTime<Utc>,
        is_confirmed: bool,
    ) -> Result<(), DbErr>;

    async fn mark_confirmed(&self, user_id: i32) -> Result<(), DbErr>;

    /// Stocke le hash et consomme le token de confirmation
    async fn set_password(&self, user_id: i32, password_hash: &str) -> Result<(), DbErr>;
}

#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// INSERT ... ON CONFLICT (user_id) DO UPDATE
    async fn upsert(&self, user_id: i32, refresh_token: &str) -> Result<(), DbErr>;

    /// Remplace `current` par `next` seulement si `current` est le token stocké.
    /// Renvoie false si aucune ligne ne correspond.
    async fn replace(&self, user_id: i32, current: &str, next: &str) -> Result<bool, DbErr>;
}
