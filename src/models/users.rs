// ============================================================================
// MODÈLE : USERS
// ============================================================================
//
// Colonnes de la table users:
//   - id (INTEGER, PRIMARY KEY, SERIAL)
//   - email (VARCHAR, NULL, UNIQUE) - toujours en minuscules
//   - password_hash (VARCHAR, NULL) - bcrypt, ou ancien hash WordPress
//   - provider (TEXT, NOT NULL) - 'email' | 'vk' | 'telegram'
//   - social_id (VARCHAR, NULL) - unique par provider
//   - social_data (JSONB, NULL) - {firstName, lastName, photo, username}
//   - is_confirmed (BOOLEAN, DEFAULT FALSE)
//   - confirmation_token (VARCHAR, NULL) - UUID v4, usage unique
//   - confirmation_expires (TIMESTAMPTZ, NULL)
//
// Points d'attention:
//   - Un compte social pur n'a ni email ni password_hash
//   - L'unicité email / (provider, social_id) est vérifiée côté application
//   - Les utilisateurs ne sont jamais supprimés par l'authentification
//
// ============================================================================

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum AuthProvider {
    #[sea_orm(string_value = "email")]
    Email,
    #[sea_orm(string_value = "vk")]
    Vk,
    #[sea_orm(string_value = "telegram")]
    Telegram,
}

impl AuthProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthProvider::Email => "email",
            AuthProvider::Vk => "vk",
            AuthProvider::Telegram => "telegram",
        }
    }
}

impl fmt::Display for AuthProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub email: Option<String>,
    #[serde(skip_serializing)] // Jamais exposé en JSON
    pub password_hash: Option<String>,
    pub provider: AuthProvider,
    pub social_id: Option<String>,
    pub social_data: Option<Json>,
    pub is_confirmed: bool,
    #[serde(skip_serializing)]
    pub confirmation_token: Option<String>,
    pub confirmation_expires: Option<DateTimeUtc>,
}

impl Model {
    /// Un token sans date d'expiration est considéré comme expiré
    pub fn confirmation_expired(&self, now: DateTime<Utc>) -> bool {
        match self.confirmation_expires {
            Some(expires) => now > expires,
            None => true,
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::user_sessions::Entity")]
    UserSession,

    #[sea_orm(has_many = "super::people::Entity")]
    People,
}

impl Related<super::user_sessions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserSession.def()
    }
}

impl Related<super::people::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::People.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
