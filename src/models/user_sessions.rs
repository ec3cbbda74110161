// ============================================================================
// MODÈLE : USER SESSIONS
// ============================================================================
//
// Colonnes de la table user_sessions:
//   - user_id (INTEGER, PRIMARY KEY, FK vers users)
//   - refresh_token (TEXT, NOT NULL)
//
// Workflow:
//   1. Login / inscription sociale -> INSERT ... ON CONFLICT (user_id) DO UPDATE
//   2. POST /api/auth/refresh-token -> UPDATE ... WHERE user_id = ? AND refresh_token = ?
//   3. Un nouveau login écrase la ligne: l'ancien refresh token n'est plus reconnu
//
// Points d'attention:
//   - Une seule session active par utilisateur (le dernier login gagne)
//   - Pas d'expiration côté serveur, c'est le exp du JWT qui fait foi
//
// ============================================================================

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_sessions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: i32,

    #[sea_orm(column_type = "Text")]
    pub refresh_token: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    User,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
