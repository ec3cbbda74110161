use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::*;
use serde_json::Value;

use super::{NewAccount, SessionRepository, UserRepository};
use crate::models::users::AuthProvider;
use crate::models::{avatars, people, user_sessions, users};

/// Implémentation PostgreSQL des repositories
#[derive(Debug)]
#[cfg_attr(not(test), derive(Clone))]
pub struct SeaOrmStore {
    db: DatabaseConnection,
}

impl SeaOrmStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for SeaOrmStore {
    async fn find_by_id(&self, id: i32) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find_by_id(id).one(&self.db).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await
    }

    async fn find_by_social(
        &self,
        provider: AuthProvider,
        social_id: &str,
    ) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find()
            .filter(users::Column::Provider.eq(provider))
            .filter(users::Column::SocialId.eq(social_id))
            .one(&self.db)
            .await
    }

    async fn find_by_confirmation_token(&self, token: &str) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find()
            .filter(users::Column::ConfirmationToken.eq(token))
            .one(&self.db)
            .await
    }

    async fn create_account(&self, account: NewAccount) -> Result<users::Model, DbErr> {
        let txn = self.db.begin().await?;

        // 1. Le compte
        let user = users::ActiveModel {
            email: Set(account.email),
            password_hash: Set(None),
            provider: Set(account.provider),
            social_id: Set(account.social_id),
            social_data: Set(account.social_data),
            is_confirmed: Set(account.is_confirmed),
            confirmation_token: Set(account.confirmation_token),
            confirmation_expires: Set(account.confirmation_expires),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        // 2. Le profil
        let person = people::ActiveModel {
            user_id: Set(user.id),
            name: Set(account.profile.display_name()),
            gender: Set(account.profile.gender),
            birth_date: Set(account.profile.birth_date),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        // 3. Les 10 slots d'avatars
        let slots = account
            .profile
            .avatars
            .slots()
            .into_iter()
            .map(|slot| avatars::ActiveModel {
                person_id: Set(person.id),
                key_word: Set(slot.key_word.to_string()),
                avatar_id: Set(slot.avatar_id),
                purchased: Set(false),
                preview: Set(slot.preview),
                ..Default::default()
            });
        avatars::Entity::insert_many(slots)
            .exec_without_returning(&txn)
            .await?;

        // Un échec plus haut drop la transaction -> rollback
        txn.commit().await?;

        Ok(user)
    }

    async fn update_social_identity(
        &self,
        user_id: i32,
        provider: AuthProvider,
        social_id: &str,
        social_data: Value,
    ) -> Result<(), DbErr> {
        users::ActiveModel {
            id: Set(user_id),
            provider: Set(provider),
            social_id: Set(Some(social_id.to_string())),
            social_data: Set(Some(social_data)),
            is_confirmed: Set(true),
            ..Default::default()
        }
        .update(&self.db)
        .await?;
        Ok(())
    }

    async fn set_confirmation(
        &self,
        user_id: i32,
        token: &str,
        expires: DateTime<Utc>,
        is_confirmed: bool,
    ) -> Result<(), DbErr> {
        users::ActiveModel {
            id: Set(user_id),
            confirmation_token: Set(Some(token.to_string())),
            confirmation_expires: Set(Some(expires)),
            is_confirmed: Set(is_confirmed),
            ..Default::default()
        }
        .update(&self.db)
        .await?;
        Ok(())
    }

    async fn mark_confirmed(&self, user_id: i32) -> Result<(), DbErr> {
        users::ActiveModel {
            id: Set(user_id),
            is_confirmed: Set(true),
            ..Default::default()
        }
        .update(&self.db)
        .await?;
        Ok(())
    }

    async fn set_password(&self, user_id: i32, password_hash: &str) -> Result<(), DbErr> {
        users::ActiveModel {
            id: Set(user_id),
            password_hash: Set(Some(password_hash.to_string())),
            confirmation_token: Set(None),
            ..Default::default()
        }
        .update(&self.db)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl SessionRepository for SeaOrmStore {
    async fn upsert(&self, user_id: i32, refresh_token: &str) -> Result<(), DbErr> {
        let session = user_sessions::ActiveModel {
            user_id: Set(user_id),
            refresh_token: Set(refresh_token.to_string()),
        };

        user_sessions::Entity::insert(session)
            .on_conflict(
                OnConflict::column(user_sessions::Column::UserId)
                    .update_column(user_sessions::Column::RefreshToken)
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;
        Ok(())
    }

    async fn replace(&self, user_id: i32, current: &str, next: &str) -> Result<bool, DbErr> {
        let result = user_sessions::Entity::update_many()
            .col_expr(user_sessions::Column::RefreshToken, Expr::value(next))
            .filter(user_sessions::Column::UserId.eq(user_id))
            .filter(user_sessions::Column::RefreshToken.eq(current))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected == 1)
    }
}
