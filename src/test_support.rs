//! Doubles de test: stockage en mémoire, mailer et notifier qui enregistrent
//! leurs appels, signature de payloads Telegram.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::DbErr;
use serde_json::Value;

use crate::config::AppConfig;
use crate::models::users::{self, AuthProvider};
use crate::models::{avatars, people};
use crate::repositories::{NewAccount, SessionRepository, UserRepository};
use crate::services::auth_service::AuthService;
use crate::services::mailer::{MailError, Mailer};
use crate::services::notifier::{Notifier, NotifyOutcome};
use crate::utils::jwt::JwtConfig;
use crate::utils::telegram::TelegramSignatureVerifier;

pub const BOT_TOKEN: &str = "123456:test-bot-token";

pub fn test_config() -> AppConfig {
    AppConfig::from_lookup(|key| {
        let value = match key {
            "DATABASE_URL" => "postgres://localhost/avatar_test",
            "JWT_SECRET" => "test-secret-for-jwt",
            "JWT_EXPIRATION" => "15m",
            "TELEGRAM_BOT_TOKEN" => BOT_TOKEN,
            _ => return None,
        };
        Some(value.to_string())
    })
    .unwrap()
}

pub fn test_jwt_config() -> JwtConfig {
    test_config().jwt
}

/// Ajoute un `hash` valide (bot de test) au payload
pub fn signed_telegram(payload: Value) -> Value {
    let mut fields = payload.as_object().cloned().unwrap();
    let hash = TelegramSignatureVerifier::new(Some(BOT_TOKEN))
        .sign(&fields)
        .unwrap();
    fields.insert("hash".to_string(), Value::String(hash));
    Value::Object(fields)
}

/// Laisse tourner les tâches détachées jusqu'à ce que `condition` soit vraie
pub async fn wait_until(condition: impl Fn() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(StdDuration::from_millis(5)).await;
    }
    panic!("condition not met in time");
}

#[derive(Default)]
struct MemoryState {
    last_id: i32,
    users: Vec<users::Model>,
    people: Vec<people::Model>,
    avatars: Vec<avatars::Model>,
    sessions: HashMap<i32, String>,
}

impl MemoryState {
    fn next_id(&mut self) -> i32 {
        self.last_id += 1;
        self.last_id
    }

    fn user_mut(&mut self, id: i32) -> Result<&mut users::Model, DbErr> {
        self.users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| DbErr::RecordNotFound(format!("user {}", id)))
    }
}

/// Remplace PostgreSQL: un Mutex par store, pas de vraie transaction
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
    fail_avatars: AtomicBool,
}

impl MemoryStore {
    /// La prochaine insertion de slots échoue (et rien n'est persisté)
    pub fn fail_avatar_insert(&self) {
        self.fail_avatars.store(true, Ordering::SeqCst);
    }

    pub fn insert_confirmed_user(&self, email: &str, password_hash: Option<&str>) -> users::Model {
        let mut state = self.state.lock().unwrap();
        let user = users::Model {
            id: state.next_id(),
            email: Some(email.to_string()),
            password_hash: password_hash.map(str::to_string),
            provider: AuthProvider::Email,
            social_id: None,
            social_data: None,
            is_confirmed: true,
            confirmation_token: None,
            confirmation_expires: None,
        };
        state.users.push(user.clone());
        user
    }

    pub fn update_user(&self, id: i32, change: impl FnOnce(&mut users::Model)) {
        let mut state = self.state.lock().unwrap();
        change(state.user_mut(id).unwrap());
    }

    pub fn user(&self, id: i32) -> Option<users::Model> {
        let state = self.state.lock().unwrap();
        state.users.iter().find(|u| u.id == id).cloned()
    }

    /// Comparaison exacte, sans normalisation
    pub fn user_by_email(&self, email: &str) -> Option<users::Model> {
        let state = self.state.lock().unwrap();
        state
            .users
            .iter()
            .find(|u| u.email.as_deref() == Some(email))
            .cloned()
    }

    pub fn user_count(&self) -> usize {
        self.state.lock().unwrap().users.len()
    }

    pub fn people_for(&self, user_id: i32) -> Vec<people::Model> {
        let state = self.state.lock().unwrap();
        state
            .people
            .iter()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect()
    }

    pub fn avatars_for(&self, person_id: i32) -> Vec<avatars::Model> {
        let state = self.state.lock().unwrap();
        state
            .avatars
            .iter()
            .filter(|a| a.person_id == person_id)
            .cloned()
            .collect()
    }

    pub fn session(&self, user_id: i32) -> Option<String> {
        self.state.lock().unwrap().sessions.get(&user_id).cloned()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_id(&self, id: i32) -> Result<Option<users::Model>, DbErr> {
        Ok(self.user(id))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<users::Model>, DbErr> {
        Ok(self.user_by_email(email))
    }

    async fn find_by_social(
        &self,
        provider: AuthProvider,
        social_id: &str,
    ) -> Result<Option<users::Model>, DbErr> {
        let state = self.state.lock().unwrap();
        Ok(state
            .users
            .iter()
            .find(|u| u.provider == provider && u.social_id.as_deref() == Some(social_id))
            .cloned())
    }

    async fn find_by_confirmation_token(&self, token: &str) -> Result<Option<users::Model>, DbErr> {
        let state = self.state.lock().unwrap();
        Ok(state
            .users
            .iter()
            .find(|u| u.confirmation_token.as_deref() == Some(token))
            .cloned())
    }

    async fn create_account(&self, account: NewAccount) -> Result<users::Model, DbErr> {
        if self.fail_avatars.load(Ordering::SeqCst) {
            return Err(DbErr::Custom("avatar insert failed".to_string()));
        }

        let mut state = self.state.lock().unwrap();
        let user = users::Model {
            id: state.next_id(),
            email: account.email,
            password_hash: None,
            provider: account.provider,
            social_id: account.social_id,
            social_data: account.social_data,
            is_confirmed: account.is_confirmed,
            confirmation_token: account.confirmation_token,
            confirmation_expires: account.confirmation_expires,
        };
        let person = people::Model {
            id: state.next_id(),
            user_id: user.id,
            name: account.profile.display_name(),
            gender: account.profile.gender,
            birth_date: account.profile.birth_date,
        };
        for slot in account.profile.avatars.slots() {
            let id = state.next_id();
            state.avatars.push(avatars::Model {
                id,
                person_id: person.id,
                key_word: slot.key_word.to_string(),
                avatar_id: slot.avatar_id,
                purchased: false,
                preview: slot.preview,
            });
        }
        state.people.push(person);
        state.users.push(user.clone());
        Ok(user)
    }

    async fn update_social_identity(
        &self,
        user_id: i32,
        provider: AuthProvider,
        social_id: &str,
        social_data: Value,
    ) -> Result<(), DbErr> {
        let mut state = self.state.lock().unwrap();
        let user = state.user_mut(user_id)?;
        user.provider = provider;
        user.social_id = Some(social_id.to_string());
        user.social_data = Some(social_data);
        user.is_confirmed = true;
        Ok(())
    }

    async fn set_confirmation(
        &self,
        user_id: i32,
        token: &str,
        expires: DateTime<Utc>,
        is_confirmed: bool,
    ) -> Result<(), DbErr> {
        let mut state = self.state.lock().unwrap();
        let user = state.user_mut(user_id)?;
        user.confirmation_token = Some(token.to_string());
        user.confirmation_expires = Some(expires);
        user.is_confirmed = is_confirmed;
        Ok(())
    }

    async fn mark_confirmed(&self, user_id: i32) -> Result<(), DbErr> {
        let mut state = self.state.lock().unwrap();
        state.user_mut(user_id)?.is_confirmed = true;
        Ok(())
    }

    async fn set_password(&self, user_id: i32, password_hash: &str) -> Result<(), DbErr> {
        let mut state = self.state.lock().unwrap();
        let user = state.user_mut(user_id)?;
        user.password_hash = Some(password_hash.to_string());
        user.confirmation_token = None;
        Ok(())
    }
}

#[async_trait]
impl SessionRepository for MemoryStore {
    async fn upsert(&self, user_id: i32, refresh_token: &str) -> Result<(), DbErr> {
        let mut state = self.state.lock().unwrap();
        state.sessions.insert(user_id, refresh_token.to_string());
        Ok(())
    }

    async fn replace(&self, user_id: i32, current: &str, next: &str) -> Result<bool, DbErr> {
        let mut state = self.state.lock().unwrap();
        match state.sessions.get_mut(&user_id) {
            Some(stored) if stored == current => {
                *stored = next.to_string();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<(String, String)>>,
    fail: bool,
}

impl RecordingMailer {
    /// Tentatives d'envoi: (email, token)
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_confirmation_email(&self, email: &str, token: &str) -> Result<(), MailError> {
        self.sent
            .lock()
            .unwrap()
            .push((email.to_string(), token.to_string()));
        if self.fail {
            return Err(MailError::Build("smtp unavailable".to_string()));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, text: &str) -> NotifyOutcome {
        self.sent.lock().unwrap().push(text.to_string());
        NotifyOutcome {
            ok: true,
            ..Default::default()
        }
    }
}

/// AuthService branché sur les doubles ci-dessus
pub struct TestContext {
    pub auth: Arc<AuthService>,
    pub store: Arc<MemoryStore>,
    pub mailer: Arc<RecordingMailer>,
    pub notifier: Arc<RecordingNotifier>,
}

impl TestContext {
    pub fn new() -> Self {
        Self::build(RecordingMailer::default())
    }

    pub fn with_failing_mailer() -> Self {
        Self::build(RecordingMailer {
            fail: true,
            ..Default::default()
        })
    }

    fn build(mailer: RecordingMailer) -> Self {
        let store = Arc::new(MemoryStore::default());
        let mailer = Arc::new(mailer);
        let notifier = Arc::new(RecordingNotifier::default());
        let auth = AuthService::new(
            &test_config(),
            store.clone(),
            store.clone(),
            mailer.clone(),
            notifier.clone(),
        );

        Self {
            auth: Arc::new(auth),
            store,
            mailer,
            notifier,
        }
    }
}
