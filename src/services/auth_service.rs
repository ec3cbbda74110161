// ============================================================================
// SERVICE : AUTHENTIFICATION
// ============================================================================
//
// Description:
//   Orchestration des routes /api/auth. Les handlers HTTP ne font que
//   désérialiser, appeler ce service puis poser les cookies.
//
// Workflow email:
//   1. register -> compte non confirmé + token de confirmation + email
//   2. confirm_email -> is_confirmed = true (le token reste pour l'étape 3)
//   3. set_password -> hash bcrypt, token consommé
//   4. login -> paire de tokens
//
// Workflow social (VK / Telegram):
//   register ou social_sign_in -> compte confirmé d'office + paire de tokens
//
// Points d'attention:
//   - Email et notification partent en tâche détachée, leur échec n'est
//     jamais remonté au client
//   - bcrypt tourne sur le pool bloquant (spawn_blocking)
//
// ============================================================================

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde_json::Value;
use validator::Validate;

use crate::config::AppConfig;
use crate::errors::AuthError;
use crate::models::dto::{ForgotRequest, LoginRequest, RegisterRequest, SetPasswordRequest, TokenPair};
use crate::models::social::{parse_vk_date, SocialPayload};
use crate::models::users::AuthProvider;
use crate::repositories::{ProfileSeed, SessionRepository, UserRepository};
use crate::services::identity_service::{normalize_email, Identity, IdentityResolver};
use crate::services::mailer::Mailer;
use crate::services::notifier::Notifier;
use crate::services::token_service::TokenService;
use crate::utils::password::{self, PasswordVerifier};
use crate::utils::telegram::TelegramSignatureVerifier;

/// Résultat d'une inscription: les tokens ne sont émis que pour le flux social
#[derive(Debug, Clone)]
pub struct RegisterOutcome {
    pub user_id: i32,
    pub tokens: Option<TokenPair>,
}

pub struct AuthService {
    users: Arc<dyn UserRepository>,
    identities: IdentityResolver,
    tokens: TokenService,
    passwords: Arc<PasswordVerifier>,
    telegram: TelegramSignatureVerifier,
    mailer: Arc<dyn Mailer>,
    notifier: Arc<dyn Notifier>,
}

impl AuthService {
    pub fn new(
        config: &AppConfig,
        users: Arc<dyn UserRepository>,
        sessions: Arc<dyn SessionRepository>,
        mailer: Arc<dyn Mailer>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            identities: IdentityResolver::new(users.clone(), config.confirmation_ttl),
            tokens: TokenService::new(config.jwt.clone(), sessions, users.clone()),
            users,
            passwords: Arc::new(PasswordVerifier::with_default_schemes()),
            telegram: TelegramSignatureVerifier::new(config.telegram_bot_token.as_deref()),
            mailer,
            notifier,
        }
    }

    /// POST /register
    pub async fn register(&self, request: RegisterRequest) -> Result<RegisterOutcome, AuthError> {
        request.validate()?;

        let seed = ProfileSeed {
            name: None,
            gender: request.gender,
            birth_date: parse_birth_date(request.bird_day.as_deref())?,
            avatars: request.result,
        };

        match (request.provider, request.mail) {
            (Some(provider), _) if provider != AuthProvider::Email => {
                let raw = request
                    .social_data
                    .ok_or_else(|| AuthError::validation("Social data is required"))?;
                self.sign_in_with_provider(provider, &raw, seed).await
            }
            (_, Some(mail)) if !mail.trim().is_empty() => self.register_email(&mail, seed).await,
            _ => Err(AuthError::validation("Provider or email is required")),
        }
    }

    async fn register_email(&self, mail: &str, seed: ProfileSeed) -> Result<RegisterOutcome, AuthError> {
        let email = normalize_email(mail);
        let resolved = self
            .identities
            .resolve_or_create(&Identity::Email(email.clone()), seed)
            .await?;

        if let Some(token) = resolved.confirmation_token {
            self.send_confirmation_detached(email, token);
        }

        Ok(RegisterOutcome {
            user_id: resolved.user_id,
            tokens: None,
        })
    }

    /// POST /vk et POST /telegram: crée le compte si besoin puis émet les tokens
    pub async fn social_sign_in(
        &self,
        provider: AuthProvider,
        raw: &Value,
    ) -> Result<RegisterOutcome, AuthError> {
        self.sign_in_with_provider(provider, raw, ProfileSeed::default())
            .await
    }

    async fn sign_in_with_provider(
        &self,
        provider: AuthProvider,
        raw: &Value,
        seed: ProfileSeed,
    ) -> Result<RegisterOutcome, AuthError> {
        let payload = SocialPayload::parse(provider, raw)?;
        self.ensure_signed(&payload)?;

        let resolved = self
            .identities
            .resolve_or_create(&Identity::Social(payload), seed)
            .await?;
        let tokens = self.tokens.issue(resolved.user_id).await?;

        let text = if resolved.created {
            format!("Новый пользователь <b>#{}</b> ({})", resolved.user_id, provider)
        } else {
            format!("Пользователь <b>#{}</b> вошёл через {}", resolved.user_id, provider)
        };
        self.notify_detached(text);

        Ok(RegisterOutcome {
            user_id: resolved.user_id,
            tokens: Some(tokens),
        })
    }

    /// GET /confirm-email/{token}
    pub async fn confirm_email(&self, token: &str) -> Result<(), AuthError> {
        let user = self
            .users
            .find_by_confirmation_token(token)
            .await?
            .ok_or_else(|| AuthError::not_found("Token not found"))?;

        if user.confirmation_expired(Utc::now()) {
            return Err(AuthError::validation("Confirmation token has expired"));
        }

        // Le token n'est pas consommé ici: set-password en a besoin
        self.users.mark_confirmed(user.id).await?;
        tracing::info!(user_id = user.id, "Email confirmed");
        Ok(())
    }

    /// POST /set-password
    pub async fn set_password(&self, request: SetPasswordRequest) -> Result<(), AuthError> {
        let (token, plain) = match (request.token, request.password) {
            (Some(token), Some(plain)) if !token.is_empty() && !plain.is_empty() => (token, plain),
            _ => return Err(AuthError::validation("Token and password are required")),
        };
        password::validate_password_strength(&plain).map_err(AuthError::Validation)?;

        let user = match self.users.find_by_confirmation_token(&token).await? {
            Some(user) if user.is_confirmed => user,
            _ => return Err(AuthError::validation("Email is not confirmed")),
        };
        if user.confirmation_expired(Utc::now()) {
            return Err(AuthError::validation("Confirmation token has expired"));
        }

        let hash = tokio::task::spawn_blocking(move || password::hash_password(&plain))
            .await?
            .map_err(|e| AuthError::Internal(format!("Failed to hash password: {}", e)))?;
        self.users.set_password(user.id, &hash).await?;

        tracing::info!(user_id = user.id, "Password set");
        self.notify_detached(format!("Пользователь <b>#{}</b> установил пароль", user.id));
        Ok(())
    }

    /// POST /login: email + mot de passe, ou payload social (sans création)
    pub async fn login(&self, request: LoginRequest) -> Result<TokenPair, AuthError> {
        request.validate()?;

        match request.provider {
            Some(provider) if provider != AuthProvider::Email => {
                let raw = request
                    .social_data
                    .ok_or_else(|| AuthError::validation("Social data is required"))?;
                self.login_social(provider, &raw).await
            }
            _ => match (request.email, request.password) {
                (Some(email), Some(plain)) if !email.is_empty() && !plain.is_empty() => {
                    self.login_password(&email, plain).await
                }
                _ => Err(AuthError::validation("Email and password are required")),
            },
        }
    }

    async fn login_password(&self, email: &str, plain: String) -> Result<TokenPair, AuthError> {
        let user = self
            .identities
            .find(&Identity::Email(email.to_string()))
            .await?
            .ok_or_else(|| AuthError::not_found("User not found"))?;

        let verifier = self.passwords.clone();
        let stored = user.password_hash.clone();
        let valid =
            tokio::task::spawn_blocking(move || verifier.verify(&plain, stored.as_deref())).await?;

        if !valid {
            tracing::info!(user_id = user.id, "Login rejected: wrong password");
            return Err(AuthError::unauthorized("Invalid password"));
        }
        if !user.is_confirmed {
            return Err(AuthError::validation("Email is not confirmed"));
        }

        self.tokens.issue(user.id).await
    }

    async fn login_social(&self, provider: AuthProvider, raw: &Value) -> Result<TokenPair, AuthError> {
        let payload = SocialPayload::parse(provider, raw)?;
        self.ensure_signed(&payload)?;

        // Jamais de repli sur l'email du payload: le payload VK n'est pas signé
        let user = self
            .identities
            .find_social(&payload)
            .await?
            .ok_or_else(|| AuthError::not_found("User not found"))?;

        if !user.is_confirmed {
            return Err(AuthError::validation("Account is not confirmed"));
        }

        self.tokens.issue(user.id).await
    }

    /// POST /forgot: nouveau token de confirmation, le compte repasse non confirmé
    pub async fn forgot(&self, request: ForgotRequest) -> Result<(), AuthError> {
        request.validate()?;
        let email = normalize_email(&request.email);

        let user = self
            .identities
            .find(&Identity::Email(email.clone()))
            .await?
            .ok_or_else(|| AuthError::validation("No user found with this email"))?;

        let (token, expires) = self.identities.new_confirmation();
        self.users
            .set_confirmation(user.id, &token, expires, false)
            .await?;

        tracing::info!(user_id = user.id, "Password reset requested");
        self.send_confirmation_detached(email, token);
        Ok(())
    }

    /// POST /refresh-token
    pub async fn refresh_tokens(&self, refresh_token: Option<&str>) -> Result<TokenPair, AuthError> {
        match refresh_token.map(str::trim) {
            Some(token) if !token.is_empty() => self.tokens.rotate(token).await,
            _ => Err(AuthError::validation("Refresh token is required")),
        }
    }

    /// GET /valid-token
    pub async fn check_session(&self, access_token: Option<&str>) -> Result<i32, AuthError> {
        match access_token {
            Some(token) if !token.is_empty() => self.tokens.validate_access(token).await,
            _ => Err(AuthError::unauthorized("Token not provided")),
        }
    }

    fn ensure_signed(&self, payload: &SocialPayload) -> Result<(), AuthError> {
        if let SocialPayload::Telegram(login) = payload {
            if !self.telegram.verify(&login.fields) {
                tracing::warn!(social_id = %login.id, "Telegram signature rejected");
                return Err(AuthError::validation("Invalid Telegram signature"));
            }
        }
        Ok(())
    }

    // Tâches détachées: le résultat est tracé puis abandonné

    fn send_confirmation_detached(&self, email: String, token: String) {
        let mailer = self.mailer.clone();
        tokio::spawn(async move {
            if let Err(e) = mailer.send_confirmation_email(&email, &token).await {
                tracing::warn!(error = %e, "Confirmation email failed");
            }
        });
    }

    fn notify_detached(&self, text: String) {
        let notifier = self.notifier.clone();
        tokio::spawn(async move {
            let outcome = notifier.notify(&text).await;
            tracing::debug!(ok = outcome.ok, skipped = outcome.skipped, "Notification dispatched");
        });
    }
}

/// "YYYY-MM-DD" (éventuellement suivi d'une heure ISO) ou "DD.MM.YYYY"
fn parse_birth_date(raw: Option<&str>) -> Result<Option<NaiveDate>, AuthError> {
    let raw = match raw.map(str::trim) {
        Some(raw) if !raw.is_empty() => raw,
        _ => return Ok(None),
    };

    let iso = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(iso, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_vk_date(raw))
        .map(Some)
        .ok_or_else(|| AuthError::validation("Invalid birth date"))
}
