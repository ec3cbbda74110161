use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Durée de vie fixe du refresh token (30 jours)
pub const REFRESH_TOKEN_DAYS: i64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: i32,
    pub iat: i64,
    pub exp: i64, // expiration timestamp
    /// Identifiant unique: deux tokens émis dans la même seconde restent différents
    pub jti: String,
}

/// Secret + durées, construit une seule fois au démarrage
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl JwtConfig {
    pub fn new(secret: String, access_ttl: Duration) -> Self {
        Self {
            secret,
            access_ttl,
            refresh_ttl: Duration::days(REFRESH_TOKEN_DAYS),
        }
    }
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("invalid token: {0}")]
    Invalid(String),
    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// Génère un JWT signé (HS256) valable `ttl` pour un utilisateur
pub fn generate_token(user_id: i32, ttl: Duration, config: &JwtConfig) -> Result<String, TokenError> {
    let now = Utc::now();
    let expiration = now
        .checked_add_signed(ttl)
        .ok_or_else(|| TokenError::Signing("Failed to calculate expiration".to_string()))?
        .timestamp();

    let claims = Claims {
        user_id,
        iat: now.timestamp(),
        exp: expiration,
        jti: Uuid::new_v4().to_string(),
    };

    encode_claims(&claims, config)
}

pub fn encode_claims(claims: &Claims, config: &JwtConfig) -> Result<String, TokenError> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(|e| TokenError::Signing(e.to_string()))
}

/// Vérifie signature + expiration et décode le JWT
pub fn verify_token(token: &str, config: &JwtConfig) -> Result<Claims, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    // Pas de tolérance: expiré dès que exp est dépassé
    validation.leeway = 0;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Invalid(e.to_string()),
    })
}
