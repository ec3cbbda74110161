// DTO des routes /api/auth (noms de champs = ceux du frontend existant)
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::models::people::Gender;
use crate::models::users::AuthProvider;

/// POST /register
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub provider: Option<AuthProvider>,
    pub social_data: Option<Value>,
    #[validate(email(message = "Invalid email"))]
    pub mail: Option<String>,
    pub gender: Option<Gender>,
    #[serde(rename = "birdDay")]
    pub bird_day: Option<String>,
    #[serde(default)]
    pub result: AvatarSelections,
}

/// Les 10 slots d'avatars choisis à l'inscription (id d'avatar par slot)
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
pub struct AvatarSelections {
    #[serde(rename = "A")]
    pub a: Option<i32>,
    #[serde(rename = "B")]
    pub b: Option<i32>,
    #[serde(rename = "V")]
    pub v: Option<i32>,
    #[serde(rename = "G")]
    pub g: Option<i32>,
    #[serde(rename = "D")]
    pub d: Option<i32>,
    #[serde(rename = "K")]
    pub k: Option<i32>,
    #[serde(rename = "L")]
    pub l: Option<i32>,
    #[serde(rename = "M")]
    pub m: Option<i32>,
    #[serde(rename = "N")]
    pub n: Option<i32>,
    #[serde(rename = "B2")]
    pub b2: Option<i32>,
}

/// Slot prêt à être inséré dans la table avatars
#[derive(Debug, Clone, PartialEq)]
pub struct AvatarSlot {
    pub key_word: &'static str,
    pub avatar_id: Option<i32>,
    pub preview: bool,
}

impl AvatarSelections {
    /// Slot A en preview, ainsi que tout slot qui porte le même avatar que A
    pub fn slots(&self) -> Vec<AvatarSlot> {
        let named = [
            ("A", self.a),
            ("B", self.b),
            ("V", self.v),
            ("G", self.g),
            ("D", self.d),
            ("K", self.k),
            ("L", self.l),
            ("M", self.m),
            ("N", self.n),
            ("B2", self.b2),
        ];

        named
            .into_iter()
            .map(|(key_word, avatar_id)| AvatarSlot {
                key_word,
                avatar_id,
                preview: key_word == "A" || (avatar_id.is_some() && avatar_id == self.a),
            })
            .collect()
    }
}

/// POST /login: email + mot de passe, ou provider + socialData
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email"))]
    pub email: Option<String>,
    // Pas de règle de longueur: les anciens mots de passe WordPress peuvent être courts
    pub password: Option<String>,
    pub provider: Option<AuthProvider>,
    pub social_data: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct SetPasswordRequest {
    pub token: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ForgotRequest {
    #[validate(email(message = "Invalid email"))]
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

/// POST /vk
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VkAuthRequest {
    pub vk_data: Value,
}

/// POST /telegram
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelegramAuthRequest {
    pub telegram_data: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct UserRef {
    pub id: i32,
}

// Réponse après inscription / connexion sociale
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub message: String,
    pub user: UserRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}
