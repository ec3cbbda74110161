//! Payloads des providers sociaux (Telegram, VK).
//!
//! Le frontend envoie `socialData` tantôt comme objet JSON, tantôt comme
//! chaîne JSON. `SocialPayload::parse` normalise les deux formes et refuse
//! tout ce qui n'est pas exploitable.

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::errors::AuthError;
use crate::models::people::Gender;
use crate::models::users::AuthProvider;

#[derive(Debug, Clone, PartialEq)]
pub enum SocialPayload {
    Telegram(TelegramLogin),
    Vk(VkProfile),
}

/// Données du widget Telegram. `fields` garde le payload brut pour la vérification HMAC.
#[derive(Debug, Clone, PartialEq)]
pub struct TelegramLogin {
    pub id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub photo_url: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub fields: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VkProfile {
    pub id: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub photo: Option<String>,
    pub gender: Option<Gender>,
    pub birth_date: Option<NaiveDate>,
}

#[derive(Deserialize)]
struct RawTelegram {
    id: Option<Value>,
    first_name: Option<String>,
    last_name: Option<String>,
    username: Option<String>,
    photo_url: Option<String>,
    day: Option<Value>,
    month: Option<Value>,
    year: Option<Value>,
    gender: Option<Value>,
}

// VK ID renvoie du snake_case, l'ancien SDK du camelCase
#[derive(Deserialize)]
struct RawVk {
    id: Option<Value>,
    user_id: Option<Value>,
    email: Option<String>,
    #[serde(alias = "firstName")]
    first_name: Option<String>,
    #[serde(alias = "lastName")]
    last_name: Option<String>,
    #[serde(alias = "photo_url", alias = "avatar")]
    photo: Option<String>,
    sex: Option<Value>,
    bdate: Option<String>,
}

impl SocialPayload {
    /// Parse le payload brut pour un provider donné (objet JSON ou chaîne JSON)
    pub fn parse(provider: AuthProvider, raw: &Value) -> Result<Self, AuthError> {
        let object = match raw {
            Value::Object(map) => map.clone(),
            Value::String(text) => match serde_json::from_str::<Value>(text) {
                Ok(Value::Object(map)) => map,
                Ok(_) => return Err(AuthError::validation("Social data must be a JSON object")),
                Err(_) => return Err(AuthError::validation("Malformed social data")),
            },
            _ => return Err(AuthError::validation("Social data must be a JSON object")),
        };

        match provider {
            AuthProvider::Telegram => Self::parse_telegram(object),
            AuthProvider::Vk => Self::parse_vk(object),
            AuthProvider::Email => Err(AuthError::validation("Unsupported social provider")),
        }
    }

    fn parse_telegram(fields: Map<String, Value>) -> Result<Self, AuthError> {
        let raw: RawTelegram = serde_json::from_value(Value::Object(fields.clone()))
            .map_err(|_| AuthError::validation("Malformed Telegram data"))?;
        let id = scalar_id(raw.id.as_ref())
            .ok_or_else(|| AuthError::validation("Telegram ID is required"))?;

        let birth_date = match (
            raw.year.as_ref().and_then(scalar_int),
            raw.month.as_ref().and_then(scalar_int),
            raw.day.as_ref().and_then(scalar_int),
        ) {
            (Some(y), Some(m), Some(d)) => ymd(y, m, d),
            _ => None,
        };

        Ok(SocialPayload::Telegram(TelegramLogin {
            id,
            first_name: raw.first_name,
            last_name: raw.last_name,
            username: raw.username,
            photo_url: raw.photo_url,
            birth_date,
            // Valeur inconnue -> ignorée plutôt que refusée, le champ n'est pas signé
            gender: raw.gender.and_then(|g| serde_json::from_value(g).ok()),
            fields,
        }))
    }

    fn parse_vk(fields: Map<String, Value>) -> Result<Self, AuthError> {
        let raw: RawVk = serde_json::from_value(Value::Object(fields))
            .map_err(|_| AuthError::validation("Malformed VK data"))?;
        let id = scalar_id(raw.id.as_ref().or(raw.user_id.as_ref()))
            .ok_or_else(|| AuthError::validation("VK ID is required"))?;

        Ok(SocialPayload::Vk(VkProfile {
            id,
            email: raw.email.map(|e| e.trim().to_lowercase()).filter(|e| !e.is_empty()),
            first_name: raw.first_name,
            last_name: raw.last_name,
            photo: raw.photo,
            gender: raw.sex.as_ref().and_then(scalar_int).and_then(vk_gender),
            birth_date: raw.bdate.as_deref().and_then(parse_vk_date),
        }))
    }

    pub fn provider(&self) -> AuthProvider {
        match self {
            SocialPayload::Telegram(_) => AuthProvider::Telegram,
            SocialPayload::Vk(_) => AuthProvider::Vk,
        }
    }

    pub fn social_id(&self) -> &str {
        match self {
            SocialPayload::Telegram(t) => &t.id,
            SocialPayload::Vk(v) => &v.id,
        }
    }

    /// Telegram ne fournit jamais d'email
    pub fn email(&self) -> Option<&str> {
        match self {
            SocialPayload::Telegram(_) => None,
            SocialPayload::Vk(v) => v.email.as_deref(),
        }
    }

    /// Nom du profil créé à l'inscription
    pub fn display_name(&self) -> Option<String> {
        match self {
            SocialPayload::Telegram(t) => t.first_name.clone(),
            SocialPayload::Vk(v) => {
                let name = [v.first_name.as_deref(), v.last_name.as_deref()]
                    .into_iter()
                    .flatten()
                    .collect::<Vec<_>>()
                    .join(" ");
                let name = name.trim().to_string();
                (!name.is_empty()).then_some(name)
            }
        }
    }

    pub fn gender(&self) -> Option<Gender> {
        match self {
            SocialPayload::Telegram(t) => t.gender,
            SocialPayload::Vk(v) => v.gender,
        }
    }

    pub fn birth_date(&self) -> Option<NaiveDate> {
        match self {
            SocialPayload::Telegram(t) => t.birth_date,
            SocialPayload::Vk(v) => v.birth_date,
        }
    }

    /// Contenu de users.social_data, rafraîchi à chaque connexion
    pub fn social_data(&self) -> Value {
        match self {
            SocialPayload::Telegram(t) => json!({
                "firstName": t.first_name,
                "lastName": t.last_name,
                "photo": t.photo_url,
                "username": t.username,
            }),
            SocialPayload::Vk(v) => json!({
                "firstName": v.first_name,
                "lastName": v.last_name,
                "photo": v.photo,
            }),
        }
    }
}

/// Un id social peut arriver en nombre ou en chaîne
fn scalar_id(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

fn scalar_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn ymd(year: i64, month: i64, day: i64) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(
        i32::try_from(year).ok()?,
        u32::try_from(month).ok()?,
        u32::try_from(day).ok()?,
    )
}

/// Codes VK: 1 = femme, 2 = homme, le reste = non renseigné
fn vk_gender(sex: i64) -> Option<Gender> {
    match sex {
        2 => Some(Gender::Male),
        1 => Some(Gender::Female),
        _ => None,
    }
}

/// "DD.MM.YYYY" -> date; "DD.MM" (année masquée) -> None
pub fn parse_vk_date(raw: &str) -> Option<NaiveDate> {
    let parts: Vec<&str> = raw.trim().split('.').collect();
    if parts.len() != 3 {
        return None;
    }
    ymd(
        parts[2].parse().ok()?,
        parts[1].parse().ok()?,
        parts[0].parse().ok()?,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_json_string() {
        let raw = Value::String(r#"{"id": 77, "first_name": "Anna"}"#.to_string());
        let payload = SocialPayload::parse(AuthProvider::Telegram, &raw).unwrap();

        assert_eq!(payload.provider(), AuthProvider::Telegram);
        assert_eq!(payload.social_id(), "77");
        assert_eq!(payload.display_name().as_deref(), Some("Anna"));
    }

    #[test]
    fn test_parse_fails_closed() {
        let malformed = Value::String("{not json".to_string());
        assert!(matches!(
            SocialPayload::parse(AuthProvider::Vk, &malformed),
            Err(AuthError::Validation(_))
        ));

        let array = json!([1, 2, 3]);
        assert!(SocialPayload::parse(AuthProvider::Vk, &array).is_err());

        let no_id = json!({"first_name": "Anna"});
        assert!(SocialPayload::parse(AuthProvider::Telegram, &no_id).is_err());

        let email = json!({"id": 1});
        assert!(SocialPayload::parse(AuthProvider::Email, &email).is_err());
    }

    #[test]
    fn test_vk_mapping() {
        let raw = json!({
            "id": 1001,
            "firstName": "Olga",
            "lastName": "Ivanova",
            "email": " Olga@Mail.RU ",
            "sex": 1,
            "bdate": "7.3.1995"
        });
        let payload = SocialPayload::parse(AuthProvider::Vk, &raw).unwrap();

        assert_eq!(payload.social_id(), "1001");
        assert_eq!(payload.email(), Some("olga@mail.ru"));
        assert_eq!(payload.display_name().as_deref(), Some("Olga Ivanova"));
        assert_eq!(payload.gender(), Some(Gender::Female));
        assert_eq!(payload.birth_date(), NaiveDate::from_ymd_opt(1995, 3, 7));
    }

    #[test]
    fn test_vk_sex_codes() {
        assert_eq!(vk_gender(2), Some(Gender::Male));
        assert_eq!(vk_gender(1), Some(Gender::Female));
        assert_eq!(vk_gender(0), None);
    }

    #[test]
    fn test_vk_dates() {
        assert_eq!(parse_vk_date("24.12.1988"), NaiveDate::from_ymd_opt(1988, 12, 24));
        assert_eq!(parse_vk_date("24.12"), None);
        assert_eq!(parse_vk_date("31.02.2000"), None);
        assert_eq!(parse_vk_date("garbage"), None);
    }

    #[test]
    fn test_telegram_transient_fields() {
        let raw = json!({
            "id": "55",
            "first_name": "Petr",
            "day": "09",
            "month": 11,
            "year": "1979",
            "gender": "male",
            "hash": "abc"
        });
        let payload = SocialPayload::parse(AuthProvider::Telegram, &raw).unwrap();

        assert_eq!(payload.birth_date(), NaiveDate::from_ymd_opt(1979, 11, 9));
        assert_eq!(payload.gender(), Some(Gender::Male));
        assert_eq!(payload.email(), None);
        match payload {
            SocialPayload::Telegram(t) => assert_eq!(t.fields.get("hash"), Some(&json!("abc"))),
            other => panic!("unexpected payload {:?}", other),
        }
    }
}
