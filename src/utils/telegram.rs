//! Vérification des données du widget de connexion Telegram.
//!
//! secret = SHA-256(bot token), signature = HMAC-SHA-256(secret, data_check_string)
//! où data_check_string = les champs "clé=valeur" triés par clé, séparés par '\n'.

use hmac::{Hmac, Mac};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

/// Champs ajoutés par le frontend, hors signature Telegram
pub const TRANSIENT_FIELDS: [&str; 4] = ["day", "month", "year", "gender"];

#[derive(Clone)]
pub struct TelegramSignatureVerifier {
    secret_key: Option<[u8; 32]>,
}

impl TelegramSignatureVerifier {
    pub fn new(bot_token: Option<&str>) -> Self {
        let secret_key = bot_token.map(|token| {
            let digest = Sha256::digest(token.as_bytes());
            let mut key = [0u8; 32];
            key.copy_from_slice(&digest);
            key
        });
        Self { secret_key }
    }

    /// Signature hex attendue pour ce payload, None si aucun bot token n'est configuré
    pub fn sign(&self, payload: &Map<String, Value>) -> Option<String> {
        let mac = self.mac_for(payload)?;
        Some(hex::encode(mac.finalize().into_bytes()))
    }

    /// true seulement si le champ `hash` correspond (comparaison en temps constant)
    pub fn verify(&self, payload: &Map<String, Value>) -> bool {
        let Some(supplied) = payload.get("hash").and_then(Value::as_str) else {
            return false;
        };
        let Ok(supplied) = hex::decode(supplied) else {
            return false;
        };
        let Some(mac) = self.mac_for(payload) else {
            tracing::warn!("TELEGRAM_BOT_TOKEN is not configured, rejecting Telegram payload");
            return false;
        };

        mac.verify_slice(&supplied).is_ok()
    }

    fn mac_for(&self, payload: &Map<String, Value>) -> Option<HmacSha256> {
        let secret_key = self.secret_key.as_ref()?;
        let mut mac = HmacSha256::new_from_slice(secret_key).ok()?;
        mac.update(data_check_string(payload).as_bytes());
        Some(mac)
    }
}

/// "clé=valeur" triés, sans `hash` ni les champs transitoires
pub fn data_check_string(payload: &Map<String, Value>) -> String {
    let mut entries: Vec<(&String, &Value)> = payload
        .iter()
        .filter(|(key, _)| key.as_str() != "hash" && !TRANSIENT_FIELDS.contains(&key.as_str()))
        .collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    entries
        .into_iter()
        .map(|(key, value)| format!("{}={}", key, value_text(value)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const BOT_TOKEN: &str = "123456:TEST-bot-token";

    fn payload() -> Map<String, Value> {
        json!({
            "id": 4242,
            "first_name": "Ivan",
            "last_name": "Petrov",
            "username": "ivanp",
            "photo_url": "https://t.me/i/userpic/320/ivanp.jpg",
            "auth_date": 1700000000,
            "day": "12",
            "month": "04",
            "year": "1990",
            "gender": "male"
        })
        .as_object()
        .cloned()
        .unwrap()
    }

    fn signed(verifier: &TelegramSignatureVerifier) -> Map<String, Value> {
        let mut data = payload();
        let hash = verifier.sign(&data).unwrap();
        data.insert("hash".to_string(), Value::String(hash));
        data
    }

    #[test]
    fn test_data_check_string_is_sorted_and_filtered() {
        let check = data_check_string(&payload());
        assert_eq!(
            check,
            "auth_date=1700000000\nfirst_name=Ivan\nid=4242\nlast_name=Petrov\n\
             photo_url=https://t.me/i/userpic/320/ivanp.jpg\nusername=ivanp"
        );
    }

    #[test]
    fn test_signed_payload_verifies() {
        let verifier = TelegramSignatureVerifier::new(Some(BOT_TOKEN));
        assert!(verifier.verify(&signed(&verifier)));
    }

    #[test]
    fn test_mutating_signed_field_breaks_signature() {
        let verifier = TelegramSignatureVerifier::new(Some(BOT_TOKEN));
        for field in ["id", "first_name", "last_name", "username", "photo_url", "auth_date"] {
            let mut data = signed(&verifier);
            data.insert(field.to_string(), json!("tampered"));
            assert!(!verifier.verify(&data), "field {} should be signed", field);
        }

        let mut data = signed(&verifier);
        data.insert("extra".to_string(), json!("added"));
        assert!(!verifier.verify(&data));
    }

    #[test]
    fn test_mutating_transient_field_keeps_signature() {
        let verifier = TelegramSignatureVerifier::new(Some(BOT_TOKEN));
        for field in TRANSIENT_FIELDS {
            let mut data = signed(&verifier);
            data.insert(field.to_string(), json!("changed"));
            assert!(verifier.verify(&data), "field {} should be ignored", field);
        }
    }

    #[test]
    fn test_wrong_bot_token() {
        let verifier = TelegramSignatureVerifier::new(Some(BOT_TOKEN));
        let other = TelegramSignatureVerifier::new(Some("999:other"));
        assert!(!other.verify(&signed(&verifier)));
    }

    #[test]
    fn test_malformed_payloads_are_rejected() {
        let verifier = TelegramSignatureVerifier::new(Some(BOT_TOKEN));

        let mut missing = payload();
        missing.remove("hash");
        assert!(!verifier.verify(&missing));

        let mut not_hex = payload();
        not_hex.insert("hash".to_string(), json!("zz-not-hex"));
        assert!(!verifier.verify(&not_hex));

        let mut numeric = payload();
        numeric.insert("hash".to_string(), json!(12345));
        assert!(!verifier.verify(&numeric));
    }

    #[test]
    fn test_unconfigured_verifier_rejects_everything() {
        let configured = TelegramSignatureVerifier::new(Some(BOT_TOKEN));
        let unconfigured = TelegramSignatureVerifier::new(None);
        assert!(unconfigured.sign(&payload()).is_none());
        assert!(!unconfigured.verify(&signed(&configured)));
    }
}
