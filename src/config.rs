// ============================================================================
// CONFIGURATION
// ============================================================================
//
// Description:
//   Toute la configuration est lue UNE fois au démarrage (main.rs) puis passée
//   explicitement aux services. Aucun service ne lit l'environnement lui-même.
//
// Variables obligatoires:
//   - DATABASE_URL
//   - JWT_SECRET
//   - JWT_EXPIRATION (format: nombre + unité, ex: 15m, 1h, 7d)
//
// Variables optionnelles: voir AppConfig::from_lookup
//
// ============================================================================

use chrono::{Duration, Utc};

use crate::services::mailer::SmtpConfig;
use crate::services::notifier::BotServiceConfig;
use crate::utils::jwt::JwtConfig;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_CONFIRMATION_TTL_HOURS: i64 = 360;
const DEFAULT_CONFIRMATION_URL: &str = "https://avalik-avatar.ru/confirm-email";
const DEFAULT_SMTP_PORT: u16 = 465;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    /// APP_ENV=production -> cookies Secure
    pub production: bool,
    pub jwt: JwtConfig,
    pub telegram_bot_token: Option<String>,
    pub confirmation_ttl: Duration,
    pub smtp: Option<SmtpConfig>,
    pub bot_service: Option<BotServiceConfig>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Construit la config à partir d'une fonction de lecture (testable sans toucher à l'env)
    pub fn from_lookup<F>(get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| get(key).filter(|v| !v.trim().is_empty());

        let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let secret = get("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;
        let expiration = get("JWT_EXPIRATION").ok_or(ConfigError::Missing("JWT_EXPIRATION"))?;
        let access_ttl = parse_duration(&expiration).map_err(|reason| ConfigError::Invalid {
            var: "JWT_EXPIRATION",
            reason,
        })?;

        let port = match get("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError::Invalid {
                var: "PORT",
                reason: e.to_string(),
            })?,
            None => DEFAULT_PORT,
        };

        let confirmation_ttl_hours = match get("CONFIRMATION_TTL_HOURS") {
            Some(raw) => raw.parse::<i64>().map_err(|e| ConfigError::Invalid {
                var: "CONFIRMATION_TTL_HOURS",
                reason: e.to_string(),
            })?,
            None => DEFAULT_CONFIRMATION_TTL_HOURS,
        };
        let confirmation_ttl = Duration::try_hours(confirmation_ttl_hours)
            .filter(|ttl| *ttl > Duration::zero() && fits_calendar(*ttl))
            .ok_or_else(|| ConfigError::Invalid {
                var: "CONFIRMATION_TTL_HOURS",
                reason: format!("expected a positive number of hours, got {}", confirmation_ttl_hours),
            })?;

        let production = get("APP_ENV")
            .map(|env| env.eq_ignore_ascii_case("production"))
            .unwrap_or(false);

        let confirmation_url =
            get("CONFIRMATION_URL").unwrap_or_else(|| DEFAULT_CONFIRMATION_URL.to_string());

        let smtp = match get("SMTP_HOST") {
            Some(host) => {
                let port = match get("SMTP_PORT") {
                    Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError::Invalid {
                        var: "SMTP_PORT",
                        reason: e.to_string(),
                    })?,
                    None => DEFAULT_SMTP_PORT,
                };
                Some(SmtpConfig {
                    host,
                    port,
                    from_address: get("MAIL").ok_or(ConfigError::Missing("MAIL"))?,
                    password: get("MAIL_PASSWORD"),
                    confirmation_url,
                })
            }
            None => None,
        };

        let bot_service = match (get("TELEGRAM_BOT_SERVICE_URL"), get("TELEGRAM_BOT_INTERNAL_TOKEN")) {
            (Some(base_url), Some(internal_token)) => Some(BotServiceConfig {
                base_url,
                internal_token,
            }),
            _ => None,
        };

        Ok(Self {
            database_url,
            host: get("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            production,
            jwt: JwtConfig::new(secret, access_ttl),
            telegram_bot_token: get("TELEGRAM_BOT_TOKEN"),
            confirmation_ttl,
            smtp,
            bot_service,
        })
    }
}

/// Parse une durée au format "<nombre><s|m|h|d>" (ex: "15m", "24h", "7d")
pub fn parse_duration(raw: &str) -> Result<Duration, String> {
    let raw = raw.trim();
    let unit = raw
        .chars()
        .last()
        .ok_or_else(|| "empty duration".to_string())?;
    let amount = raw[..raw.len() - unit.len_utf8()]
        .parse::<i64>()
        .map_err(|_| format!("expected <number><s|m|h|d>, got '{}'", raw))?;

    if amount <= 0 {
        return Err(format!("duration must be positive, got '{}'", raw));
    }

    let duration = match unit {
        's' => Duration::try_seconds(amount),
        'm' => Duration::try_minutes(amount),
        'h' => Duration::try_hours(amount),
        'd' => Duration::try_days(amount),
        _ => return Err(format!("unknown duration unit '{}' in '{}'", unit, raw)),
    };
    duration
        .filter(|d| fits_calendar(*d))
        .ok_or_else(|| format!("duration out of range: '{}'", raw))
}

// now + ttl ne doit jamais déborder (sinon panic à l'émission des tokens)
fn fits_calendar(ttl: Duration) -> bool {
    Utc::now().checked_add_signed(ttl).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("DATABASE_URL", "postgres://localhost/avatars"),
        ("JWT_SECRET", "secret"),
        ("JWT_EXPIRATION", "1h"),
    ];

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("30s").unwrap(), Duration::seconds(30));
        assert_eq!(parse_duration("15m").unwrap(), Duration::minutes(15));
        assert_eq!(parse_duration("24h").unwrap(), Duration::hours(24));
        assert_eq!(parse_duration("7d").unwrap(), Duration::days(7));
    }

    #[test]
    fn test_parse_duration_rejects_garbage() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("h").is_err());
        assert!(parse_duration("10w").is_err());
        assert!(parse_duration("1.5h").is_err());
        assert!(parse_duration("0m").is_err());
        assert!(parse_duration("999999999999999d").is_err());
    }

    #[test]
    fn test_confirmation_ttl_must_be_positive_and_in_range() {
        for raw in ["-5", "0", "1000000000000", "9223372036854775807"] {
            let mut pairs = REQUIRED.to_vec();
            pairs.push(("CONFIRMATION_TTL_HOURS", raw));

            let err = AppConfig::from_lookup(lookup(&pairs)).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid { var: "CONFIRMATION_TTL_HOURS", .. }));
        }
    }

    #[test]
    fn test_defaults_when_only_required_vars() {
        let config = AppConfig::from_lookup(lookup(&REQUIRED)).unwrap();

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert!(!config.production);
        assert_eq!(config.confirmation_ttl, Duration::hours(360));
        assert_eq!(config.jwt.access_ttl, Duration::hours(1));
        assert!(config.telegram_bot_token.is_none());
        assert!(config.smtp.is_none());
        assert!(config.bot_service.is_none());
    }

    #[test]
    fn test_missing_secret_is_reported() {
        let err = AppConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/avatars"),
            ("JWT_EXPIRATION", "1h"),
        ]))
        .unwrap_err();

        assert!(matches!(err, ConfigError::Missing("JWT_SECRET")));
    }

    #[test]
    fn test_invalid_expiration_is_reported() {
        let err = AppConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/avatars"),
            ("JWT_SECRET", "secret"),
            ("JWT_EXPIRATION", "one hour"),
        ]))
        .unwrap_err();

        assert!(matches!(err, ConfigError::Invalid { var: "JWT_EXPIRATION", .. }));
    }

    #[test]
    fn test_optional_collaborators() {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend([
            ("APP_ENV", "production"),
            ("SMTP_HOST", "mail.example.org"),
            ("MAIL", "noreply@example.org"),
            ("TELEGRAM_BOT_SERVICE_URL", "http://bot:8000/"),
            ("TELEGRAM_BOT_INTERNAL_TOKEN", "internal"),
        ]);
        let config = AppConfig::from_lookup(lookup(&pairs)).unwrap();

        assert!(config.production);
        let smtp = config.smtp.unwrap();
        assert_eq!(smtp.port, 465);
        assert_eq!(smtp.confirmation_url, "https://avalik-avatar.ru/confirm-email");
        assert_eq!(config.bot_service.unwrap().internal_token, "internal");
    }
}
