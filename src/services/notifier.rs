// Notifications best-effort vers le service du bot Telegram.
// Une notification ratée est tracée puis oubliée, elle ne remonte jamais d'erreur.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

#[derive(Debug, Clone)]
pub struct BotServiceConfig {
    pub base_url: String,
    pub internal_token: String,
}

/// Résultat d'une tentative de notification
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotifyOutcome {
    pub ok: bool,
    pub skipped: bool,
    pub status: Option<u16>,
    pub detail: Option<String>,
}

impl NotifyOutcome {
    fn skipped() -> Self {
        Self {
            skipped: true,
            detail: Some("not_configured".to_string()),
            ..Default::default()
        }
    }

    fn failed(status: Option<u16>, detail: String) -> Self {
        Self {
            status,
            detail: Some(detail),
            ..Default::default()
        }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, text: &str) -> NotifyOutcome;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NotifyMessage<'a> {
    text: &'a str,
    chat_id: Option<i64>,
    #[serde(rename = "parse_mode")]
    parse_mode: &'a str,
}

pub struct TelegramBotNotifier {
    client: Client,
    config: Option<BotServiceConfig>,
}

impl TelegramBotNotifier {
    pub fn new(config: Option<BotServiceConfig>) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn endpoint(base_url: &str) -> String {
        format!("{}/internal/notify", base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl Notifier for TelegramBotNotifier {
    async fn notify(&self, text: &str) -> NotifyOutcome {
        let Some(config) = &self.config else {
            tracing::warn!("Telegram bot service is not configured");
            return NotifyOutcome::skipped();
        };

        let message = NotifyMessage {
            text,
            chat_id: None,
            parse_mode: "HTML",
        };

        let response = self
            .client
            .post(Self::endpoint(&config.base_url))
            .header("x-internal-token", &config.internal_token)
            .json(&message)
            .send()
            .await;

        match response {
            Ok(res) if res.status().is_success() => NotifyOutcome {
                ok: true,
                status: Some(res.status().as_u16()),
                ..Default::default()
            },
            Ok(res) => {
                let status = res.status().as_u16();
                let body = res.text().await.unwrap_or_default();
                tracing::warn!(status, "Telegram bot notify failed");
                NotifyOutcome::failed(Some(status), body)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Telegram bot notify error");
                NotifyOutcome::failed(None, e.to_string())
            }
        }
    }
}
