//! Envoi de l'email de confirmation.
//!
//! `SmtpMailer` passe par `lettre` (TLS implicite, port 465 par défaut).
//! Sans `SMTP_HOST`, `LogMailer` se contente de tracer l'envoi.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

const CONFIRMATION_SUBJECT: &str = "Подтверждение регистрации";

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Email build error: {0}")]
    Build(String),
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    /// Expéditeur, sert aussi de login SMTP
    pub from_address: String,
    pub password: Option<String>,
    /// Base du lien envoyé, le token est ajouté en fin de chemin
    pub confirmation_url: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_confirmation_email(&self, email: &str, token: &str) -> Result<(), MailError>;
}

pub fn confirmation_link(base_url: &str, token: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), token)
}

fn confirmation_body(link: &str) -> String {
    format!(
        "<p>Для подтверждения вашей почты перейдите по <a href=\"{}\">ссылке</a></p>",
        link
    )
}

pub struct SmtpMailer {
    config: SmtpConfig,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(config: SmtpConfig) -> Result<Self, MailError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?.port(config.port);

        if let Some(password) = &config.password {
            builder = builder.credentials(Credentials::new(
                config.from_address.clone(),
                password.clone(),
            ));
        }

        Ok(Self {
            transport: builder.build(),
            config,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_confirmation_email(&self, email: &str, token: &str) -> Result<(), MailError> {
        let link = confirmation_link(&self.config.confirmation_url, token);

        let message = Message::builder()
            .from(self.config.from_address.parse()?)
            .to(email.parse()?)
            .subject(CONFIRMATION_SUBJECT)
            .header(ContentType::TEXT_HTML)
            .body(confirmation_body(&link))
            .map_err(|e| MailError::Build(e.to_string()))?;

        self.transport.send(message).await?;

        tracing::info!(to = email, "Confirmation email sent");
        Ok(())
    }
}

/// Remplaçant quand SMTP n'est pas configuré (dev)
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_confirmation_email(&self, email: &str, _token: &str) -> Result<(), MailError> {
        tracing::warn!(to = email, "SMTP is not configured, confirmation email not sent");
        Ok(())
    }
}
