mod config;
mod db;
mod errors;
mod middleware;
mod models;
mod repositories;
mod routes;
mod services;
mod utils;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::repositories::SeaOrmStore;
use crate::routes::cookies::SessionCookies;
use crate::services::auth_service::AuthService;
use crate::services::mailer::{LogMailer, Mailer, SmtpMailer};
use crate::services::notifier::TelegramBotNotifier;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env().expect("Invalid configuration");

    if config.telegram_bot_token.is_none() {
        tracing::warn!("TELEGRAM_BOT_TOKEN is not set, Telegram sign-in will be rejected");
    }

    tracing::info!("Connecting to database...");
    let db = db::establish_connection(&config.database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connected");

    let store = Arc::new(SeaOrmStore::new(db));
    let mailer: Arc<dyn Mailer> = match config.smtp.clone() {
        Some(smtp) => Arc::new(SmtpMailer::new(smtp).expect("Invalid SMTP configuration")),
        None => Arc::new(LogMailer),
    };
    let notifier = Arc::new(TelegramBotNotifier::new(config.bot_service.clone()));

    let auth = web::Data::new(AuthService::new(
        &config,
        store.clone(),
        store,
        mailer,
        notifier,
    ));
    let cookies = web::Data::new(SessionCookies::new(config.production));

    tracing::info!(host = %config.host, port = config.port, "Starting server");

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .app_data(auth.clone())
            .app_data(cookies.clone())
            .app_data(routes::json_config())
            .configure(routes::configure_routes)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
