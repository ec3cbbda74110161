pub mod auth;
pub mod cookies;

use actix_web::web;

use crate::errors::AuthError;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/api").configure(auth::auth_routes));
}

/// Corps JSON illisible -> même format d'erreur que le reste (400)
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        tracing::debug!(error = %err, "Rejected request body");
        AuthError::validation(format!("Invalid request body: {}", err)).into()
    })
}
