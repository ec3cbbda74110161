pub mod auth_service;
pub mod identity_service;
pub mod mailer;
pub mod notifier;
pub mod token_service;
