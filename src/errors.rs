use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use sea_orm::DbErr;

/// Erreurs métier de l'authentification.
/// Chaque variante correspond à un code HTTP, la conversion en réponse
/// se fait à un seul endroit (ResponseError ci-dessous).
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Entrée invalide ou règle métier violée (400)
    #[error("{0}")]
    Validation(String),

    /// Mauvais identifiants, refresh token inconnu (401)
    #[error("{0}")]
    Unauthorized(String),

    #[error("Token has expired")]
    TokenExpired,

    #[error("Invalid token")]
    TokenInvalid,

    #[error("{0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn validation(message: impl Into<String>) -> Self {
        AuthError::Validation(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        AuthError::Unauthorized(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        AuthError::NotFound(message.into())
    }
}

impl From<validator::ValidationErrors> for AuthError {
    fn from(errors: validator::ValidationErrors) -> Self {
        // On garde uniquement les noms de champs fautifs, le détail reste côté client
        let mut fields: Vec<&str> = errors.field_errors().keys().copied().collect();
        fields.sort_unstable();
        AuthError::Validation(format!("Invalid fields: {}", fields.join(", ")))
    }
}

impl From<tokio::task::JoinError> for AuthError {
    fn from(e: tokio::task::JoinError) -> Self {
        AuthError::Internal(format!("Blocking task failed: {}", e))
    }
}

impl ResponseError for AuthError {
    fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Validation(_) => StatusCode::BAD_REQUEST,
            AuthError::Unauthorized(_) | AuthError::TokenExpired | AuthError::TokenInvalid => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::NotFound(_) => StatusCode::NOT_FOUND,
            AuthError::Database(_) | AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Database failure while handling auth request");
                "Internal server error".to_string()
            }
            AuthError::Internal(e) => {
                tracing::error!(error = %e, "Internal failure while handling auth request");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "isError": true,
            "message": message
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn test_status_codes() {
        assert_eq!(AuthError::validation("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AuthError::unauthorized("x").status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::TokenExpired.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::TokenInvalid.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::not_found("x").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            AuthError::Database(DbErr::Custom("boom".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[actix_web::test]
    async fn test_internal_errors_are_not_leaked() {
        let response = AuthError::Database(DbErr::Custom("password=secret".into())).error_response();
        let body = to_bytes(response.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["isError"], true);
        assert_eq!(json["message"], "Internal server error");
    }

    #[actix_web::test]
    async fn test_business_errors_keep_their_message() {
        let response = AuthError::TokenExpired.error_response();
        let body = to_bytes(response.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["message"], "Token has expired");
    }
}
