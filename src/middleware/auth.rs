use actix_web::{dev::Payload, http::header, Error, FromRequest, HttpRequest};
use futures::future::{ready, Ready};

/// Token brut du header Authorization ("Bearer <token>" ou "<token>" seul).
/// L'extraction n'échoue jamais: c'est le service qui décide du 401.
#[derive(Debug, Clone, PartialEq)]
pub struct BearerToken(pub Option<String>);

impl BearerToken {
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }

    fn from_header(value: &str) -> Option<String> {
        let value = value.trim();
        let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();
        (!token.is_empty()).then(|| token.to_string())
    }
}

impl FromRequest for BearerToken {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        // Header absent ou non ASCII -> pas de token
        let token = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(Self::from_header);

        ready(Ok(BearerToken(token)))
    }
}
