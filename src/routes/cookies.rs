use actix_web::cookie::time::Duration;
use actix_web::cookie::{Cookie, SameSite};
use actix_web::HttpResponseBuilder;

use crate::models::dto::TokenPair;
use crate::utils::jwt::REFRESH_TOKEN_DAYS;

pub const ACCESS_COOKIE: &str = "accessToken";
pub const REFRESH_COOKIE: &str = "refreshToken";

/// Cookies posés à chaque émission de tokens (Secure en production)
#[derive(Debug, Clone, Copy)]
pub struct SessionCookies {
    secure: bool,
}

impl SessionCookies {
    pub fn new(secure: bool) -> Self {
        Self { secure }
    }

    pub fn attach(&self, response: &mut HttpResponseBuilder, tokens: &TokenPair) {
        response
            .cookie(self.build(ACCESS_COOKIE, &tokens.access_token, Duration::days(1)))
            .cookie(self.build(
                REFRESH_COOKIE,
                &tokens.refresh_token,
                Duration::days(REFRESH_TOKEN_DAYS),
            ));
    }

    fn build(&self, name: &'static str, value: &str, max_age: Duration) -> Cookie<'static> {
        Cookie::build(name, value.to_string())
            .path("/")
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(self.secure)
            .max_age(max_age)
            .finish()
    }
}
