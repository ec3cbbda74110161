use actix_web::{get, post, web, HttpResponse};

use crate::errors::AuthError;
use crate::middleware::BearerToken;
use crate::models::dto::{
    AuthResponse, ForgotRequest, LoginRequest, MessageResponse, RefreshRequest, RegisterRequest,
    SetPasswordRequest, TelegramAuthRequest, TokenPair, UserRef, VkAuthRequest,
};
use crate::models::users::AuthProvider;
use crate::routes::cookies::SessionCookies;
use crate::services::auth_service::{AuthService, RegisterOutcome};

pub fn auth_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(register)
            .service(confirm_email)
            .service(set_password)
            .service(login)
            .service(forgot)
            .service(valid_token)
            .service(refresh_token)
            .service(vk)
            .service(telegram),
    );
}

fn message(text: &str) -> MessageResponse {
    MessageResponse {
        message: text.to_string(),
    }
}

/// 200 + paire de tokens (corps et cookies)
fn tokens_response(tokens: TokenPair, cookies: &SessionCookies) -> HttpResponse {
    let mut response = HttpResponse::Ok();
    cookies.attach(&mut response, &tokens);
    response.json(tokens)
}

fn registered_response(text: &str, outcome: RegisterOutcome, cookies: &SessionCookies) -> HttpResponse {
    let mut response = HttpResponse::Ok();
    if let Some(tokens) = &outcome.tokens {
        cookies.attach(&mut response, tokens);
    }

    let (access_token, refresh) = match outcome.tokens {
        Some(tokens) => (Some(tokens.access_token), Some(tokens.refresh_token)),
        None => (None, None),
    };

    response.json(AuthResponse {
        message: text.to_string(),
        user: UserRef {
            id: outcome.user_id,
        },
        access_token,
        refresh_token: refresh,
    })
}

/// POST /auth/register - Inscription email ou sociale (PUBLIC)
#[post("/register")]
pub async fn register(
    body: web::Json<RegisterRequest>,
    auth: web::Data<AuthService>,
    cookies: web::Data<SessionCookies>,
) -> Result<HttpResponse, AuthError> {
    let outcome = auth.register(body.into_inner()).await?;

    let text = if outcome.tokens.is_some() {
        "Registration successful"
    } else {
        "Confirmation email sent"
    };
    Ok(registered_response(text, outcome, &cookies))
}

/// GET /auth/confirm-email/{token} - Lien reçu par email (PUBLIC)
#[get("/confirm-email/{token}")]
pub async fn confirm_email(
    path: web::Path<String>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AuthError> {
    auth.confirm_email(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(message("Email confirmed")))
}

/// POST /auth/set-password - Après confirmation (PUBLIC)
#[post("/set-password")]
pub async fn set_password(
    body: web::Json<SetPasswordRequest>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AuthError> {
    auth.set_password(body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(message("Password has been set")))
}

/// POST /auth/login - Email/mot de passe ou provider social (PUBLIC)
#[post("/login")]
pub async fn login(
    body: web::Json<LoginRequest>,
    auth: web::Data<AuthService>,
    cookies: web::Data<SessionCookies>,
) -> Result<HttpResponse, AuthError> {
    let tokens = auth.login(body.into_inner()).await?;
    Ok(tokens_response(tokens, &cookies))
}

/// POST /auth/forgot - Renvoie un lien de confirmation (PUBLIC)
#[post("/forgot")]
pub async fn forgot(
    body: web::Json<ForgotRequest>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AuthError> {
    auth.forgot(body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "isError": false,
        "message": "Confirmation email sent"
    })))
}

/// GET /auth/valid-token - Vérifie le token d'accès (header Authorization)
#[get("/valid-token")]
pub async fn valid_token(
    token: BearerToken,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AuthError> {
    auth.check_session(token.as_deref()).await?;
    Ok(HttpResponse::Ok().json(message("Session is active")))
}

/// POST /auth/refresh-token - Rotation du refresh token (PUBLIC)
#[post("/refresh-token")]
pub async fn refresh_token(
    body: web::Json<RefreshRequest>,
    auth: web::Data<AuthService>,
    cookies: web::Data<SessionCookies>,
) -> Result<HttpResponse, AuthError> {
    let tokens = auth.refresh_tokens(body.refresh_token.as_deref()).await?;
    Ok(tokens_response(tokens, &cookies))
}

/// POST /auth/vk - Connexion VK, crée le compte au besoin (PUBLIC)
#[post("/vk")]
pub async fn vk(
    body: web::Json<VkAuthRequest>,
    auth: web::Data<AuthService>,
    cookies: web::Data<SessionCookies>,
) -> Result<HttpResponse, AuthError> {
    let outcome = auth.social_sign_in(AuthProvider::Vk, &body.vk_data).await?;
    Ok(registered_response("Signed in with VK", outcome, &cookies))
}

/// POST /auth/telegram - Connexion Telegram, signature obligatoire (PUBLIC)
#[post("/telegram")]
pub async fn telegram(
    body: web::Json<TelegramAuthRequest>,
    auth: web::Data<AuthService>,
    cookies: web::Data<SessionCookies>,
) -> Result<HttpResponse, AuthError> {
    let outcome = auth
        .social_sign_in(AuthProvider::Telegram, &body.telegram_data)
        .await?;
    Ok(registered_response("Signed in with Telegram", outcome, &cookies))
}
