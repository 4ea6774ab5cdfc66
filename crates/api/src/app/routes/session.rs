use std::sync::Arc;

use axum::{
    Json,
    extract::Extension,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::Utc;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::middleware::TOKEN_COOKIE;

/// POST /login: issues a token in the body and as an HttpOnly cookie.
pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::LoginRequest>,
) -> Response {
    let session = match services
        .access
        .login(body.username.trim(), &body.password, Utc::now())
        .await
    {
        Ok(s) => s,
        Err(e) => return errors::service_error_to_response(e),
    };

    let cookie = token_cookie(&session.token.token, session.token.max_age_secs);
    let body = dto::LoginResponse {
        token: session.token.token,
        expires_in: session.token.max_age_secs,
        user: session.user.into(),
    };
    let mut res = (StatusCode::OK, Json(body)).into_response();
    match HeaderValue::from_str(&cookie) {
        Ok(v) => {
            res.headers_mut().insert(header::SET_COOKIE, v);
        }
        Err(e) => tracing::warn!(error = %e, "token cookie not set"),
    }
    res
}

/// POST /logout: expires the login cookie. Tokens are stateless, so a bearer
/// token stays valid until it expires.
pub async fn logout() -> Response {
    let mut res = StatusCode::NO_CONTENT.into_response();
    if let Ok(v) = HeaderValue::from_str(&token_cookie("", 0)) {
        res.headers_mut().insert(header::SET_COOKIE, v);
    }
    res
}

fn token_cookie(value: &str, max_age_secs: i64) -> String {
    format!("{TOKEN_COOKIE}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_secs}")
}
