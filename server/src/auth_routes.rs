use std::time::Duration;

use axum::{
    Form, Router,
    http::{HeaderMap, HeaderValue, header},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use cookie::{Cookie, SameSite};
use secrecy::SecretString;
use types::{LoginForm, RegisterForm, Result, SESSION_COOKIE_NAME, UserData, form};

use crate::{BACKEND_CLIENT, CONFIG, STORAGE, session_token};

pub fn auth_router() -> Router {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/auth/logout", get(logout))
}

async fn login(Form(form): Form<LoginForm>) -> Response {
    match login_inner(form).await {
        Ok(response) => response,
        Err(error) => back_with_error("/login", &error),
    }
}

async fn login_inner(form: LoginForm) -> Result<Response> {
    form::check(&form).map_err(|e| e.into_error())?;

    let password = SecretString::from(form.password);
    let auth = BACKEND_CLIENT.login(form.email.trim(), &password).await?;
    start_session(auth.into_user_data()).await
}

async fn register(Form(form): Form<RegisterForm>) -> Response {
    match register_inner(form).await {
        Ok(response) => response,
        Err(error) => back_with_error("/register", &error),
    }
}

async fn register_inner(form: RegisterForm) -> Result<Response> {
    form::check(&form).map_err(|e| e.into_error())?;

    let password = SecretString::from(form.password);
    let auth = BACKEND_CLIENT
        .register(form.name.trim(), form.email.trim(), &password)
        .await?;
    start_session(auth.into_user_data()).await
}

async fn start_session(user_data: UserData) -> Result<Response> {
    let ttl = CONFIG.session_ttl();
    let session = STORAGE.create_session(user_data, ttl).await?;
    let token = session.as_token(&CONFIG.signing_secret)?;

    tracing::info!(user = %session.user_data().email, role = ?session.user_data().role, "signed in");
    redirect_with_cookie("/", session_cookie(token, ttl, CONFIG.secure_cookies))
}

fn session_cookie(token: String, ttl: Duration, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(cookie::time::Duration::seconds(ttl.as_secs() as i64))
        .build()
}

fn redirect_with_cookie(to: &str, cookie: Cookie<'_>) -> Result<Response> {
    let mut response = Redirect::to(to).into_response();
    response
        .headers_mut()
        .insert(header::SET_COOKIE, HeaderValue::from_str(&cookie.to_string())?);
    Ok(response)
}

/// Send the browser back to the form with the message in `?error=`.
fn back_with_error(page: &str, error: &types::Error) -> Response {
    if error.status() >= 500 {
        tracing::error!(?error, page, "authentication failed");
    } else {
        tracing::info!(%error, page, "authentication rejected");
    }

    Redirect::to(&error_location(page, &error.to_string())).into_response()
}

fn error_location(page: &str, message: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(message.as_bytes()).collect();
    format!("{page}?error={encoded}")
}

async fn logout(headers: HeaderMap) -> Response {
    if let Some(token) = session_token(&headers)
        && let Err(error) = STORAGE
            .delete_session_token(&token, &CONFIG.signing_secret)
            .await
    {
        tracing::warn!(?error, "failed to delete session");
    }

    let cookie = Cookie::build((SESSION_COOKIE_NAME, ""))
        .path("/")
        .http_only(true)
        .max_age(cookie::time::Duration::ZERO)
        .build();

    redirect_with_cookie("/login", cookie).unwrap_or_else(|error| {
        tracing::error!(?error, "failed to clear session cookie");
        Redirect::to("/login").into_response()
    })
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::*;

    #[test]
    fn session_cookie_is_scoped_and_http_only() {
        let cookie = session_cookie("abc.def".into(), Duration::from_secs(3600), false);
        let rendered = cookie.to_string();

        assert!(rendered.starts_with("cabdesk_session=abc.def"));
        assert!(rendered.contains("HttpOnly"));
        assert!(rendered.contains("SameSite=Lax"));
        assert!(rendered.contains("Path=/"));
        assert!(rendered.contains("Max-Age=3600"));
        assert!(!rendered.contains("Secure"));
        assert!(session_cookie("t".into(), Duration::ZERO, true).secure().unwrap_or(false));
    }

    #[test]
    fn errors_are_url_encoded_into_the_redirect() {
        assert_eq!(
            error_location("/login", "Invalid credentials & more"),
            "/login?error=Invalid+credentials+%26+more"
        );

        let response = back_with_error("/register", &types::Error::bad_request("Passwords do not match"));
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers()[header::LOCATION],
            "/register?error=Passwords+do+not+match"
        );
    }
}
