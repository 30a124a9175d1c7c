use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use super::cookie::CookieSession;
use super::gate::redirect;
use super::AppState;
use crate::api::models::{IssuedToken, LoginRequest, SignupRequest};
use crate::error::AppError;
use crate::session::{
    decode_token, Action, SessionGuard, SessionStore, HOME_PATH, TOKEN_KEY, USER_DASHBOARD_PATH,
};
use crate::validation::{LoginForm, SignupForm};

#[derive(Debug, Serialize)]
pub struct AuthOutcome {
    pub message: String,
    pub redirect: &'static str,
}

/// Persists the issued token as the viewer's cookie and tells the page where
/// to go next.
fn establish(
    state: &AppState,
    issued: IssuedToken,
    default_message: &str,
    redirect: &'static str,
) -> Response {
    let session = CookieSession::default();
    session.set(TOKEN_KEY, issued.token);

    let outcome = AuthOutcome {
        message: issued.message.unwrap_or_else(|| default_message.to_string()),
        redirect,
    };
    let mut response = Json(outcome).into_response();
    session.apply(&mut response, state.cookie_secure);
    response
}

pub async fn login(
    State(state): State<AppState>,
    Json(form): Json<LoginForm>,
) -> Result<Response, AppError> {
    form.validate()?;

    let issued = state
        .api
        .login(&LoginRequest {
            username: form.username,
            password: form.password,
        })
        .await?;

    let landing = match decode_token(&issued.token) {
        Ok(claims) => {
            tracing::info!(user_id = claims.user_id, role_id = claims.role_id, "Login succeeded");
            claims.role().landing_path()
        }
        Err(err) => {
            tracing::warn!(error = %err, "Login returned an undecodable token");
            USER_DASHBOARD_PATH
        }
    };

    Ok(establish(&state, issued, "Login successful", landing))
}

pub async fn signup(
    State(state): State<AppState>,
    Json(form): Json<SignupForm>,
) -> Result<Response, AppError> {
    form.validate()?;

    let email = form.email.trim().to_string();
    let issued = state
        .api
        .signup(&SignupRequest {
            username: email.clone(),
            password: form.password,
            email,
            first_name: form.first_name,
            last_name: form.last_name,
            phone: form.phone,
            address: form.address,
            city: form.city,
            zip_code: form.zip_code,
        })
        .await?;

    tracing::info!("Signup succeeded");
    Ok(establish(&state, issued, "Signup successful", USER_DASHBOARD_PATH))
}

/// Purely local: the cookie is dropped, the backend is not contacted.
pub async fn logout(State(state): State<AppState>, session: CookieSession) -> Response {
    let target = match SessionGuard::new(&session).logout() {
        Action::Redirect(path) => path,
        Action::Allow => HOME_PATH.to_string(),
    };
    redirect(&target, &session, state.cookie_secure)
}
