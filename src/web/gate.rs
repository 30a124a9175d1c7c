use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use super::cookie::CookieSession;
use crate::session::{Claims, SessionGuard, ADMIN_ROLE_ID, HOME_PATH, USER_ROLE_ID};

/// Role requirement of a group of pages.
#[derive(Debug, Clone, Copy)]
pub struct PageGate {
    pub required_role_id: i64,
    pub fallback_path: &'static str,
    pub cookie_secure: bool,
}

impl PageGate {
    pub fn user(cookie_secure: bool) -> Self {
        Self {
            required_role_id: USER_ROLE_ID,
            fallback_path: HOME_PATH,
            cookie_secure,
        }
    }

    pub fn admin(cookie_secure: bool) -> Self {
        Self {
            required_role_id: ADMIN_ROLE_ID,
            fallback_path: HOME_PATH,
            cookie_secure,
        }
    }
}

/// Authenticated viewer, attached to requests that passed the gate.
#[derive(Debug, Clone)]
pub struct Viewer {
    pub token: String,
    pub claims: Claims,
}

/// Runs the session guard on every request to a gated page.
pub async fn require_role(State(gate): State<PageGate>, mut req: Request, next: Next) -> Response {
    let session = CookieSession::from_headers(req.headers());
    let admitted =
        SessionGuard::new(&session).admit(gate.required_role_id, gate.fallback_path);

    match admitted {
        Ok((token, claims)) => {
            req.extensions_mut().insert(Viewer { token, claims });
            next.run(req).await
        }
        Err(path) => redirect(&path, &session, gate.cookie_secure),
    }
}

/// `303 See Other` to `path`, carrying any pending session cookie change.
pub fn redirect(path: &str, session: &CookieSession, cookie_secure: bool) -> Response {
    let mut response = Redirect::to(path).into_response();
    session.apply(&mut response, cookie_secure);
    response
}
