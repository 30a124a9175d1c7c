use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, HeaderValue},
    response::Response,
};
use std::convert::Infallible;
use std::sync::Mutex;

use crate::session::{SessionStore, TOKEN_KEY};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Change {
    Unchanged,
    Set,
    Cleared,
}

#[derive(Debug)]
struct Inner {
    token: Option<String>,
    change: Change,
}

/// Per-request view of the viewer's `token` cookie.
///
/// Writes are recorded so the response can carry the matching `Set-Cookie`.
#[derive(Debug)]
pub struct CookieSession {
    inner: Mutex<Inner>,
}

impl Default for CookieSession {
    fn default() -> Self {
        Self::from_token(None)
    }
}

impl CookieSession {
    fn from_token(token: Option<String>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                token,
                change: Change::Unchanged,
            }),
        }
    }

    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self::from_token(read_cookie(headers, TOKEN_KEY))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// `Set-Cookie` value reflecting what happened to the token, if anything.
    pub fn set_cookie(&self, secure: bool) -> Option<HeaderValue> {
        let inner = self.lock();
        let cookie = match (&inner.change, &inner.token) {
            (Change::Set, Some(token)) => token_cookie(token, secure),
            (Change::Cleared, _) | (Change::Set, None) => removal_cookie(secure),
            (Change::Unchanged, _) => return None,
        };
        HeaderValue::from_str(&cookie).ok()
    }

    /// Appends the pending `Set-Cookie` header to `response`.
    pub fn apply(&self, response: &mut Response, secure: bool) {
        if let Some(value) = self.set_cookie(secure) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }
}

impl SessionStore for CookieSession {
    fn get(&self, key: &str) -> Option<String> {
        if key != TOKEN_KEY {
            return None;
        }
        self.lock().token.clone()
    }

    fn set(&self, key: &str, value: String) {
        if key != TOKEN_KEY {
            return;
        }
        let mut inner = self.lock();
        inner.token = Some(value);
        inner.change = Change::Set;
    }

    fn clear(&self, key: &str) {
        if key != TOKEN_KEY {
            return;
        }
        let mut inner = self.lock();
        inner.token = None;
        inner.change = Change::Cleared;
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CookieSession
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(CookieSession::from_headers(&parts.headers))
    }
}

fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

fn attributes(secure: bool) -> &'static str {
    if secure {
        "Path=/; HttpOnly; SameSite=Strict; Secure"
    } else {
        "Path=/; HttpOnly; SameSite=Strict"
    }
}

pub fn token_cookie(token: &str, secure: bool) -> String {
    format!("{}={}; {}", TOKEN_KEY, token, attributes(secure))
}

pub fn removal_cookie(secure: bool) -> String {
    format!("{}=; Max-Age=0; {}", TOKEN_KEY, attributes(secure))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(cookie: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(cookie).unwrap());
        headers
    }

    #[test]
    fn reads_token_among_other_cookies() {
        let session = CookieSession::from_headers(&headers("theme=dark; token=a.b.c; lang=de"));
        assert_eq!(session.get(TOKEN_KEY).as_deref(), Some("a.b.c"));
        assert_eq!(session.set_cookie(true), None);
    }

    #[test]
    fn empty_token_cookie_counts_as_absent() {
        let session = CookieSession::from_headers(&headers("token="));
        assert_eq!(session.get(TOKEN_KEY), None);
    }

    #[test]
    fn clearing_emits_removal_cookie() {
        let session = CookieSession::from_headers(&headers("token=a.b.c"));
        session.clear(TOKEN_KEY);
        assert_eq!(session.get(TOKEN_KEY), None);

        let cookie = session.set_cookie(false).unwrap();
        assert_eq!(
            cookie.to_str().unwrap(),
            "token=; Max-Age=0; Path=/; HttpOnly; SameSite=Strict"
        );
    }

    #[test]
    fn setting_emits_token_cookie() {
        let session = CookieSession::default();
        session.set(TOKEN_KEY, "x.y.z".to_string());
        let cookie = session.set_cookie(true).unwrap();
        assert_eq!(
            cookie.to_str().unwrap(),
            "token=x.y.z; Path=/; HttpOnly; SameSite=Strict; Secure"
        );
    }

    #[test]
    fn ignores_foreign_keys() {
        let session = CookieSession::default();
        session.set("theme", "dark".to_string());
        assert_eq!(session.get("theme"), None);
        assert_eq!(session.set_cookie(true), None);
    }
}
