//! HTTP surface of the portal: public pages, login/signup/logout, and the
//! role-gated dashboards.

pub mod auth;
pub mod cookie;
pub mod dashboard;
pub mod gate;
pub mod pages;
pub mod request_logger;

use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::api::ApiClient;
use crate::config::Config;
use crate::session::{ADMIN_DASHBOARD_PATH, USER_DASHBOARD_PATH};

#[derive(Clone)]
pub struct AppState {
    pub api: ApiClient,
    pub cookie_secure: bool,
    pub cors_allowed_origins: Vec<String>,
}

impl AppState {
    pub fn from_config(config: &Config) -> Self {
        AppState {
            api: ApiClient::new(config.api_base_url.clone(), config.api_timeout()),
            cookie_secure: config.cookie_secure,
            cors_allowed_origins: config.cors_allowed_origins.clone(),
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    let secure = state.cookie_secure;
    let cors = cors_layer(&state.cors_allowed_origins);

    let router = Router::new()
        .route("/", get(pages::home))
        .route("/about", get(pages::about))
        .route("/login", get(pages::login_page).post(auth::login))
        .route("/signup", get(pages::signup_page).post(auth::signup))
        .route("/logout", post(auth::logout))
        .route("/health", get(pages::health))
        .nest(USER_DASHBOARD_PATH, dashboard::user_routes(secure))
        .nest(ADMIN_DASHBOARD_PATH, dashboard::admin_routes(secure))
        .layer(middleware::from_fn(request_logger::request_logger_middleware))
        .with_state(state);

    match cors {
        Some(cors) => router.layer(cors),
        None => router,
    }
}

/// Cross-origin access for a separately served page bundle. Cookies are
/// involved, so only explicitly listed origins are allowed.
fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    let origins = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect::<Vec<_>>();

    if origins.is_empty() {
        return None;
    }

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::CONTENT_TYPE])
            .allow_credentials(true),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cors_is_disabled_without_origins() {
        assert!(cors_layer(&[]).is_none());
        assert!(cors_layer(&["http://localhost:5173".to_string()]).is_some());
    }
}
