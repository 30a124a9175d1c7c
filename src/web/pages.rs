use axum::{http::Uri, Json};
use serde::Serialize;

use super::cookie::CookieSession;
use crate::session::{SessionGuard, SessionStore, ADMIN_DASHBOARD_PATH, USER_DASHBOARD_PATH};

pub const USER_SECTIONS: &[&str] = &[
    "Enter Consumption data",
    "List Consumption data",
    "Personal Details",
];

pub const ADMIN_SECTIONS: &[&str] = &[
    "Enter Consumption data",
    "List Consumption data",
    "Add Meters",
    "Personal Details",
];

/// Header navigation variant for the current viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Nav {
    pub is_admin: bool,
    pub dashboard_link: &'static str,
    pub show_login: bool,
    pub show_logout: bool,
}

impl Nav {
    /// Picks the dashboard link from the admin predicate, which does not look
    /// at expiry; an expired admin token still gets the admin link until a
    /// gated page clears it.
    pub fn for_viewer<S: SessionStore>(store: S, path: &str) -> Self {
        let guard = SessionGuard::new(store);
        let is_admin = guard.is_administrator();

        Nav {
            is_admin,
            dashboard_link: if is_admin {
                ADMIN_DASHBOARD_PATH
            } else {
                USER_DASHBOARD_PATH
            },
            show_login: guard.current_claims().is_none(),
            show_logout: path == USER_DASHBOARD_PATH || path == ADMIN_DASHBOARD_PATH,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PageView {
    pub page: &'static str,
    pub title: &'static str,
    pub nav: Nav,
    #[serde(skip_serializing_if = "no_sections")]
    pub sections: &'static [&'static str],
}

fn no_sections(sections: &&'static [&'static str]) -> bool {
    sections.is_empty()
}

impl PageView {
    pub fn new(page: &'static str, title: &'static str, nav: Nav) -> Self {
        Self {
            page,
            title,
            nav,
            sections: &[],
        }
    }

    pub fn with_sections(mut self, sections: &'static [&'static str]) -> Self {
        self.sections = sections;
        self
    }
}

fn page(session: &CookieSession, uri: &Uri, name: &'static str, title: &'static str) -> Json<PageView> {
    Json(PageView::new(name, title, Nav::for_viewer(session, uri.path())))
}

pub async fn home(session: CookieSession, uri: Uri) -> Json<PageView> {
    page(&session, &uri, "home", "Smart Meter")
}

pub async fn about(session: CookieSession, uri: Uri) -> Json<PageView> {
    page(&session, &uri, "about", "About Us")
}

pub async fn login_page(session: CookieSession, uri: Uri) -> Json<PageView> {
    page(&session, &uri, "login", "Smart Meter Login")
}

pub async fn signup_page(session: CookieSession, uri: Uri) -> Json<PageView> {
    page(&session, &uri, "signup", "Sign Up")
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn health() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}
