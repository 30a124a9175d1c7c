//! Client-side session handling: token claims, role model, the token store
//! and the guard that gates pages on them.

pub mod claims;
pub mod guard;
pub mod role;
pub mod store;

pub use claims::{decode_token, Claims};
pub use guard::{Action, Clock, FixedClock, SessionError, SessionGuard, SystemClock};
pub use role::{Role, ADMIN_ROLE_ID, USER_ROLE_ID};
pub use store::{MemorySessionStore, SessionStore, TOKEN_KEY};

pub const HOME_PATH: &str = "/";
pub const LOGIN_PATH: &str = "/login";
pub const USER_DASHBOARD_PATH: &str = "/userDashboard";
pub const ADMIN_DASHBOARD_PATH: &str = "/adminDashboard";
