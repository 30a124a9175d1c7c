use serde::{Deserialize, Serialize};

use super::{ADMIN_DASHBOARD_PATH, USER_DASHBOARD_PATH};

pub const ADMIN_ROLE_ID: i64 = 99;
pub const USER_ROLE_ID: i64 = 1;

/// Role carried in the token's `roleId` claim.
///
/// Only `99` has a defined meaning (administrator). Every other id is a
/// standard user; the id is kept so a page can still demand an exact match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum Role {
    Administrator,
    Standard(i64),
}

impl Role {
    pub fn from_id(id: i64) -> Self {
        if id == ADMIN_ROLE_ID {
            Role::Administrator
        } else {
            Role::Standard(id)
        }
    }

    pub fn id(self) -> i64 {
        match self {
            Role::Administrator => ADMIN_ROLE_ID,
            Role::Standard(id) => id,
        }
    }

    pub fn is_admin(self) -> bool {
        matches!(self, Role::Administrator)
    }

    /// Page a freshly logged-in viewer is sent to.
    pub fn landing_path(self) -> &'static str {
        if self.is_admin() {
            ADMIN_DASHBOARD_PATH
        } else {
            USER_DASHBOARD_PATH
        }
    }
}

impl From<i64> for Role {
    fn from(id: i64) -> Self {
        Role::from_id(id)
    }
}

impl From<Role> for i64 {
    fn from(role: Role) -> Self {
        role.id()
    }
}
