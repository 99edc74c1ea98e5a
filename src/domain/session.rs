// Signed-in user and what they may see
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// A row of the `user_permissions` table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PermissionGrant {
    pub user_id: String,
    #[serde(default)]
    pub project_id: Option<i64>,
    #[serde(default)]
    pub is_admin: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Permissions {
    pub admin: bool,
    pub project_ids: Vec<i64>,
}

impl Permissions {
    pub fn from_grants(grants: &[PermissionGrant]) -> Self {
        let admin = grants.iter().any(|g| g.is_admin);
        let mut project_ids: Vec<i64> = grants.iter().filter_map(|g| g.project_id).collect();
        project_ids.sort_unstable();
        project_ids.dedup();
        Self { admin, project_ids }
    }

    pub fn can_view_project(&self, project_id: i64) -> bool {
        self.admin || self.project_ids.binary_search(&project_id).is_ok()
    }
}

/// The verified session, established once at sign-in and dropped at sign-out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    pub user: User,
    pub permissions: Permissions,
}
