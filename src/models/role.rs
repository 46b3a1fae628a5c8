use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::HashSet;

/// Typed capability attached to a role. Checked by set membership on the
/// authenticated principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    DocRead,
    DocWrite,
    DocDelete,
    CollectionRead,
    CollectionWrite,
    CollectionDelete,
    UserRead,
    UserWrite,
    UserDelete,
}

impl Permission {
    pub fn describe(&self) -> &'static str {
        match self {
            Permission::DocRead => "read documents",
            Permission::DocWrite => "create documents",
            Permission::DocDelete => "delete documents",
            Permission::CollectionRead => "read collections",
            Permission::CollectionWrite => "create or update collections",
            Permission::CollectionDelete => "delete collections",
            Permission::UserRead => "read users",
            Permission::UserWrite => "create or update users",
            Permission::UserDelete => "delete users",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Role {
    pub role_id: i32,
    pub role_name: String,
    pub description: Option<String>,
    /// JSON array of permission names as stored in the `permissions` column.
    #[serde(skip_serializing)]
    pub permissions: String,
}

impl Role {
    /// Parses the stored permission list. Unknown entries are dropped with a
    /// warning rather than failing authentication.
    pub fn permission_set(&self) -> HashSet<Permission> {
        match serde_json::from_str::<Vec<serde_json::Value>>(&self.permissions) {
            Ok(values) => values
                .into_iter()
                .filter_map(|v| match serde_json::from_value::<Permission>(v.clone()) {
                    Ok(p) => Some(p),
                    Err(_) => {
                        tracing::warn!("Unknown permission entry in role {}: {}", self.role_id, v);
                        None
                    }
                })
                .collect(),
            Err(e) => {
                tracing::warn!("Malformed permissions for role {}: {}", self.role_id, e);
                HashSet::new()
            }
        }
    }
}

#[derive(Debug, Serialize, FromRow)]
pub struct RoleSummary {
    pub role_id: i32,
    pub role_name: String,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RoleResponse {
    pub role_id: i32,
    pub role_name: String,
    pub description: Option<String>,
    pub permissions: Vec<Permission>,
}

impl From<Role> for RoleResponse {
    fn from(role: Role) -> Self {
        let mut permissions: Vec<Permission> = role.permission_set().into_iter().collect();
        permissions.sort_by_key(|p| format!("{:?}", p));
        RoleResponse {
            role_id: role.role_id,
            role_name: role.role_name,
            description: role.description,
            permissions,
        }
    }
}
