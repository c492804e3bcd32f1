//! Role view of a user account.

use coverity_connect_client::{RoleScope, User};
use serde::Serialize;

/// Human-readable description for a role name. Unknown roles get a generic `"<role> 権限"`.
#[must_use]
pub fn role_description(role: &str) -> String {
    match role {
        "administrator" => "システム全体の管理権限".to_string(),
        "projectOwner" => "プロジェクトの所有者権限".to_string(),
        "developer" => "開発者権限".to_string(),
        "analyst" => "分析者権限".to_string(),
        "viewer" => "閲覧権限".to_string(),
        other => format!("{other} 権限"),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoleView {
    pub role_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<RoleScope>,
    pub assignment_type: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AccountStatus {
    pub disabled: bool,
    pub locked: bool,
    pub local: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserRoles {
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub is_superuser: bool,
    pub groups: Vec<String>,
    pub roles: Vec<RoleView>,
    pub status: AccountStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl From<&User> for UserRoles {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            email: user.email.clone(),
            is_superuser: user.is_superuser,
            groups: user.group_names.clone(),
            roles: user
                .role_assignments
                .iter()
                .map(|ra| RoleView {
                    role_name: ra.role_name.clone(),
                    scope: ra.scope.clone(),
                    assignment_type: ra.assignment_type.clone(),
                    description: role_description(&ra.role_name),
                })
                .collect(),
            status: AccountStatus {
                disabled: user.disabled,
                locked: user.locked,
                local: user.is_local,
            },
            last_login: user.last_login.clone(),
            created_at: user.created_at.clone(),
        }
    }
}
