use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Owner,
    Admin,
    #[default]
    Member,
    Viewer,
}

/// The identity acting inside the active tenant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserIdentity {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl UserIdentity {
    pub fn new(id: impl Into<String>, role: UserRole) -> Self {
        Self {
            id: id.into(),
            email: None,
            role,
            permissions: Vec::new(),
        }
    }

    pub fn with_permissions<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions = permissions.into_iter().map(Into::into).collect();
        self
    }
}
