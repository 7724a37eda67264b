//! Authenticated identity resolved once per request.

use uuid::Uuid;

pub const ROLE_ADMIN: &str = "Admin";
pub const ROLE_ALUMNI: &str = "Alumni";

/// The account acting on a request together with its resolved role name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: Uuid,
    pub name: String,
    pub role: String,
    /// Access token the request authenticated with, when it came through the token service.
    pub token_id: Option<Uuid>,
}

impl Principal {
    pub fn new(id: Uuid, name: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            role: role.into(),
            token_id: None,
        }
    }

    pub fn with_token(mut self, token_id: Uuid) -> Self {
        self.token_id = Some(token_id);
        self
    }

    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }

    pub fn owns(&self, owner_id: Uuid) -> bool {
        self.id == owner_id
    }
}
