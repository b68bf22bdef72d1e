//! User record as stored in the `users` collection.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Role names as stored on the user record and embedded in access tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Employee,
    Manager,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Employee => "Employee",
            Role::Manager => "Manager",
            Role::Admin => "Admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_roles() -> Vec<Role> {
    vec![Role::Employee]
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    /// Argon2 PHC string.
    #[serde(rename = "password")]
    pub password_hash: String,
    #[serde(default = "default_roles")]
    pub roles: Vec<Role>,
    #[serde(default = "default_active")]
    pub active: bool,
}

impl User {
    pub fn new(username: String, password_hash: String, roles: Vec<Role>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            username,
            password_hash,
            roles: if roles.is_empty() { default_roles() } else { roles },
            active: true,
        }
    }

    pub fn role_names(&self) -> Vec<String> {
        self.roles.iter().map(|r| r.as_str().to_string()).collect()
    }

    pub fn sanitized(&self) -> UserResponse {
        UserResponse::from(self.clone())
    }
}

/// User as returned by the API, without the password hash.
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    pub roles: Vec<Role>,
    pub active: bool,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            roles: u.roles,
            active: u.active,
        }
    }
}
