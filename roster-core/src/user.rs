//! Team members and their identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Newtype for user IDs to prevent mixing with team or pull request names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A member of exactly one team.
///
/// The team affiliation is a denormalized name, not a handle to the `Team`
/// aggregate. The only state change a user supports is the activation toggle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    id: UserId,
    username: String,
    team_name: String,
    is_active: bool,
}

impl User {
    pub fn new(
        id: impl Into<UserId>,
        username: impl Into<String>,
        team_name: impl Into<String>,
        is_active: bool,
    ) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            team_name: team_name.into(),
            is_active,
        }
    }

    pub fn id(&self) -> &UserId {
        &self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn team_name(&self) -> &str {
        &self.team_name
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Overwrite the activation flag. Toggling is unrestricted.
    pub fn set_active(&mut self, is_active: bool) {
        self.is_active = is_active;
    }
}
