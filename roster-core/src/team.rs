//! Team aggregate.

use serde::Serialize;

use crate::error::DomainError;
use crate::user::{User, UserId};

/// A named team and its ordered member list.
///
/// Member ids are unique within a team. The active-member view is derived on
/// every call, so there is no cached state to go stale when a member is
/// toggled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Team {
    name: String,
    members: Vec<User>,
}

impl Team {
    /// Create an empty team. The name is the team's key and must be non-empty.
    pub fn new(name: impl Into<String>) -> Result<Self, DomainError> {
        let name = name.into();
        if name.is_empty() {
            return Err(DomainError::InvalidInput { field: "team_name" });
        }
        Ok(Self {
            name,
            members: Vec::new(),
        })
    }

    /// Create a team and add `members` in order, rejecting duplicate ids.
    pub fn with_members(
        name: impl Into<String>,
        members: impl IntoIterator<Item = User>,
    ) -> Result<Self, DomainError> {
        let mut team = Self::new(name)?;
        for member in members {
            team.add_member(member)?;
        }
        Ok(team)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn members(&self) -> &[User] {
        &self.members
    }

    pub fn member(&self, user_id: &UserId) -> Option<&User> {
        self.members.iter().find(|m| m.id() == user_id)
    }

    pub fn has_member(&self, user_id: &UserId) -> bool {
        self.member(user_id).is_some()
    }

    pub fn add_member(&mut self, user: User) -> Result<(), DomainError> {
        if self.has_member(user.id()) {
            return Err(DomainError::MemberExists);
        }
        self.members.push(user);
        Ok(())
    }

    /// Remove the member with `user_id`, keeping the others in order.
    pub fn remove_member(&mut self, user_id: &UserId) -> Result<User, DomainError> {
        let index = self
            .members
            .iter()
            .position(|m| m.id() == user_id)
            .ok_or(DomainError::UserNotFound)?;
        Ok(self.members.remove(index))
    }

    /// Members with `is_active = true`, in roster order.
    pub fn active_members(&self) -> impl Iterator<Item = &User> + '_ {
        self.members.iter().filter(|m| m.is_active())
    }
}
