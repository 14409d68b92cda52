use tracing::{info, warn};

use roster_core::{DomainError, Team, User, UserId};

use super::ReviewService;
use crate::error::{RepositoryResultExt, ServiceError};
use crate::repository::InsertOutcome;

/// A member listed when a team is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamMember {
    pub user_id: UserId,
    pub username: String,
    pub is_active: bool,
}

impl TeamMember {
    pub fn new(user_id: impl Into<UserId>, username: impl Into<String>, is_active: bool) -> Self {
        Self {
            user_id: user_id.into(),
            username: username.into(),
            is_active,
        }
    }
}

impl ReviewService {
    /// Create a team and persist each of its members.
    ///
    /// Fails with `TeamExists` if the name is taken, including when another
    /// caller creates the same team concurrently.
    pub async fn create_team(
        &self,
        name: &str,
        members: Vec<TeamMember>,
    ) -> Result<Team, ServiceError> {
        let team = Team::with_members(
            name,
            members
                .into_iter()
                .map(|m| User::new(m.user_id, m.username, name, m.is_active)),
        )?;

        if self
            .teams
            .team_exists(name)
            .await
            .context("checking team exists")?
        {
            warn!("Refusing to create team {}: name already taken", name);
            return Err(DomainError::TeamExists.into());
        }

        match self.teams.insert_team(&team).await.context("saving team")? {
            InsertOutcome::Inserted => {}
            InsertOutcome::AlreadyExists => {
                warn!("Team {} was created concurrently", name);
                return Err(DomainError::TeamExists.into());
            }
        }

        info!(
            "Created team {} with {} members",
            team.name(),
            team.members().len()
        );
        Ok(team)
    }

    pub async fn get_team(&self, name: &str) -> Result<Team, ServiceError> {
        self.teams
            .get_team(name)
            .await
            .context("getting team")?
            .ok_or_else(|| DomainError::TeamNotFound.into())
    }
}
