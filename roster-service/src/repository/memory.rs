//! In-memory implementation of the storage ports.
//!
//! All state lives behind one `RwLock` and is lost on restart. Teams are
//! stored as ordered rosters of user ids; members are read back from the
//! user table, so a toggled user is seen through every team read.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use roster_core::{PullRequest, PullRequestId, Team, User, UserId};

use super::{
    InsertOutcome, PullRequestChange, PullRequestRepository, RepositoryError, TeamRepository,
    UpdateOutcome, UserRepository,
};

#[derive(Debug, Default)]
struct StoreState {
    users: HashMap<UserId, User>,
    /// Team name -> member ids in roster order.
    rosters: HashMap<String, Vec<UserId>>,
    pull_requests: HashMap<PullRequestId, PullRequest>,
}

impl StoreState {
    fn members_of(&self, team_name: &str) -> Result<Vec<User>, RepositoryError> {
        let Some(roster) = self.rosters.get(team_name) else {
            return Ok(Vec::new());
        };
        roster
            .iter()
            .map(|id| {
                self.users.get(id).cloned().ok_or_else(|| {
                    RepositoryError::corruption(format!(
                        "team '{}' lists unknown user '{}'",
                        team_name, id
                    ))
                })
            })
            .collect()
    }

    fn team(&self, name: &str) -> Result<Option<Team>, RepositoryError> {
        if !self.rosters.contains_key(name) {
            return Ok(None);
        }
        let members = self.members_of(name)?;
        Team::with_members(name, members)
            .map(Some)
            .map_err(|e| RepositoryError::corruption(format!("team '{}': {}", name, e)))
    }

    fn put_user(&mut self, user: User) {
        let id = user.id().clone();
        let new_team = user.team_name().to_string();

        if let Some(previous) = self.users.get(&id) {
            if previous.team_name() != new_team {
                if let Some(roster) = self.rosters.get_mut(previous.team_name()) {
                    roster.retain(|member| *member != id);
                }
            }
        }
        if let Some(roster) = self.rosters.get_mut(&new_team) {
            if !roster.contains(&id) {
                roster.push(id.clone());
            }
        }
        self.users.insert(id, user);
    }

    fn put_team(&mut self, team: &Team) {
        for member in team.members() {
            self.put_user(member.clone());
        }
        let roster = team.members().iter().map(|m| m.id().clone()).collect();
        self.rosters.insert(team.name().to_string(), roster);
    }
}

/// In-memory storage for teams, users and pull requests.
///
/// One instance implements all three repository traits; share it behind an
/// `Arc` to hand the same store to each port.
pub struct InMemoryStore {
    state: RwLock<StoreState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(StoreState::default()),
        }
    }

    /// Number of stored teams.
    pub async fn team_count(&self) -> usize {
        self.state.read().await.rosters.len()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TeamRepository for InMemoryStore {
    async fn team_exists(&self, name: &str) -> Result<bool, RepositoryError> {
        let state = self.state.read().await;
        Ok(state.rosters.contains_key(name))
    }

    async fn get_team(&self, name: &str) -> Result<Option<Team>, RepositoryError> {
        let state = self.state.read().await;
        state.team(name)
    }

    async fn save_team(&self, team: &Team) -> Result<(), RepositoryError> {
        let mut state = self.state.write().await;
        state.put_team(team);
        Ok(())
    }

    async fn insert_team(&self, team: &Team) -> Result<InsertOutcome, RepositoryError> {
        let mut state = self.state.write().await;
        if state.rosters.contains_key(team.name()) {
            return Ok(InsertOutcome::AlreadyExists);
        }
        state.put_team(team);
        Ok(InsertOutcome::Inserted)
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn user_exists(&self, id: &UserId) -> Result<bool, RepositoryError> {
        let state = self.state.read().await;
        Ok(state.users.contains_key(id))
    }

    async fn get_user(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state.users.get(id).cloned())
    }

    async fn save_user(&self, user: &User) -> Result<(), RepositoryError> {
        let mut state = self.state.write().await;
        state.put_user(user.clone());
        Ok(())
    }

    async fn list_by_team(&self, team_name: &str) -> Result<Vec<User>, RepositoryError> {
        let state = self.state.read().await;
        state.members_of(team_name)
    }
}

#[async_trait]
impl PullRequestRepository for InMemoryStore {
    async fn pull_request_exists(&self, id: &PullRequestId) -> Result<bool, RepositoryError> {
        let state = self.state.read().await;
        Ok(state.pull_requests.contains_key(id))
    }

    async fn get_pull_request(
        &self,
        id: &PullRequestId,
    ) -> Result<Option<PullRequest>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state.pull_requests.get(id).cloned())
    }

    async fn save_pull_request(&self, pr: &PullRequest) -> Result<(), RepositoryError> {
        let mut state = self.state.write().await;
        state.pull_requests.insert(pr.id().clone(), pr.clone());
        Ok(())
    }

    async fn insert_pull_request(
        &self,
        pr: &PullRequest,
    ) -> Result<InsertOutcome, RepositoryError> {
        let mut state = self.state.write().await;
        match state.pull_requests.entry(pr.id().clone()) {
            Entry::Occupied(_) => Ok(InsertOutcome::AlreadyExists),
            Entry::Vacant(entry) => {
                entry.insert(pr.clone());
                Ok(InsertOutcome::Inserted)
            }
        }
    }

    async fn update_pull_request(
        &self,
        id: &PullRequestId,
        change: PullRequestChange<'_>,
    ) -> Result<UpdateOutcome, RepositoryError> {
        let mut state = self.state.write().await;
        let Some(stored) = state.pull_requests.get_mut(id) else {
            return Ok(UpdateOutcome::NotFound);
        };

        let mut draft = stored.clone();
        match change(&mut draft) {
            Err(e) => Ok(UpdateOutcome::Rejected(e)),
            Ok(false) => Ok(UpdateOutcome::Unchanged(stored.clone())),
            Ok(true) => {
                *stored = draft.clone();
                Ok(UpdateOutcome::Updated(draft))
            }
        }
    }

    async fn list_by_reviewer(
        &self,
        reviewer: &UserId,
    ) -> Result<Vec<PullRequest>, RepositoryError> {
        let state = self.state.read().await;
        let mut prs: Vec<PullRequest> = state
            .pull_requests
            .values()
            .filter(|pr| pr.has_reviewer(reviewer))
            .cloned()
            .collect();
        prs.sort_by(|a, b| {
            a.created_at()
                .cmp(&b.created_at())
                .then_with(|| a.id().cmp(b.id()))
        });
        Ok(prs)
    }
}
