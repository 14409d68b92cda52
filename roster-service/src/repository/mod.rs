//! Storage ports for teams, users and pull requests.
//!
//! Lookups return `Ok(None)` for a missing record and `Err` only for a
//! storage failure, so callers can tell "not found" apart from "broken".
//! Saves are upserts. The `insert_*` operations make the existence check and
//! the write one atomic step so that concurrent creators cannot overwrite
//! each other. `update_pull_request` does the same for read-modify-write on
//! an existing pull request.

mod memory;

pub use memory::InMemoryStore;

use async_trait::async_trait;
use thiserror::Error;

use roster_core::{DomainError, PullRequest, PullRequestId, Team, User, UserId};

/// Failure inside a storage backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("storage operation '{operation}' failed: {message}")]
    Storage { operation: String, message: String },

    #[error("corrupted record: {what}")]
    Corruption { what: String },
}

impl RepositoryError {
    pub fn storage(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Storage {
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn corruption(what: impl Into<String>) -> Self {
        Self::Corruption { what: what.into() }
    }
}

/// Result of an atomic create.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The record was written.
    Inserted,
    /// A record with the same key already existed and was left untouched.
    AlreadyExists,
}

#[async_trait]
pub trait TeamRepository: Send + Sync {
    async fn team_exists(&self, name: &str) -> Result<bool, RepositoryError>;

    /// Get a team with its current members, returning None if not found.
    async fn get_team(&self, name: &str) -> Result<Option<Team>, RepositoryError>;

    /// Store a team and its members (upsert semantics).
    ///
    /// The stored roster is replaced by `team.members()` in order.
    async fn save_team(&self, team: &Team) -> Result<(), RepositoryError>;

    /// Store a team and its members unless the name is already taken.
    async fn insert_team(&self, team: &Team) -> Result<InsertOutcome, RepositoryError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn user_exists(&self, id: &UserId) -> Result<bool, RepositoryError>;

    async fn get_user(&self, id: &UserId) -> Result<Option<User>, RepositoryError>;

    /// Store a user (upsert semantics). A changed team name moves the user
    /// to that team's roster.
    async fn save_user(&self, user: &User) -> Result<(), RepositoryError>;

    /// Members of `team_name` in roster order. Unknown teams yield an empty list.
    async fn list_by_team(&self, team_name: &str) -> Result<Vec<User>, RepositoryError>;
}

/// Mutation run inside [`PullRequestRepository::update_pull_request`].
pub type PullRequestChange<'a> =
    &'a mut (dyn FnMut(&mut PullRequest) -> Result<bool, DomainError> + Send);

/// Result of an atomic pull request update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The change was written; this is the stored record.
    Updated(PullRequest),
    /// The change asked for no write; this is the current record.
    Unchanged(PullRequest),
    /// The change refused the current record. Nothing was written.
    Rejected(DomainError),
    NotFound,
}

#[async_trait]
pub trait PullRequestRepository: Send + Sync {
    async fn pull_request_exists(&self, id: &PullRequestId) -> Result<bool, RepositoryError>;

    async fn get_pull_request(
        &self,
        id: &PullRequestId,
    ) -> Result<Option<PullRequest>, RepositoryError>;

    /// Store a pull request (upsert semantics).
    async fn save_pull_request(&self, pr: &PullRequest) -> Result<(), RepositoryError>;

    /// Store a pull request unless its id is already taken.
    async fn insert_pull_request(
        &self,
        pr: &PullRequest,
    ) -> Result<InsertOutcome, RepositoryError>;

    /// Apply `change` to the stored pull request under the store's write
    /// lock, so concurrent updates of the same id are serialized.
    ///
    /// `change` works on a copy. It returns `Ok(true)` to persist the copy,
    /// `Ok(false)` to leave the record as it is, or a domain error to reject
    /// the update. Nothing is written unless it returns `Ok(true)`.
    async fn update_pull_request(
        &self,
        id: &PullRequestId,
        change: PullRequestChange<'_>,
    ) -> Result<UpdateOutcome, RepositoryError>;

    /// Pull requests on which `reviewer` holds a slot, oldest first.
    async fn list_by_reviewer(
        &self,
        reviewer: &UserId,
    ) -> Result<Vec<PullRequest>, RepositoryError>;
}
