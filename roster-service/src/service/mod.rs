//! Reviewer roster use-cases.
//!
//! Each public method is one business transaction: check preconditions
//! against storage, apply a single domain operation, persist, and return the
//! updated aggregate. The first failure aborts the transaction and nothing
//! is written.

mod pull_requests;
mod teams;
mod users;

pub use pull_requests::ReassignOutcome;
pub use teams::TeamMember;

use std::sync::Arc;

use roster_core::{Randomizer, ReviewerAssigner};

use crate::config::Config;
use crate::repository::{InMemoryStore, PullRequestRepository, TeamRepository, UserRepository};

pub struct ReviewService {
    teams: Arc<dyn TeamRepository>,
    users: Arc<dyn UserRepository>,
    pull_requests: Arc<dyn PullRequestRepository>,
    assigner: ReviewerAssigner,
}

impl ReviewService {
    pub fn new(
        teams: Arc<dyn TeamRepository>,
        users: Arc<dyn UserRepository>,
        pull_requests: Arc<dyn PullRequestRepository>,
        assigner: ReviewerAssigner,
    ) -> Self {
        Self {
            teams,
            users,
            pull_requests,
            assigner,
        }
    }

    /// Service over a fresh [`InMemoryStore`].
    pub fn in_memory(rnd: Arc<dyn Randomizer>) -> Self {
        Self::with_store(Arc::new(InMemoryStore::new()), rnd)
    }

    /// Service whose three ports are all backed by `store`.
    pub fn with_store(store: Arc<InMemoryStore>, rnd: Arc<dyn Randomizer>) -> Self {
        Self::new(
            store.clone(),
            store.clone(),
            store,
            ReviewerAssigner::new(rnd),
        )
    }

    pub fn from_config(config: &Config) -> Self {
        Self::in_memory(config.randomizer())
    }
}
