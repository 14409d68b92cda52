pub mod config;
pub mod error;
pub mod repository;
pub mod service;

pub use config::Config;
pub use error::ServiceError;
pub use repository::{
    InMemoryStore, InsertOutcome, PullRequestChange, PullRequestRepository, RepositoryError,
    TeamRepository, UpdateOutcome, UserRepository,
};
pub use service::{ReassignOutcome, ReviewService, TeamMember};

use tracing::Level;

/// Install a `fmt` subscriber capped at `level`.
///
/// Returns false when a global subscriber was already set.
pub fn init_tracing(level: Level) -> bool {
    tracing_subscriber::fmt()
        .with_max_level(level)
        .try_init()
        .is_ok()
}
