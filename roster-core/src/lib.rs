pub mod assignment;
pub mod error;
pub mod pull_request;
pub mod random;
pub mod team;
pub mod user;

pub use assignment::{ReviewerAssigner, MAX_REVIEWERS};
pub use error::DomainError;
pub use pull_request::{PrStatus, PullRequest, PullRequestId};
pub use random::{FixedRandomizer, Randomizer, SeededRandomizer, ThreadRandomizer};
pub use team::Team;
pub use user::{User, UserId};
