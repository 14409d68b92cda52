//! Failure kinds raised by the roster domain.
//!
//! Every variant maps 1:1 to an outward signal; transports decide the code.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("team not found")]
    TeamNotFound,

    #[error("team already exists")]
    TeamExists,

    #[error("user not found")]
    UserNotFound,

    #[error("member already exists")]
    MemberExists,

    #[error("pull request not found")]
    PRNotFound,

    #[error("pull request already exists")]
    PRExists,

    #[error("pull request is already merged")]
    PRMerged,

    #[error("reviewer is not assigned to this pull request")]
    ReviewerNotAssigned,

    #[error("no active replacement candidate found")]
    NoCandidateFound,

    #[error("invalid pull request status")]
    InvalidPRStatus,

    /// A required identifier was empty.
    #[error("{field} must not be empty")]
    InvalidInput { field: &'static str },
}

impl DomainError {
    /// Stable machine-readable name for the failure kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::TeamNotFound => "TEAM_NOT_FOUND",
            Self::TeamExists => "TEAM_EXISTS",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::MemberExists => "MEMBER_EXISTS",
            Self::PRNotFound => "PR_NOT_FOUND",
            Self::PRExists => "PR_EXISTS",
            Self::PRMerged => "PR_MERGED",
            Self::ReviewerNotAssigned => "NOT_ASSIGNED",
            Self::NoCandidateFound => "NO_CANDIDATE",
            Self::InvalidPRStatus => "INVALID_STATUS",
            Self::InvalidInput { .. } => "INVALID_INPUT",
        }
    }
}
