//! Pull request lifecycle.
//!
//! A pull request is created `OPEN` with at most two reviewers and moves to
//! `MERGED` exactly once. `MERGED` is terminal: the reviewer list is frozen
//! and any reassignment attempt fails.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::assignment::MAX_REVIEWERS;
use crate::error::DomainError;
use crate::user::UserId;

/// Newtype for pull request IDs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PullRequestId(pub String);

impl PullRequestId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PullRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for PullRequestId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for PullRequestId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PrStatus {
    Open,
    Merged,
}

impl PrStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Merged => "MERGED",
        }
    }
}

impl fmt::Display for PrStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OPEN" => Ok(Self::Open),
            "MERGED" => Ok(Self::Merged),
            _ => Err(DomainError::InvalidPRStatus),
        }
    }
}

/// A single review unit with its author and assigned reviewers.
///
/// The reviewer list is owned exclusively by this value. It never contains
/// the author and never holds more than [`MAX_REVIEWERS`] entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PullRequest {
    id: PullRequestId,
    name: String,
    author_id: UserId,
    status: PrStatus,
    assigned_reviewers: Vec<UserId>,
    created_at: DateTime<Utc>,
    merged_at: Option<DateTime<Utc>>,
}

/// Reject empty identifiers before any work is done on their behalf.
pub fn validate_identity(
    id: &PullRequestId,
    name: &str,
    author_id: &UserId,
) -> Result<(), DomainError> {
    if id.as_str().is_empty() {
        return Err(DomainError::InvalidInput {
            field: "pull_request_id",
        });
    }
    if name.is_empty() {
        return Err(DomainError::InvalidInput {
            field: "pull_request_name",
        });
    }
    if author_id.is_empty() {
        return Err(DomainError::InvalidInput { field: "author_id" });
    }
    Ok(())
}

impl PullRequest {
    /// Open a pull request, stamped with the current time.
    pub fn open(
        id: impl Into<PullRequestId>,
        name: impl Into<String>,
        author_id: impl Into<UserId>,
        candidates: Vec<UserId>,
    ) -> Result<Self, DomainError> {
        Self::open_at(id, name, author_id, candidates, Utc::now())
    }

    /// Open a pull request created at `now`.
    ///
    /// Every occurrence of the author is dropped from `candidates` before the
    /// list is truncated, so truncation may discard a valid reviewer but can never
    /// reintroduce the author.
    pub fn open_at(
        id: impl Into<PullRequestId>,
        name: impl Into<String>,
        author_id: impl Into<UserId>,
        mut candidates: Vec<UserId>,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let id = id.into();
        let name = name.into();
        let author_id = author_id.into();
        validate_identity(&id, &name, &author_id)?;

        candidates.retain(|c| *c != author_id);
        candidates.truncate(MAX_REVIEWERS);

        Ok(Self {
            id,
            name,
            author_id,
            status: PrStatus::Open,
            assigned_reviewers: candidates,
            created_at: now,
            merged_at: None,
        })
    }

    pub fn id(&self) -> &PullRequestId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn author_id(&self) -> &UserId {
        &self.author_id
    }

    pub fn status(&self) -> PrStatus {
        self.status
    }

    pub fn assigned_reviewers(&self) -> &[UserId] {
        &self.assigned_reviewers
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn merged_at(&self) -> Option<DateTime<Utc>> {
        self.merged_at
    }

    pub fn is_merged(&self) -> bool {
        self.status == PrStatus::Merged
    }

    pub fn has_reviewer(&self, user_id: &UserId) -> bool {
        self.assigned_reviewers.contains(user_id)
    }

    /// Mark the pull request merged now. Merging twice is a no-op and
    /// returns `false`.
    pub fn merge(&mut self) -> bool {
        self.merge_at(Utc::now())
    }

    /// Mark the pull request merged at `now`.
    ///
    /// Returns `false` when it was already merged; the original timestamp is
    /// kept in that case.
    pub fn merge_at(&mut self, now: DateTime<Utc>) -> bool {
        if self.is_merged() {
            return false;
        }
        self.status = PrStatus::Merged;
        self.merged_at = Some(now);
        true
    }

    /// Put `new_id` in the slot currently held by `old_id`.
    ///
    /// Position and reviewer count are unchanged.
    pub fn reassign_reviewer(
        &mut self,
        old_id: &UserId,
        new_id: UserId,
    ) -> Result<(), DomainError> {
        if self.is_merged() {
            return Err(DomainError::PRMerged);
        }
        let slot = self
            .assigned_reviewers
            .iter_mut()
            .find(|r| **r == *old_id)
            .ok_or(DomainError::ReviewerNotAssigned)?;
        *slot = new_id;
        Ok(())
    }
}
