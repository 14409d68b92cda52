//! Reviewer assignment engine.
//!
//! Decides which team members are eligible and draws from that pool. It has
//! no knowledge of pull request slots: callers feed the result into
//! [`PullRequest::open`](crate::PullRequest::open) or
//! [`PullRequest::reassign_reviewer`](crate::PullRequest::reassign_reviewer).

use std::sync::Arc;

use crate::error::DomainError;
use crate::random::Randomizer;
use crate::team::Team;
use crate::user::UserId;

/// Maximum number of reviewers on a pull request.
pub const MAX_REVIEWERS: usize = 2;

#[derive(Clone)]
pub struct ReviewerAssigner {
    rnd: Arc<dyn Randomizer>,
}

impl ReviewerAssigner {
    pub fn new(rnd: Arc<dyn Randomizer>) -> Self {
        Self { rnd }
    }

    /// Draw up to [`MAX_REVIEWERS`] distinct active members other than the
    /// author, in draw order.
    ///
    /// A pool with a single candidate yields a single reviewer.
    pub fn select_reviewers(
        &self,
        team: &Team,
        author_id: &UserId,
    ) -> Result<Vec<UserId>, DomainError> {
        let pool: Vec<&UserId> = team
            .active_members()
            .map(|u| u.id())
            .filter(|id| *id != author_id)
            .collect();

        if pool.is_empty() {
            return Err(DomainError::NoCandidateFound);
        }

        let limit = MAX_REVIEWERS.min(pool.len());
        Ok(self
            .rnd
            .permutation(pool.len())
            .into_iter()
            .filter_map(|i| pool.get(i))
            .take(limit)
            .map(|id| (*id).clone())
            .collect())
    }

    /// Draw one active member who is neither the author nor already a
    /// reviewer.
    pub fn find_replacement(
        &self,
        team: &Team,
        author_id: &UserId,
        current_reviewers: &[UserId],
    ) -> Result<UserId, DomainError> {
        let pool: Vec<&UserId> = team
            .active_members()
            .map(|u| u.id())
            .filter(|id| *id != author_id && !current_reviewers.contains(*id))
            .collect();

        if pool.is_empty() {
            return Err(DomainError::NoCandidateFound);
        }

        let index = self.rnd.index_below(pool.len());
        pool.get(index)
            .map(|id| (*id).clone())
            .ok_or(DomainError::NoCandidateFound)
    }
}

impl std::fmt::Debug for ReviewerAssigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReviewerAssigner").finish_non_exhaustive()
    }
}
