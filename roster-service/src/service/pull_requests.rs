use tracing::{debug, info, warn};

use roster_core::pull_request::validate_identity;
use roster_core::{DomainError, PullRequest, PullRequestId, UserId};

use super::ReviewService;
use crate::error::{RepositoryResultExt, ServiceError};
use crate::repository::{InsertOutcome, UpdateOutcome};

/// Result of a successful reviewer reassignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReassignOutcome {
    pub pull_request: PullRequest,
    /// The reviewer now holding the slot the old reviewer had.
    pub replaced_by: UserId,
}

impl ReviewService {
    /// Open a pull request and assign up to two reviewers from the author's
    /// team.
    pub async fn create_pull_request(
        &self,
        id: impl Into<PullRequestId>,
        name: impl Into<String>,
        author_id: impl Into<UserId>,
    ) -> Result<PullRequest, ServiceError> {
        let id = id.into();
        let name = name.into();
        let author_id = author_id.into();
        validate_identity(&id, &name, &author_id)?;

        if self
            .pull_requests
            .pull_request_exists(&id)
            .await
            .context("checking pull request exists")?
        {
            warn!("Pull request {} already exists", id);
            return Err(DomainError::PRExists.into());
        }

        let Some(author) = self
            .users
            .get_user(&author_id)
            .await
            .context("getting author")?
        else {
            warn!("Author {} of pull request {} not found", author_id, id);
            return Err(DomainError::UserNotFound.into());
        };

        let Some(team) = self
            .teams
            .get_team(author.team_name())
            .await
            .context("getting team")?
        else {
            warn!(
                "Team {} of author {} not found",
                author.team_name(),
                author_id
            );
            return Err(DomainError::TeamNotFound.into());
        };

        let reviewers = self.assigner.select_reviewers(&team, &author_id)?;
        debug!("Selected reviewers {:?} for pull request {}", reviewers, id);

        let pr = PullRequest::open(id, name, author_id, reviewers)?;

        match self
            .pull_requests
            .insert_pull_request(&pr)
            .await
            .context("saving pull request")?
        {
            InsertOutcome::Inserted => {}
            InsertOutcome::AlreadyExists => {
                warn!("Pull request {} was created concurrently", pr.id());
                return Err(DomainError::PRExists.into());
            }
        }

        info!(
            "Created pull request {} by {} with {} reviewer(s)",
            pr.id(),
            pr.author_id(),
            pr.assigned_reviewers().len()
        );
        Ok(pr)
    }

    /// Merge a pull request. Merging an already merged pull request returns
    /// it unchanged and writes nothing.
    pub async fn merge_pull_request(
        &self,
        id: impl Into<PullRequestId>,
    ) -> Result<PullRequest, ServiceError> {
        let id = id.into();
        let outcome = self
            .pull_requests
            .update_pull_request(&id, &mut |pr| Ok(pr.merge()))
            .await
            .context("merging pull request")?;

        match outcome {
            UpdateOutcome::Updated(pr) => {
                info!("Merged pull request {}", id);
                Ok(pr)
            }
            UpdateOutcome::Unchanged(pr) => {
                debug!("Pull request {} already merged", id);
                Ok(pr)
            }
            UpdateOutcome::Rejected(e) => Err(e.into()),
            UpdateOutcome::NotFound => {
                warn!("Cannot merge unknown pull request {}", id);
                Err(DomainError::PRNotFound.into())
            }
        }
    }

    /// Replace `old_reviewer_id` with a random eligible member of the old
    /// reviewer's team.
    ///
    /// The pull request is checked once up front so failures are reported in
    /// a fixed order, then checked again inside the atomic update, where the
    /// replacement is drawn against the current reviewer list.
    pub async fn reassign_reviewer(
        &self,
        pr_id: impl Into<PullRequestId>,
        old_reviewer_id: impl Into<UserId>,
    ) -> Result<ReassignOutcome, ServiceError> {
        let pr_id = pr_id.into();
        let old_reviewer_id = old_reviewer_id.into();

        let Some(pr) = self
            .pull_requests
            .get_pull_request(&pr_id)
            .await
            .context("getting pull request")?
        else {
            warn!("Cannot reassign on unknown pull request {}", pr_id);
            return Err(DomainError::PRNotFound.into());
        };

        if let Err(e) = check_reassignable(&pr, &old_reviewer_id) {
            warn!(
                "Cannot reassign {} on pull request {}: {}",
                old_reviewer_id, pr_id, e
            );
            return Err(e.into());
        }

        let Some(old_reviewer) = self
            .users
            .get_user(&old_reviewer_id)
            .await
            .context("getting old reviewer")?
        else {
            warn!("Reviewer {} not found", old_reviewer_id);
            return Err(DomainError::UserNotFound.into());
        };

        let Some(team) = self
            .teams
            .get_team(old_reviewer.team_name())
            .await
            .context("getting team")?
        else {
            warn!(
                "Team {} of reviewer {} not found",
                old_reviewer.team_name(),
                old_reviewer_id
            );
            return Err(DomainError::TeamNotFound.into());
        };

        let assigner = &self.assigner;
        let mut replacement = None;
        let outcome = self
            .pull_requests
            .update_pull_request(&pr_id, &mut |pr| {
                check_reassignable(pr, &old_reviewer_id)?;
                let new_id =
                    assigner.find_replacement(&team, pr.author_id(), pr.assigned_reviewers())?;
                pr.reassign_reviewer(&old_reviewer_id, new_id.clone())?;
                replacement = Some(new_id);
                Ok(true)
            })
            .await
            .context("updating pull request")?;

        match (outcome, replacement) {
            (UpdateOutcome::Updated(pull_request), Some(replaced_by)) => {
                info!(
                    "Reassigned pull request {}: {} -> {}",
                    pr_id, old_reviewer_id, replaced_by
                );
                Ok(ReassignOutcome {
                    pull_request,
                    replaced_by,
                })
            }
            (UpdateOutcome::Rejected(e), _) => {
                warn!(
                    "Cannot reassign {} on pull request {}: {}",
                    old_reviewer_id, pr_id, e
                );
                Err(e.into())
            }
            _ => {
                warn!("Pull request {} disappeared during reassignment", pr_id);
                Err(DomainError::PRNotFound.into())
            }
        }
    }
}

/// Preconditions shared by the up-front check and the atomic update.
fn check_reassignable(pr: &PullRequest, old_reviewer_id: &UserId) -> Result<(), DomainError> {
    if pr.is_merged() {
        return Err(DomainError::PRMerged);
    }
    if !pr.has_reviewer(old_reviewer_id) {
        return Err(DomainError::ReviewerNotAssigned);
    }
    Ok(())
}
