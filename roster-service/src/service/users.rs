use tracing::{info, warn};

use roster_core::{DomainError, PullRequest, User, UserId};

use super::ReviewService;
use crate::error::{RepositoryResultExt, ServiceError};

impl ReviewService {
    /// Set a user's activation flag. Inactive users are never drawn as
    /// reviewers but keep the slots they already hold.
    pub async fn set_user_active(
        &self,
        user_id: impl Into<UserId>,
        is_active: bool,
    ) -> Result<User, ServiceError> {
        let user_id = user_id.into();
        let Some(mut user) = self.users.get_user(&user_id).await.context("getting user")? else {
            warn!("Cannot set activity of unknown user {}", user_id);
            return Err(DomainError::UserNotFound.into());
        };

        user.set_active(is_active);
        self.users.save_user(&user).await.context("saving user")?;

        info!("User {} is_active = {}", user_id, is_active);
        Ok(user)
    }

    /// Pull requests on which `user_id` holds a reviewer slot, oldest first.
    pub async fn get_user_reviews(
        &self,
        user_id: impl Into<UserId>,
    ) -> Result<Vec<PullRequest>, ServiceError> {
        let user_id = user_id.into();
        self.pull_requests
            .list_by_reviewer(&user_id)
            .await
            .context("getting pull requests by reviewer")
    }
}
