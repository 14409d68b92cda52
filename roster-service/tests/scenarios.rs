//! End-to-end use-case tests over the in-memory store.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use roster_core::{
    DomainError, FixedRandomizer, PrStatus, PullRequest, PullRequestId, Randomizer,
    ReviewerAssigner, SeededRandomizer, Team, ThreadRandomizer, User, UserId,
};
use roster_service::{
    InMemoryStore, InsertOutcome, PullRequestChange, PullRequestRepository, ReassignOutcome,
    RepositoryError, ReviewService, ServiceError, TeamMember, TeamRepository, UpdateOutcome,
    UserRepository,
};

/// Pull request port that counts writes before delegating to the store.
struct CountingPullRequests {
    inner: Arc<InMemoryStore>,
    saves: AtomicUsize,
}

impl CountingPullRequests {
    fn new(inner: Arc<InMemoryStore>) -> Self {
        Self {
            inner,
            saves: AtomicUsize::new(0),
        }
    }

    fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PullRequestRepository for CountingPullRequests {
    async fn pull_request_exists(&self, id: &PullRequestId) -> Result<bool, RepositoryError> {
        self.inner.pull_request_exists(id).await
    }

    async fn get_pull_request(
        &self,
        id: &PullRequestId,
    ) -> Result<Option<PullRequest>, RepositoryError> {
        self.inner.get_pull_request(id).await
    }

    async fn save_pull_request(&self, pr: &PullRequest) -> Result<(), RepositoryError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.inner.save_pull_request(pr).await
    }

    async fn insert_pull_request(
        &self,
        pr: &PullRequest,
    ) -> Result<InsertOutcome, RepositoryError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.inner.insert_pull_request(pr).await
    }

    async fn update_pull_request(
        &self,
        id: &PullRequestId,
        change: PullRequestChange<'_>,
    ) -> Result<UpdateOutcome, RepositoryError> {
        let outcome = self.inner.update_pull_request(id, change).await?;
        if matches!(outcome, UpdateOutcome::Updated(_)) {
            self.saves.fetch_add(1, Ordering::SeqCst);
        }
        Ok(outcome)
    }

    async fn list_by_reviewer(
        &self,
        reviewer_id: &UserId,
    ) -> Result<Vec<PullRequest>, RepositoryError> {
        self.inner.list_by_reviewer(reviewer_id).await
    }
}

/// Pull request port that yields to other tasks after every read and before
/// every update, so interleaved use-cases see stale copies.
struct InterleavingPullRequests {
    inner: Arc<InMemoryStore>,
}

#[async_trait]
impl PullRequestRepository for InterleavingPullRequests {
    async fn pull_request_exists(&self, id: &PullRequestId) -> Result<bool, RepositoryError> {
        self.inner.pull_request_exists(id).await
    }

    async fn get_pull_request(
        &self,
        id: &PullRequestId,
    ) -> Result<Option<PullRequest>, RepositoryError> {
        let pr = self.inner.get_pull_request(id).await;
        tokio::task::yield_now().await;
        pr
    }

    async fn save_pull_request(&self, pr: &PullRequest) -> Result<(), RepositoryError> {
        self.inner.save_pull_request(pr).await
    }

    async fn insert_pull_request(
        &self,
        pr: &PullRequest,
    ) -> Result<InsertOutcome, RepositoryError> {
        self.inner.insert_pull_request(pr).await
    }

    async fn update_pull_request(
        &self,
        id: &PullRequestId,
        change: PullRequestChange<'_>,
    ) -> Result<UpdateOutcome, RepositoryError> {
        tokio::task::yield_now().await;
        self.inner.update_pull_request(id, change).await
    }

    async fn list_by_reviewer(
        &self,
        reviewer_id: &UserId,
    ) -> Result<Vec<PullRequest>, RepositoryError> {
        self.inner.list_by_reviewer(reviewer_id).await
    }
}

/// Team port whose reads always fail.
struct BrokenTeams;

#[async_trait]
impl TeamRepository for BrokenTeams {
    async fn team_exists(&self, _name: &str) -> Result<bool, RepositoryError> {
        Err(RepositoryError::storage("team_exists", "connection reset"))
    }

    async fn get_team(&self, _name: &str) -> Result<Option<Team>, RepositoryError> {
        Err(RepositoryError::storage("get_team", "connection reset"))
    }

    async fn save_team(&self, _team: &Team) -> Result<(), RepositoryError> {
        Err(RepositoryError::storage("save_team", "connection reset"))
    }

    async fn insert_team(&self, _team: &Team) -> Result<InsertOutcome, RepositoryError> {
        Err(RepositoryError::storage("insert_team", "connection reset"))
    }
}

fn members(roster: &[(&str, bool)]) -> Vec<TeamMember> {
    roster
        .iter()
        .map(|(id, active)| TeamMember::new(*id, format!("user-{}", id), *active))
        .collect()
}

fn uid(s: &str) -> UserId {
    UserId::from(s)
}

fn domain(err: ServiceError) -> DomainError {
    err.domain().cloned().expect("expected a domain error")
}

/// Service whose pull request writes are counted.
fn counted(
    rnd: impl Randomizer + 'static,
) -> (ReviewService, Arc<InMemoryStore>, Arc<CountingPullRequests>) {
    let store = Arc::new(InMemoryStore::new());
    let prs = Arc::new(CountingPullRequests::new(store.clone()));
    let service = ReviewService::new(
        store.clone(),
        store.clone(),
        prs.clone(),
        ReviewerAssigner::new(Arc::new(rnd)),
    );
    (service, store, prs)
}

#[tokio::test]
async fn test_create_pull_request_picks_two_teammates() {
    let service = ReviewService::in_memory(Arc::new(ThreadRandomizer));
    service
        .create_team("Backend", members(&[("u1", true), ("u2", true), ("u3", true)]))
        .await
        .unwrap();

    let pr = service
        .create_pull_request("pr-1", "Add search", "u1")
        .await
        .unwrap();

    let reviewers: HashSet<&UserId> = pr.assigned_reviewers().iter().collect();
    assert_eq!(pr.assigned_reviewers().len(), 2);
    assert_eq!(reviewers, HashSet::from([&uid("u2"), &uid("u3")]));
    assert_eq!(pr.status(), PrStatus::Open);
    assert!(pr.merged_at().is_none());
}

#[tokio::test]
async fn test_reassign_replaces_slot_with_only_candidate() {
    let (service, _store, prs) = counted(FixedRandomizer::first());
    service
        .create_team(
            "Backend",
            members(&[("u1", true), ("u2", true), ("u3", true), ("u4", true)]),
        )
        .await
        .unwrap();
    let pr = service
        .create_pull_request("pr-1", "Add search", "u1")
        .await
        .unwrap();
    assert_eq!(pr.assigned_reviewers(), &[uid("u2"), uid("u3")]);

    let outcome = service.reassign_reviewer("pr-1", "u2").await.unwrap();

    assert_eq!(outcome.replaced_by, uid("u4"));
    assert_eq!(
        outcome.pull_request.assigned_reviewers(),
        &[uid("u4"), uid("u3")]
    );
    assert_eq!(prs.saves(), 2);

    let stored = prs
        .get_pull_request(&PullRequestId::from("pr-1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored, outcome.pull_request);
}

#[tokio::test]
async fn test_reassign_on_merged_pull_request_writes_nothing() {
    let (service, _store, prs) = counted(FixedRandomizer::first());
    service
        .create_team(
            "Backend",
            members(&[("u1", true), ("u2", true), ("u3", true), ("u4", true)]),
        )
        .await
        .unwrap();
    service
        .create_pull_request("pr-1", "Add search", "u1")
        .await
        .unwrap();
    let merged = service.merge_pull_request("pr-1").await.unwrap();
    let saves_before = prs.saves();

    let err = service.reassign_reviewer("pr-1", "u2").await.unwrap_err();

    assert_eq!(domain(err), DomainError::PRMerged);
    assert_eq!(prs.saves(), saves_before);
    let stored = prs
        .get_pull_request(&PullRequestId::from("pr-1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.assigned_reviewers(), merged.assigned_reviewers());
    assert_eq!(stored.status(), PrStatus::Merged);
}

#[tokio::test]
async fn test_create_team_twice_keeps_one() {
    let store = Arc::new(InMemoryStore::new());
    let service = ReviewService::with_store(store.clone(), Arc::new(ThreadRandomizer));

    service
        .create_team("X", members(&[("a", true)]))
        .await
        .unwrap();
    let err = service
        .create_team("X", members(&[("b", true)]))
        .await
        .unwrap_err();

    assert_eq!(domain(err), DomainError::TeamExists);
    assert_eq!(store.team_count().await, 1);
    let team = service.get_team("X").await.unwrap();
    assert_eq!(team.members().len(), 1);
    assert!(team.has_member(&uid("a")));
    assert!(store.get_user(&uid("b")).await.unwrap().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_create_team_has_single_winner() {
    let store = Arc::new(InMemoryStore::new());
    let service = Arc::new(ReviewService::with_store(
        store.clone(),
        Arc::new(ThreadRandomizer),
    ));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let service = service.clone();
            tokio::spawn(async move {
                service
                    .create_team("X", members(&[(format!("u{}", i).as_str(), true)]))
                    .await
            })
        })
        .collect();

    let mut created = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => created += 1,
            Err(err) => assert_eq!(domain(err), DomainError::TeamExists),
        }
    }

    assert_eq!(created, 1);
    assert_eq!(store.team_count().await, 1);
}

#[tokio::test]
async fn test_merge_is_idempotent_and_skips_second_write() {
    let (service, _store, prs) = counted(FixedRandomizer::first());
    service
        .create_team("Backend", members(&[("u1", true), ("u2", true)]))
        .await
        .unwrap();
    service
        .create_pull_request("pr-1", "Add search", "u1")
        .await
        .unwrap();

    let first = service.merge_pull_request("pr-1").await.unwrap();
    let saves_after_first = prs.saves();
    let second = service.merge_pull_request("pr-1").await.unwrap();

    assert_eq!(prs.saves(), saves_after_first);
    assert_eq!(first, second);

    let json = serde_json::to_value(&second).unwrap();
    assert_eq!(json["status"], "MERGED");
    assert!(!json["merged_at"].is_null());
}

#[tokio::test]
async fn test_deactivated_user_is_not_selected() {
    let service = ReviewService::in_memory(Arc::new(SeededRandomizer::new(7)));
    service
        .create_team("Backend", members(&[("u1", true), ("u2", true), ("u3", true)]))
        .await
        .unwrap();

    let user = service.set_user_active("u3", false).await.unwrap();
    assert!(!user.is_active());

    for i in 0..10 {
        let pr = service
            .create_pull_request(format!("pr-{}", i), "Fix", "u1")
            .await
            .unwrap();
        assert_eq!(pr.assigned_reviewers(), &[uid("u2")]);
    }

    let team = service.get_team("Backend").await.unwrap();
    let active: Vec<&str> = team.active_members().map(|u| u.id().as_str()).collect();
    assert_eq!(active, vec!["u1", "u2"]);
}

#[tokio::test]
async fn test_set_user_active_unknown_user() {
    let service = ReviewService::in_memory(Arc::new(ThreadRandomizer));
    let err = service.set_user_active("ghost", true).await.unwrap_err();
    assert_eq!(domain(err), DomainError::UserNotFound);
}

#[tokio::test]
async fn test_user_reviews_include_open_and_merged() {
    let service = ReviewService::in_memory(Arc::new(FixedRandomizer::first()));
    service
        .create_team("Backend", members(&[("u1", true), ("u2", true)]))
        .await
        .unwrap();
    service
        .create_pull_request("pr-1", "First", "u1")
        .await
        .unwrap();
    service
        .create_pull_request("pr-2", "Second", "u1")
        .await
        .unwrap();
    service.merge_pull_request("pr-1").await.unwrap();

    let reviews = service.get_user_reviews("u2").await.unwrap();
    let ids: HashSet<&str> = reviews.iter().map(|pr| pr.id().as_str()).collect();
    assert_eq!(ids, HashSet::from(["pr-1", "pr-2"]));

    assert!(service.get_user_reviews("u1").await.unwrap().is_empty());
    assert!(service.get_user_reviews("ghost").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_get_team_missing() {
    let service = ReviewService::in_memory(Arc::new(ThreadRandomizer));
    let err = service.get_team("Nope").await.unwrap_err();
    assert_eq!(domain(err), DomainError::TeamNotFound);
}

#[tokio::test]
async fn test_author_without_team_is_rejected_before_insert() {
    let (service, store, prs) = counted(FixedRandomizer::first());
    store
        .save_user(&User::new("u1", "alice", "Ghosts", true))
        .await
        .unwrap();

    let err = service
        .create_pull_request("pr-1", "Fix", "u1")
        .await
        .unwrap_err();

    assert_eq!(domain(err), DomainError::TeamNotFound);
    assert_eq!(prs.saves(), 0);
    assert!(!store
        .pull_request_exists(&PullRequestId::from("pr-1"))
        .await
        .unwrap());
}

#[tokio::test]
async fn test_storage_failure_carries_step() {
    let store = Arc::new(InMemoryStore::new());
    let service = ReviewService::new(
        Arc::new(BrokenTeams),
        store.clone(),
        store.clone(),
        ReviewerAssigner::new(Arc::new(ThreadRandomizer)),
    );
    store
        .save_user(&User::new("u1", "alice", "Backend", true))
        .await
        .unwrap();

    let err = service
        .create_pull_request("pr-1", "Fix", "u1")
        .await
        .unwrap_err();

    assert!(err.domain().is_none());
    assert_eq!(
        err.to_string(),
        "getting team: storage operation 'get_team' failed: connection reset"
    );
    assert!(!store
        .pull_request_exists(&PullRequestId::from("pr-1"))
        .await
        .unwrap());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_create_pull_request_has_single_winner() {
    let store = Arc::new(InMemoryStore::new());
    let service = Arc::new(ReviewService::with_store(
        store.clone(),
        Arc::new(ThreadRandomizer),
    ));
    service
        .create_team("Backend", members(&[("u1", true), ("u2", true), ("u3", true)]))
        .await
        .unwrap();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let service = service.clone();
            tokio::spawn(async move {
                service
                    .create_pull_request("pr-1", format!("Attempt {}", i), "u1")
                    .await
            })
        })
        .collect();

    let mut winners = Vec::new();
    for handle in handles {
        match handle.await.unwrap() {
            Ok(pr) => winners.push(pr),
            Err(err) => assert_eq!(domain(err), DomainError::PRExists),
        }
    }

    assert_eq!(winners.len(), 1);
    let stored = store
        .get_pull_request(&PullRequestId::from("pr-1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored, winners[0]);
    assert_eq!(service.get_user_reviews("u2").await.unwrap().len(), 1);
}

/// Runs a merge and a reassignment of the same pull request interleaved on
/// one task, in the given order, and returns the reassignment result with
/// the stored record.
async fn merge_and_reassign(
    reassign_first: bool,
) -> (Result<ReassignOutcome, ServiceError>, PullRequest) {
    let store = Arc::new(InMemoryStore::new());
    let service = ReviewService::new(
        store.clone(),
        store.clone(),
        Arc::new(InterleavingPullRequests {
            inner: store.clone(),
        }),
        ReviewerAssigner::new(Arc::new(FixedRandomizer::first())),
    );
    service
        .create_team(
            "Backend",
            members(&[("u1", true), ("u2", true), ("u3", true), ("u4", true)]),
        )
        .await
        .unwrap();
    service
        .create_pull_request("pr-1", "Add search", "u1")
        .await
        .unwrap();

    let reassigned = if reassign_first {
        let (reassigned, merged) = tokio::join!(
            service.reassign_reviewer("pr-1", "u2"),
            service.merge_pull_request("pr-1")
        );
        merged.unwrap();
        reassigned
    } else {
        let (merged, reassigned) = tokio::join!(
            service.merge_pull_request("pr-1"),
            service.reassign_reviewer("pr-1", "u2")
        );
        merged.unwrap();
        reassigned
    };

    let stored = store
        .get_pull_request(&PullRequestId::from("pr-1"))
        .await
        .unwrap()
        .unwrap();
    (reassigned, stored)
}

#[tokio::test]
async fn test_interleaved_merge_and_reassign_lose_no_update() {
    for reassign_first in [true, false] {
        let (reassigned, stored) = merge_and_reassign(reassign_first).await;

        assert_eq!(stored.status(), PrStatus::Merged);
        match reassigned {
            Ok(outcome) => {
                assert_eq!(outcome.replaced_by, uid("u4"));
                assert_eq!(stored.assigned_reviewers(), &[uid("u4"), uid("u3")]);
            }
            Err(err) => {
                assert_eq!(domain(err), DomainError::PRMerged);
                assert_eq!(stored.assigned_reviewers(), &[uid("u2"), uid("u3")]);
            }
        }
    }
}
