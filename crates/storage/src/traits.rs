use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Contest, ContestFilter, ContestPatch, LocalityCount, NewContest, NewUser, User};

/// Persistence capability for contest records.
///
/// Implementations must reject a second record with an existing slug with
/// `StorageError::ConstraintViolation`.
#[async_trait]
pub trait ContestStore: Send + Sync {
    /// Contests matching the filter, ordered by event date then creation time.
    async fn list(&self, filter: &ContestFilter) -> Result<Vec<Contest>>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Contest>>;

    /// Uniqueness oracle: the contest holding `slug`, ignoring `exclude_id`.
    async fn find_by_slug(&self, slug: &str, exclude_id: Option<Uuid>) -> Result<Option<Contest>>;

    async fn insert(&self, contest: NewContest) -> Result<Contest>;

    /// `None` when no contest has this id.
    async fn update_by_id(&self, id: Uuid, patch: &ContestPatch) -> Result<Option<Contest>>;

    /// `false` when no contest has this id.
    async fn delete_by_id(&self, id: Uuid) -> Result<bool>;

    /// Active contests per locality, sorted by locality.
    async fn locality_counts(&self) -> Result<Vec<LocalityCount>>;
}

/// The authoritative source of accounts and their roles.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;

    /// `email` is expected to be normalized already.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn insert(&self, user: NewUser) -> Result<User>;
}
