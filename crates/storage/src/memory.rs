//! In-memory `ContestStore` and `UserDirectory` for tests.
//!
//! Both stores enforce the same uniqueness rules as the Postgres schema
//! (unique `slug`, unique `email`) so allocator and registration races behave
//! the same way against either backend.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::error::{Result, StorageError};
use crate::models::{
    Contest, ContestFilter, ContestPatch, LocalityCount, NewContest, NewUser, User,
};
use crate::traits::{ContestStore, UserDirectory};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Default)]
pub struct InMemoryContestStore {
    contests: Mutex<Vec<Contest>>,
    slug_lookups: AtomicUsize,
}

impl InMemoryContestStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of uniqueness-oracle queries served so far.
    pub fn slug_lookups(&self) -> usize {
        self.slug_lookups.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> Vec<Contest> {
        lock(&self.contests).clone()
    }
}

#[async_trait]
impl ContestStore for InMemoryContestStore {
    async fn list(&self, filter: &ContestFilter) -> Result<Vec<Contest>> {
        let mut contests: Vec<Contest> = lock(&self.contests)
            .iter()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect();
        contests.sort_by(|a, b| {
            a.event_date
                .cmp(&b.event_date)
                .then(a.created_at.cmp(&b.created_at))
        });
        Ok(contests)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Contest>> {
        Ok(lock(&self.contests).iter().find(|c| c.id == id).cloned())
    }

    async fn find_by_slug(&self, slug: &str, exclude_id: Option<Uuid>) -> Result<Option<Contest>> {
        self.slug_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(lock(&self.contests)
            .iter()
            .find(|c| c.slug == slug && Some(c.id) != exclude_id)
            .cloned())
    }

    async fn insert(&self, contest: NewContest) -> Result<Contest> {
        let mut contests = lock(&self.contests);
        if contests.iter().any(|c| c.slug == contest.slug) {
            return Err(StorageError::ConstraintViolation(
                "Slug already exists".to_string(),
            ));
        }

        let now = Utc::now();
        let created = Contest {
            id: Uuid::new_v4(),
            name: contest.name,
            slug: contest.slug,
            event_date: contest.event_date,
            locality: contest.locality,
            venue_name: contest.venue_name,
            address: contest.address,
            description: contest.description,
            logo_url: contest.logo_url,
            official_site_url: contest.official_site_url,
            social_media: contest.social_media,
            organizer_id: contest.organizer_id,
            active: true,
            created_at: now,
            updated_at: now,
        };
        contests.push(created.clone());

        Ok(created)
    }

    async fn update_by_id(&self, id: Uuid, patch: &ContestPatch) -> Result<Option<Contest>> {
        let mut contests = lock(&self.contests);

        if let Some(slug) = &patch.slug
            && contests.iter().any(|c| &c.slug == slug && c.id != id)
        {
            return Err(StorageError::ConstraintViolation(
                "Slug already exists".to_string(),
            ));
        }

        let Some(contest) = contests.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };
        patch.apply_to(contest);
        contest.updated_at = Utc::now();

        Ok(Some(contest.clone()))
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<bool> {
        let mut contests = lock(&self.contests);
        let before = contests.len();
        contests.retain(|c| c.id != id);
        Ok(contests.len() < before)
    }

    async fn locality_counts(&self) -> Result<Vec<LocalityCount>> {
        let mut counts: Vec<LocalityCount> = Vec::new();
        for contest in lock(&self.contests).iter().filter(|c| c.active) {
            match counts.iter_mut().find(|lc| lc.locality == contest.locality) {
                Some(entry) => entry.count += 1,
                None => counts.push(LocalityCount {
                    locality: contest.locality.clone(),
                    count: 1,
                }),
            }
        }
        counts.sort_by(|a, b| a.locality.cmp(&b.locality));
        Ok(counts)
    }
}

#[derive(Default)]
pub struct InMemoryUserDirectory {
    users: Mutex<Vec<User>>,
    unavailable: AtomicBool,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent lookup fail as if the database were down.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Overwrite a stored user, e.g. to change a role after a session was issued.
    pub fn replace(&self, user: User) {
        let mut users = lock(&self.users);
        if let Some(existing) = users.iter_mut().find(|u| u.id == user.id) {
            *existing = user;
        }
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StorageError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        self.check_available()?;
        Ok(lock(&self.users).iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        self.check_available()?;
        Ok(lock(&self.users).iter().find(|u| u.email == email).cloned())
    }

    async fn insert(&self, user: NewUser) -> Result<User> {
        self.check_available()?;
        let mut users = lock(&self.users);
        if users.iter().any(|u| u.email == user.email) {
            return Err(StorageError::ConstraintViolation(
                "Email already registered".to_string(),
            ));
        }

        let now = Utc::now();
        let created = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            auth_provider: user.auth_provider,
            role: user.role,
            active: true,
            created_at: now,
            updated_at: now,
        };
        users.push(created.clone());

        Ok(created)
    }
}
