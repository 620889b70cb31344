use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{Result, StorageError};
use crate::models::{Contest, ContestFilter, ContestPatch, LocalityCount, NewContest};
use crate::traits::ContestStore;

macro_rules! contest_columns {
    () => {
        "id, name, slug, event_date, locality, venue_name, address, description, \
         logo_url, official_site_url, facebook, instagram, tiktok, organizer_id, \
         active, created_at, updated_at"
    };
}

/// Repository for Contest database operations
#[derive(Clone)]
pub struct ContestRepository {
    pool: PgPool,
}

impl ContestRepository {
    /// Create a new ContestRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContestStore for ContestRepository {
    async fn list(&self, filter: &ContestFilter) -> Result<Vec<Contest>> {
        let contests = sqlx::query_as::<_, Contest>(concat!(
            "SELECT ",
            contest_columns!(),
            r#"
            FROM contests
            WHERE ($1 = FALSE OR active = TRUE)
              AND ($2::uuid IS NULL OR organizer_id = $2)
              AND ($3::text IS NULL OR locality = $3)
              AND ($4::text IS NULL
                   OR strpos(lower(name), lower($4)) > 0
                   OR strpos(lower(locality), lower($4)) > 0)
            ORDER BY event_date ASC, created_at ASC
            "#
        ))
        .bind(filter.active_only)
        .bind(filter.organizer_id)
        .bind(filter.locality.as_deref())
        .bind(filter.search.as_deref())
        .fetch_all(&self.pool)
        .await?;

        Ok(contests)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Contest>> {
        let contest = sqlx::query_as::<_, Contest>(concat!(
            "SELECT ",
            contest_columns!(),
            " FROM contests WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(contest)
    }

    async fn find_by_slug(&self, slug: &str, exclude_id: Option<Uuid>) -> Result<Option<Contest>> {
        let contest = sqlx::query_as::<_, Contest>(concat!(
            "SELECT ",
            contest_columns!(),
            r#"
            FROM contests
            WHERE slug = $1
              AND ($2::uuid IS NULL OR id <> $2)
            "#
        ))
        .bind(slug)
        .bind(exclude_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(contest)
    }

    async fn insert(&self, contest: NewContest) -> Result<Contest> {
        let created = sqlx::query_as::<_, Contest>(concat!(
            r#"
            INSERT INTO contests (
                name, slug, event_date, locality, venue_name, address, description,
                logo_url, official_site_url, facebook, instagram, tiktok, organizer_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING "#,
            contest_columns!()
        ))
        .bind(&contest.name)
        .bind(&contest.slug)
        .bind(contest.event_date)
        .bind(&contest.locality)
        .bind(&contest.venue_name)
        .bind(&contest.address)
        .bind(&contest.description)
        .bind(&contest.logo_url)
        .bind(&contest.official_site_url)
        .bind(&contest.social_media.facebook)
        .bind(&contest.social_media.instagram)
        .bind(&contest.social_media.tiktok)
        .bind(contest.organizer_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StorageError::from(e).on_unique_violation("Slug already exists"))?;

        Ok(created)
    }

    async fn update_by_id(&self, id: Uuid, patch: &ContestPatch) -> Result<Option<Contest>> {
        let social = patch.social_media.as_ref();

        let updated = sqlx::query_as::<_, Contest>(concat!(
            r#"
            UPDATE contests
            SET
                name = COALESCE($2, name),
                slug = COALESCE($3, slug),
                event_date = COALESCE($4, event_date),
                locality = COALESCE($5, locality),
                venue_name = COALESCE($6, venue_name),
                address = COALESCE($7, address),
                description = COALESCE($8, description),
                logo_url = CASE WHEN $9 THEN $10 ELSE logo_url END,
                official_site_url = CASE WHEN $11 THEN $12 ELSE official_site_url END,
                facebook = CASE WHEN $13 THEN $14 ELSE facebook END,
                instagram = CASE WHEN $13 THEN $15 ELSE instagram END,
                tiktok = CASE WHEN $13 THEN $16 ELSE tiktok END,
                active = COALESCE($17, active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING "#,
            contest_columns!()
        ))
        .bind(id)
        .bind(&patch.name)
        .bind(&patch.slug)
        .bind(patch.event_date)
        .bind(&patch.locality)
        .bind(&patch.venue_name)
        .bind(&patch.address)
        .bind(&patch.description)
        .bind(patch.logo_url.is_some())
        .bind(patch.logo_url.clone().flatten())
        .bind(patch.official_site_url.is_some())
        .bind(patch.official_site_url.clone().flatten())
        .bind(social.is_some())
        .bind(social.and_then(|s| s.facebook.clone()))
        .bind(social.and_then(|s| s.instagram.clone()))
        .bind(social.and_then(|s| s.tiktok.clone()))
        .bind(patch.active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::from(e).on_unique_violation("Slug already exists"))?;

        Ok(updated)
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM contests
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn locality_counts(&self) -> Result<Vec<LocalityCount>> {
        let counts = sqlx::query_as::<_, LocalityCount>(
            r#"
            SELECT locality, COUNT(*) AS count
            FROM contests
            WHERE active = TRUE
            GROUP BY locality
            ORDER BY locality
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(counts)
    }
}
