use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidateUrl, ValidationError};

/// Accept a valid URL or an empty string (an empty form field).
pub fn validate_url_or_empty(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() || value.validate_url() {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_url"))
    }
}

/// Reject values that are empty once trimmed.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::new("blank").with_message("must not be blank".into()))
    } else {
        Ok(())
    }
}

/// `None` for missing or blank values, the trimmed value otherwise.
pub fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromRow, Validate, ToSchema)]
pub struct SocialMedia {
    #[validate(custom(function = "validate_url_or_empty"))]
    pub facebook: Option<String>,
    #[validate(custom(function = "validate_url_or_empty"))]
    pub instagram: Option<String>,
    #[validate(custom(function = "validate_url_or_empty"))]
    pub tiktok: Option<String>,
}

impl SocialMedia {
    /// Blank links become `None`.
    pub fn normalized(&self) -> Self {
        Self {
            facebook: non_blank(self.facebook.as_deref()),
            instagram: non_blank(self.instagram.as_deref()),
            tiktok: non_blank(self.tiktok.as_deref()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Contest {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub event_date: NaiveDate,
    pub locality: String,
    pub venue_name: String,
    pub address: String,
    pub description: String,
    pub logo_url: Option<String>,
    pub official_site_url: Option<String>,
    #[sqlx(flatten)]
    pub social_media: SocialMedia,
    pub organizer_id: Uuid,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A contest that has not been persisted yet. The slug is already allocated.
#[derive(Debug, Clone)]
pub struct NewContest {
    pub name: String,
    pub slug: String,
    pub event_date: NaiveDate,
    pub locality: String,
    pub venue_name: String,
    pub address: String,
    pub description: String,
    pub logo_url: Option<String>,
    pub official_site_url: Option<String>,
    pub social_media: SocialMedia,
    pub organizer_id: Uuid,
}

/// The fields a contest update may touch. Anything not listed here
/// (`id`, `organizer_id`, timestamps) cannot be changed through an update.
///
/// `None` leaves a field unchanged. For the optional URL fields the inner
/// `None` clears the stored value.
#[derive(Debug, Clone, Default)]
pub struct ContestPatch {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub event_date: Option<NaiveDate>,
    pub locality: Option<String>,
    pub venue_name: Option<String>,
    pub address: Option<String>,
    pub description: Option<String>,
    pub logo_url: Option<Option<String>>,
    pub official_site_url: Option<Option<String>>,
    pub social_media: Option<SocialMedia>,
    pub active: Option<bool>,
}

impl ContestPatch {
    /// Apply the patch to an in-memory copy of a contest.
    pub fn apply_to(&self, contest: &mut Contest) {
        if let Some(name) = &self.name {
            contest.name = name.clone();
        }
        if let Some(slug) = &self.slug {
            contest.slug = slug.clone();
        }
        if let Some(event_date) = self.event_date {
            contest.event_date = event_date;
        }
        if let Some(locality) = &self.locality {
            contest.locality = locality.clone();
        }
        if let Some(venue_name) = &self.venue_name {
            contest.venue_name = venue_name.clone();
        }
        if let Some(address) = &self.address {
            contest.address = address.clone();
        }
        if let Some(description) = &self.description {
            contest.description = description.clone();
        }
        if let Some(logo_url) = &self.logo_url {
            contest.logo_url = logo_url.clone();
        }
        if let Some(official_site_url) = &self.official_site_url {
            contest.official_site_url = official_site_url.clone();
        }
        if let Some(social_media) = &self.social_media {
            contest.social_media = social_media.clone();
        }
        if let Some(active) = self.active {
            contest.active = active;
        }
    }
}

/// Filter for contest listings.
#[derive(Debug, Clone, Default)]
pub struct ContestFilter {
    pub active_only: bool,
    pub organizer_id: Option<Uuid>,
    /// Exact locality match
    pub locality: Option<String>,
    /// Case-insensitive substring of the name or the locality
    pub search: Option<String>,
}

impl ContestFilter {
    pub fn public() -> Self {
        Self {
            active_only: true,
            ..Self::default()
        }
    }

    pub fn matches(&self, contest: &Contest) -> bool {
        if self.active_only && !contest.active {
            return false;
        }

        if let Some(organizer_id) = self.organizer_id
            && contest.organizer_id != organizer_id
        {
            return false;
        }

        if let Some(locality) = &self.locality
            && &contest.locality != locality
        {
            return false;
        }

        match &self.search {
            Some(term) => {
                let term = term.to_lowercase();
                contest.name.to_lowercase().contains(&term)
                    || contest.locality.to_lowercase().contains(&term)
            }
            None => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct LocalityCount {
    pub locality: String,
    pub count: i64,
}
