use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::models::{
    Contest, ContestFilter, ContestPatch, NewContest, SocialMedia, non_blank, validate_not_blank,
    validate_url_or_empty,
};

/// Request payload for creating a new contest
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateContestRequest {
    #[validate(
        length(
            min = 1,
            max = 255,
            message = "Name must be between 1 and 255 characters"
        ),
        custom(function = "validate_not_blank")
    )]
    pub name: String,

    pub event_date: NaiveDate,

    #[validate(length(min = 1, max = 255), custom(function = "validate_not_blank"))]
    pub locality: String,

    #[validate(length(min = 1, max = 255), custom(function = "validate_not_blank"))]
    pub venue_name: String,

    #[validate(length(min = 1, max = 512), custom(function = "validate_not_blank"))]
    pub address: String,

    #[validate(
        length(min = 1, message = "Description is required"),
        custom(function = "validate_not_blank")
    )]
    pub description: String,

    #[validate(custom(function = "validate_url_or_empty"))]
    pub logo_url: Option<String>,

    #[validate(custom(function = "validate_url_or_empty"))]
    pub official_site_url: Option<String>,

    #[validate(nested)]
    pub social_media: Option<SocialMedia>,
}

impl CreateContestRequest {
    /// Build the record to insert, owned by `organizer_id`.
    pub fn into_new_contest(self, slug: String, organizer_id: Uuid) -> NewContest {
        NewContest {
            name: self.name.trim().to_string(),
            slug,
            event_date: self.event_date,
            locality: self.locality.trim().to_string(),
            venue_name: self.venue_name.trim().to_string(),
            address: self.address.trim().to_string(),
            description: self.description,
            logo_url: non_blank(self.logo_url.as_deref()),
            official_site_url: non_blank(self.official_site_url.as_deref()),
            social_media: self
                .social_media
                .map(|s| s.normalized())
                .unwrap_or_default(),
            organizer_id,
        }
    }
}

/// Request payload for updating an existing contest.
///
/// Only these fields can be changed; unknown fields (`slug`, `organizer_id`,
/// ...) are rejected. An empty string clears `logo_url` / `official_site_url`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateContestRequest {
    #[validate(length(min = 1, max = 255), custom(function = "validate_not_blank"))]
    pub name: Option<String>,

    pub event_date: Option<NaiveDate>,

    #[validate(length(min = 1, max = 255), custom(function = "validate_not_blank"))]
    pub locality: Option<String>,

    #[validate(length(min = 1, max = 255), custom(function = "validate_not_blank"))]
    pub venue_name: Option<String>,

    #[validate(length(min = 1, max = 512), custom(function = "validate_not_blank"))]
    pub address: Option<String>,

    #[validate(length(min = 1), custom(function = "validate_not_blank"))]
    pub description: Option<String>,

    #[validate(custom(function = "validate_url_or_empty"))]
    pub logo_url: Option<String>,

    #[validate(custom(function = "validate_url_or_empty"))]
    pub official_site_url: Option<String>,

    #[validate(nested)]
    pub social_media: Option<SocialMedia>,

    pub active: Option<bool>,
}

impl UpdateContestRequest {
    /// The trimmed new name, if one was sent.
    pub fn requested_name(&self) -> Option<&str> {
        self.name.as_deref().map(str::trim)
    }

    /// Turn the request into a store patch. `slug` is set only when the name changed.
    pub fn into_patch(self, slug: Option<String>) -> ContestPatch {
        ContestPatch {
            name: self.name.map(|n| n.trim().to_string()),
            slug,
            event_date: self.event_date,
            locality: self.locality.map(|l| l.trim().to_string()),
            venue_name: self.venue_name.map(|v| v.trim().to_string()),
            address: self.address.map(|a| a.trim().to_string()),
            description: self.description,
            logo_url: self.logo_url.map(|u| non_blank(Some(&u))),
            official_site_url: self.official_site_url.map(|u| non_blank(Some(&u))),
            social_media: self.social_media.map(|s| s.normalized()),
            active: self.active,
        }
    }
}

/// Query string of the public catalog
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct ContestQuery {
    /// Case-insensitive search on contest name or locality
    pub q: Option<String>,
    /// Exact locality
    pub locality: Option<String>,
}

impl ContestQuery {
    pub fn to_filter(&self) -> ContestFilter {
        ContestFilter {
            locality: non_blank(self.locality.as_deref()),
            search: non_blank(self.q.as_deref()),
            ..ContestFilter::public()
        }
    }
}

/// Response containing contest details
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ContestResponse {
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
    pub social_media: SocialMedia,
    pub organizer_id: Uuid,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Contest> for ContestResponse {
    fn from(contest: Contest) -> Self {
        Self {
            id: contest.id,
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
            active: contest.active,
            created_at: contest.created_at,
            updated_at: contest.updated_at,
        }
    }
}
