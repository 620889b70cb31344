use anyhow::{Context, Result, bail};
use chrono::Duration;

const DEFAULT_SESSION_TTL_HOURS: i64 = 24 * 30;
const MAX_SESSION_TTL_HOURS: i64 = 24 * 365;
const DEFAULT_IMAGEKIT_UPLOAD_URL: &str = "https://upload.imagekit.io/api/v1/files/upload";

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub session_secret: String,
    pub session_ttl: Duration,
    /// Shared key of the trusted OAuth bridge; `None` disables OAuth sign-in
    pub oauth_bridge_secret: Option<String>,
    pub imagekit: Option<ImageKitConfig>,
}

#[derive(Debug, Clone)]
pub struct ImageKitConfig {
    pub private_key: String,
    pub upload_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let session_secret =
            lookup("SESSION_SECRET").context("Cannot load SESSION_SECRET env variable")?;
        if session_secret.len() < 32 {
            bail!("SESSION_SECRET must be at least 32 characters long");
        }

        let session_ttl_hours: i64 = match lookup("SESSION_TTL_HOURS") {
            Some(value) => value
                .trim()
                .parse()
                .context("SESSION_TTL_HOURS must be a number")?,
            None => DEFAULT_SESSION_TTL_HOURS,
        };
        if !(1..=MAX_SESSION_TTL_HOURS).contains(&session_ttl_hours) {
            bail!(
                "SESSION_TTL_HOURS must be between 1 and {}",
                MAX_SESSION_TTL_HOURS
            );
        }
        let session_ttl = Duration::try_hours(session_ttl_hours)
            .context("SESSION_TTL_HOURS is out of range")?;

        let oauth_bridge_secret = lookup("OAUTH_BRIDGE_SECRET").filter(|key| !key.trim().is_empty());
        if oauth_bridge_secret.as_ref().is_some_and(|key| key.len() < 32) {
            bail!("OAUTH_BRIDGE_SECRET must be at least 32 characters long");
        }

        let imagekit = lookup("IMAGEKIT_PRIVATE_KEY")
            .filter(|key| !key.trim().is_empty())
            .map(|private_key| ImageKitConfig {
                private_key,
                upload_url: lookup("IMAGEKIT_UPLOAD_URL")
                    .unwrap_or_else(|| DEFAULT_IMAGEKIT_UPLOAD_URL.to_string()),
            });

        Ok(Self {
            host: lookup("HOST").context("Cannot load HOST env variable")?,
            port: lookup("PORT")
                .context("Cannot load PORT env variable")?
                .parse()
                .context("PORT must be a number")?,
            database_url: lookup("DATABASE_URL")
                .context("Cannot load DATABASE_URL env variable")?,
            session_secret,
            session_ttl,
            oauth_bridge_secret,
            imagekit,
        })
    }
}
