use uuid::Uuid;

use crate::error::Result;
use crate::traits::ContestStore;

/// Base used when a name contains no characters that survive slugging.
pub const FALLBACK_SLUG: &str = "concurs";

/// Longest base kept before a collision suffix is appended. Leaves room for
/// `-<counter>` inside the 255 byte `contests.slug` column.
pub const MAX_BASE_SLUG_LEN: usize = 240;

/// Derive the URL-safe base slug of a contest name.
///
/// The name is lowercased and trimmed, accented Latin letters are folded to
/// their ASCII base, anything that is not an ASCII letter, digit, whitespace,
/// `_` or `-` is dropped, and every run of separators becomes a single `-`.
/// The result never starts or ends with `-`. An empty name yields an empty slug.
pub fn derive_base_slug(name: &str) -> String {
    let lowered = name.to_lowercase();
    let mut slug = String::with_capacity(lowered.len());
    let mut pending_separator = false;

    for c in lowered.trim().chars() {
        let c = fold_diacritic(c);

        if c.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(c);
        } else if c.is_whitespace() || c == '_' || c == '-' {
            pending_separator = true;
        }
    }

    slug
}

fn fold_diacritic(c: char) -> char {
    match c {
        'ă' | 'â' | 'à' | 'á' | 'ä' | 'ã' | 'å' => 'a',
        'î' | 'ì' | 'í' | 'ï' => 'i',
        'ș' | 'ş' | 'š' | 'ś' => 's',
        'ț' | 'ţ' => 't',
        'è' | 'é' | 'ê' | 'ë' | 'ě' => 'e',
        'ò' | 'ó' | 'ô' | 'ö' | 'õ' | 'ő' => 'o',
        'ù' | 'ú' | 'û' | 'ü' | 'ű' => 'u',
        'ç' | 'č' | 'ć' => 'c',
        'ñ' | 'ń' => 'n',
        'ý' | 'ÿ' => 'y',
        'ž' | 'ź' | 'ż' => 'z',
        'ł' => 'l',
        'ř' => 'r',
        'đ' | 'ď' => 'd',
        other => other,
    }
}

/// Allocate a slug for `name` that no other contest holds.
///
/// Collisions are resolved by appending a counter that starts at `-2`.
/// `exclude_id` is the contest being renamed so it never collides with itself.
///
/// Only reads are performed. Two concurrent allocations for the same base can
/// both return the same candidate; the unique index on `contests.slug` rejects
/// the second write.
pub async fn allocate_unique_slug<S>(store: &S, name: &str, exclude_id: Option<Uuid>) -> Result<String>
where
    S: ContestStore + ?Sized,
{
    let mut base = derive_base_slug(name);
    cap_base_slug(&mut base);
    if base.is_empty() {
        base = FALLBACK_SLUG.to_string();
    }

    let mut candidate = base.clone();
    let mut counter = 1;

    while store.find_by_slug(&candidate, exclude_id).await?.is_some() {
        counter += 1;
        candidate = format!("{}-{}", base, counter);
    }

    tracing::debug!(slug = %candidate, attempts = counter, "Allocated contest slug");

    Ok(candidate)
}

// Slugs are pure ASCII, so any byte offset is a char boundary.
fn cap_base_slug(base: &mut String) {
    if base.len() > MAX_BASE_SLUG_LEN {
        base.truncate(MAX_BASE_SLUG_LEN);
        let kept = base.trim_end_matches('-').len();
        base.truncate(kept);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryContestStore;
    use crate::models::{NewContest, SocialMedia};
    use chrono::NaiveDate;

    fn new_contest(name: &str, slug: &str) -> NewContest {
        NewContest {
            name: name.to_string(),
            slug: slug.to_string(),
            event_date: NaiveDate::from_ymd_opt(2025, 3, 8).unwrap(),
            locality: "Bucuresti".to_string(),
            venue_name: "Sala Polivalenta".to_string(),
            address: "Calea Piscului 10".to_string(),
            description: "Concurs national".to_string(),
            logo_url: None,
            official_site_url: None,
            social_media: SocialMedia::default(),
            organizer_id: Uuid::new_v4(),
        }
    }

    #[test]
    fn test_derive_base_slug_basic() {
        assert_eq!(derive_base_slug("Cupa de Dans"), "cupa-de-dans");
        assert_eq!(derive_base_slug("  Gala  "), "gala");
        assert_eq!(derive_base_slug("Dance_Fest -- 2025"), "dance-fest-2025");
        assert_eq!(derive_base_slug("Rock & Roll!"), "rock-roll");
        assert_eq!(derive_base_slug("a&b"), "ab");
    }

    #[test]
    fn test_derive_base_slug_strips_edge_separators() {
        assert_eq!(derive_base_slug("--Gala--"), "gala");
        assert_eq!(derive_base_slug("_ Gala _"), "gala");
        assert_eq!(derive_base_slug("!!! Gala ???"), "gala");
    }

    #[test]
    fn test_derive_base_slug_empty() {
        assert_eq!(derive_base_slug(""), "");
        assert_eq!(derive_base_slug("   "), "");
        assert_eq!(derive_base_slug("---"), "");
        assert_eq!(derive_base_slug("!?*"), "");
    }

    #[test]
    fn test_derive_base_slug_romanian_diacritics() {
        assert_eq!(
            derive_base_slug("Cupa de Dans București 2025"),
            "cupa-de-dans-bucuresti-2025"
        );
        assert_eq!(derive_base_slug("ȘTEFĂNEȘTI Țară Înalt"), "stefanesti-tara-inalt");
        assert_eq!(derive_base_slug("Timişoara"), "timisoara");
    }

    #[test]
    fn test_derive_base_slug_drops_other_scripts() {
        assert_eq!(derive_base_slug("Танец 2025"), "2025");
        assert_eq!(derive_base_slug("舞蹈 Gala"), "gala");
    }

    #[test]
    fn test_derive_base_slug_is_idempotent() {
        let inputs = [
            "Cupa de Dans București 2025",
            "  --Rock & Roll__Open--  ",
            "Gala",
            "",
            "Dans  Sportiv\t\tIași",
            "ÎNTÂLNIREA-ANUALĂ---2026",
        ];
        for input in inputs {
            let once = derive_base_slug(input);
            assert_eq!(derive_base_slug(&once), once, "input: {:?}", input);
        }
    }

    #[test]
    fn test_derive_base_slug_character_set() {
        let inputs = ["Cupa  de -- Dans!!", " _x_ ", "Țara Zânelor 3", "ab--cd"];
        for input in inputs {
            let slug = derive_base_slug(input);
            assert!(
                slug.chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
            );
            assert!(!slug.starts_with('-'));
            assert!(!slug.ends_with('-'));
            assert!(!slug.contains("--"));
        }
    }

    #[tokio::test]
    async fn test_allocate_on_empty_store() {
        let store = InMemoryContestStore::new();
        let slug = allocate_unique_slug(&store, "Cupa de Dans București 2025", None)
            .await
            .unwrap();
        assert_eq!(slug, "cupa-de-dans-bucuresti-2025");
        assert_eq!(store.slug_lookups(), 1);
    }

    #[tokio::test]
    async fn test_first_collision_uses_suffix_two() {
        let store = InMemoryContestStore::new();
        store
            .insert(new_contest("Cupa de Dans", "cupa-de-dans"))
            .await
            .unwrap();

        let slug = allocate_unique_slug(&store, "Cupa de Dans", None)
            .await
            .unwrap();
        assert_eq!(slug, "cupa-de-dans-2");
    }

    #[tokio::test]
    async fn test_suffix_keeps_counting() {
        let store = InMemoryContestStore::new();
        for slug in ["gala", "gala-2", "gala-3"] {
            store.insert(new_contest("Gala", slug)).await.unwrap();
        }

        let slug = allocate_unique_slug(&store, "Gala", None).await.unwrap();
        assert_eq!(slug, "gala-4");
        assert_eq!(store.slug_lookups(), 4);
    }

    #[tokio::test]
    async fn test_self_exclusion() {
        let store = InMemoryContestStore::new();
        let existing = store
            .insert(new_contest("Cupa de Dans", "cupa-de-dans"))
            .await
            .unwrap();

        let slug = allocate_unique_slug(&store, "Cupa de Dans", Some(existing.id))
            .await
            .unwrap();
        assert_eq!(slug, "cupa-de-dans");
    }

    #[tokio::test]
    async fn test_self_exclusion_does_not_hide_others() {
        let store = InMemoryContestStore::new();
        let first = store.insert(new_contest("Gala", "gala")).await.unwrap();
        store.insert(new_contest("Gala", "gala-2")).await.unwrap();

        let slug = allocate_unique_slug(&store, "Gala", Some(first.id))
            .await
            .unwrap();
        assert_eq!(slug, "gala");

        let other = Uuid::new_v4();
        let slug = allocate_unique_slug(&store, "Gala", Some(other)).await.unwrap();
        assert_eq!(slug, "gala-3");
    }

    #[tokio::test]
    async fn test_empty_base_uses_fallback() {
        let store = InMemoryContestStore::new();
        let slug = allocate_unique_slug(&store, "???", None).await.unwrap();
        assert_eq!(slug, FALLBACK_SLUG);

        store.insert(new_contest("???", FALLBACK_SLUG)).await.unwrap();
        let slug = allocate_unique_slug(&store, "!!!", None).await.unwrap();
        assert_eq!(slug, "concurs-2");
    }

    #[tokio::test]
    async fn test_long_name_fits_slug_column_after_collision() {
        let store = InMemoryContestStore::new();
        let name = "a".repeat(255);

        let first = allocate_unique_slug(&store, &name, None).await.unwrap();
        assert_eq!(first.len(), MAX_BASE_SLUG_LEN);
        store.insert(new_contest(&name, &first)).await.unwrap();

        let second = allocate_unique_slug(&store, &name, None).await.unwrap();
        assert!(second.len() <= 255);
        assert_eq!(second, format!("{}-2", first));
    }

    #[test]
    fn test_cap_does_not_leave_trailing_separator() {
        let mut base = format!("{}-{}", "a".repeat(MAX_BASE_SLUG_LEN - 1), "b".repeat(20));
        cap_base_slug(&mut base);
        assert_eq!(base, "a".repeat(MAX_BASE_SLUG_LEN - 1));

        let mut short = "gala".to_string();
        cap_base_slug(&mut short);
        assert_eq!(short, "gala");
    }

    #[tokio::test]
    async fn test_store_rejects_duplicate_slug_on_insert() {
        let store = InMemoryContestStore::new();
        store.insert(new_contest("Gala", "gala")).await.unwrap();

        let err = store.insert(new_contest("Gala", "gala")).await.unwrap_err();
        assert!(matches!(err, crate::error::StorageError::ConstraintViolation(_)));
    }
}
