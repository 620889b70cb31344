mod contest;
mod user;

pub use contest::{
    Contest, ContestFilter, ContestPatch, LocalityCount, NewContest, SocialMedia, non_blank,
    validate_not_blank, validate_url_or_empty,
};
pub use user::{AuthProvider, NewUser, Role, User, normalize_email};
