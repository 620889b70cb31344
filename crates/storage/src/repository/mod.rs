pub mod contest;
pub mod user;

pub use contest::ContestRepository;
pub use user::UserRepository;
