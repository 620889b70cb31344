pub mod contest;
pub mod user;
