pub mod auth;
pub mod contests;
pub mod uploads;
