pub mod application;
pub mod job;
pub mod upload;
pub mod user;
