pub mod handlers;
pub mod intake;
