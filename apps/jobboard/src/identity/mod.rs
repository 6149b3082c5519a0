// Accounts: signup, email verification, sign-in, profile completion.

pub mod handlers;
pub mod manager;
pub mod password;
pub mod token;
