//! Password login and bearer tokens

mod credentials;
mod token;

pub use credentials::{hash_password, CredentialsProvider};
pub use token::TokenProvider;
