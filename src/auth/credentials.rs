use crate::config::UserRecord;
use crate::models::User;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;

/// Hex encoded SHA-256 digest, the form passwords are stored in
pub fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    let a_bytes = a.as_bytes();
    let b_bytes = b.as_bytes();
    if a_bytes.len() != b_bytes.len() {
        return false;
    }
    let mut diff: u8 = 0;
    for i in 0..a_bytes.len() {
        diff |= a_bytes[i] ^ b_bytes[i];
    }
    diff == 0
}

/// Checks usernames and passwords against the configured accounts
#[derive(Debug, Clone, Default)]
pub struct CredentialsProvider {
    users: Arc<HashMap<String, UserRecord>>,
}

impl CredentialsProvider {
    pub fn new(users: &[UserRecord]) -> Self {
        let users = users
            .iter()
            .map(|u| (u.username.clone(), u.clone()))
            .collect();
        Self {
            users: Arc::new(users),
        }
    }

    /// Returns the account when the password matches
    pub fn authenticate(&self, username: &str, password: &str) -> Option<User> {
        let record = self.users.get(username)?;
        constant_time_eq(&hash_password(password), &record.hashed_password.to_lowercase())
            .then(|| User::from(record))
    }

    pub fn find(&self, username: &str) -> Option<User> {
        self.users.get(username).map(User::from)
    }
}
