use super::CredentialsProvider;
use crate::errors::AuthError;
use crate::models::{Claims, Token, User};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use std::time::Duration;
use tracing::debug;

/// Issues access tokens and resolves them back to users
#[derive(Clone)]
pub struct TokenProvider {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
    credentials: CredentialsProvider,
}

impl std::fmt::Debug for TokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenProvider")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenProvider {
    pub fn new(secret: &str, ttl: Duration, credentials: CredentialsProvider) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
            credentials,
        }
    }

    pub fn credentials(&self) -> &CredentialsProvider {
        &self.credentials
    }

    /// Signs an HS256 token for `username`
    pub fn generate_token(&self, username: &str) -> Result<Token, AuthError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: username.to_string(),
            iat: now,
            exp: now + self.ttl.as_secs() as i64,
        };
        let token = jsonwebtoken::encode(&Header::default(), &claims, &self.encoding)?;
        Ok(Token::bearer(token))
    }

    /// Resolves a bearer token to an active user
    ///
    /// # Errors
    /// * `AuthError::InvalidToken` if the token is malformed, expired or names
    ///   an unknown user
    /// * `AuthError::InactiveUser` if the account is disabled
    pub fn load_user(&self, token: &str) -> Result<User, AuthError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &Validation::default())
            .map_err(|e| {
                debug!("Rejected token: {}", e);
                AuthError::InvalidToken
            })?;
        let user = self
            .credentials
            .find(&data.claims.sub)
            .ok_or(AuthError::InvalidToken)?;
        if user.disabled {
            return Err(AuthError::InactiveUser);
        }
        Ok(user)
    }
}
