use std::sync::Arc;

use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::application::repos::{RepoError, SessionsRepo};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("missing session token")]
    Missing,
    #[error("invalid or expired session token")]
    Invalid,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// The authenticated user behind a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: i64,
}

/// Resolves access tokens issued by the authentication service.
///
/// Tokens are never stored; lookups go through their SHA-256 digest.
#[derive(Clone)]
pub struct SessionService {
    repo: Arc<dyn SessionsRepo>,
}

impl SessionService {
    pub fn new(repo: Arc<dyn SessionsRepo>) -> Self {
        Self { repo }
    }

    pub async fn authenticate(&self, token: &str) -> Result<Actor, SessionError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(SessionError::Missing);
        }

        let hash = hash_token(token);
        match self.repo.find_session_user(&hash).await? {
            Some(user_id) => Ok(Actor { user_id }),
            None => Err(SessionError::Invalid),
        }
    }
}

pub fn hash_token(token: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().to_vec()
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;

    struct OneSession {
        hash: Vec<u8>,
        user_id: i64,
    }

    #[async_trait]
    impl SessionsRepo for OneSession {
        async fn find_session_user(&self, token_hash: &[u8]) -> Result<Option<i64>, RepoError> {
            Ok((token_hash == self.hash.as_slice()).then_some(self.user_id))
        }
    }

    fn service() -> SessionService {
        SessionService::new(Arc::new(OneSession {
            hash: hash_token("tok-1"),
            user_id: 7,
        }))
    }

    #[test]
    fn digest_is_sha256() {
        assert_eq!(hash_token("tok-1").len(), 32);
        assert_ne!(hash_token("tok-1"), hash_token("tok-2"));
    }

    #[tokio::test]
    async fn known_token_resolves_actor() {
        let actor = service().authenticate(" tok-1 ").await.expect("actor");
        assert_eq!(actor, Actor { user_id: 7 });
    }

    #[tokio::test]
    async fn unknown_and_blank_tokens_are_rejected() {
        assert!(matches!(
            service().authenticate("nope").await,
            Err(SessionError::Invalid)
        ));
        assert!(matches!(
            service().authenticate("  ").await,
            Err(SessionError::Missing)
        ));
    }
}
