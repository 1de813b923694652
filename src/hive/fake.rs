//! In-memory identity provider for tests

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::sso::{HiveCredentials, IdentityProvider};
use crate::error::AppError;

/// Hands out queued tokens/errors first, then `fallback` (if any)
#[derive(Default)]
pub struct FakeIdentity {
    queued: Mutex<VecDeque<Result<String, String>>>,
    fallback: Option<String>,
    hang: bool,
    calls: AtomicUsize,
}

impl FakeIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            fallback: Some(token.to_string()),
            ..Self::default()
        }
    }

    /// Never answers, like a server that accepts and goes silent
    pub fn hanging() -> Self {
        Self {
            hang: true,
            ..Self::default()
        }
    }

    pub fn push_token(&self, token: &str) {
        self.queued.lock().unwrap().push_back(Ok(token.to_string()));
    }

    pub fn push_error(&self, msg: &str) {
        self.queued.lock().unwrap().push_back(Err(msg.to_string()));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn id_token(&self, _credentials: &HiveCredentials) -> Result<String, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.hang {
            std::future::pending::<()>().await;
        }

        let next = self.queued.lock().unwrap().pop_front();
        match next {
            Some(Ok(token)) => Ok(token),
            Some(Err(msg)) => Err(AppError::AuthError(msg)),
            None => self
                .fallback
                .clone()
                .ok_or_else(|| AppError::AuthError("no token queued".into())),
        }
    }
}
