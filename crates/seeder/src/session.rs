//! Per-actor authentication sessions.

use std::collections::BTreeMap;
use std::sync::Arc;

use rand::Rng;
use tracing::info;

use stockseed_client::Backend;
use stockseed_core::{Credentials, RandomSampler, SeedError, SeedResult, Token};

/// An actor together with its current token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorSession {
    pub username: String,
    pub token: Token,
}

/// Exchanges credentials for tokens and remembers the latest token per actor
/// for the lifetime of a run.
///
/// Only tokens are kept; credentials are never cached.
pub struct SessionManager {
    backend: Arc<dyn Backend>,
    tokens: BTreeMap<String, Token>,
}

impl SessionManager {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            tokens: BTreeMap::new(),
        }
    }

    /// Log in and remember the token, replacing any earlier one for the actor.
    pub async fn acquire_token(&mut self, credentials: &Credentials) -> SeedResult<Token> {
        let token = self.backend.login(credentials).await?;
        info!(username = %credentials.username, "actor authenticated");
        self.tokens.insert(credentials.username.clone(), token.clone());
        Ok(token)
    }

    pub fn token_for(&self, username: &str) -> Option<&Token> {
        self.tokens.get(username)
    }

    /// The named actor's session, or `MissingSession` if it never logged in.
    pub fn session_for(&self, username: &str) -> SeedResult<ActorSession> {
        self.token_for(username)
            .map(|token| ActorSession {
                username: username.to_string(),
                token: token.clone(),
            })
            .ok_or_else(|| SeedError::MissingSession(username.to_string()))
    }

    /// Uniformly pick one of the sessions acquired so far.
    pub fn random_token<R: Rng>(&self, sampler: &mut RandomSampler<R>) -> SeedResult<ActorSession> {
        let sessions: Vec<(&String, &Token)> = self.tokens.iter().collect();
        let (username, token) = sampler.choose("actor token pool", &sessions)?;
        Ok(ActorSession {
            username: username.to_string(),
            token: (*token).clone(),
        })
    }

    /// Drop an actor's token so it no longer takes part in random selection.
    pub fn release(&mut self, username: &str) -> Option<Token> {
        self.tokens.remove(username)
    }

    pub fn usernames(&self) -> impl Iterator<Item = &str> {
        self.tokens.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}
