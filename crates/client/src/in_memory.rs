//! In-memory [`Backend`] that enforces the retail API's reference rules.
//!
//! Intended for tests and dry runs. It keeps an ordered journal of every
//! created record so callers can check what was created, by whom, and when
//! relative to its parents.

use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value as JsonValue, json};

use stockseed_core::{Credentials, EntityKind, RecordId, SeedError, SeedResult, Token};

use crate::backend::Backend;

/// One accepted creation call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JournalEntry {
    /// Position in the global creation order (starting at 1).
    pub sequence: u64,
    pub kind: EntityKind,
    pub pk: RecordId,
    /// Username of the actor whose token made the call.
    pub actor: String,
    /// The stored record (payload plus `pk`).
    pub record: JsonValue,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct StoredUser {
    password: String,
    is_admin: bool,
    profile: Option<JsonValue>,
}

#[derive(Debug, Default)]
struct State {
    users: BTreeMap<String, StoredUser>,
    sessions: HashMap<String, String>,
    records: BTreeMap<EntityKind, Vec<JsonValue>>,
    journal: Vec<JournalEntry>,
    next_pk: i64,
    next_token: u64,
}

impl State {
    fn actor_for(&self, token: &Token) -> SeedResult<(&str, &StoredUser)> {
        let username = self
            .sessions
            .get(token.as_str())
            .ok_or_else(|| SeedError::Unauthorized("invalid token".to_string()))?;
        let user = self
            .users
            .get(username)
            .ok_or_else(|| SeedError::Unauthorized(format!("unknown actor `{username}`")))?;
        Ok((username.as_str(), user))
    }

    fn records_of(&self, kind: EntityKind) -> &[JsonValue] {
        self.records.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    fn exists(&self, kind: EntityKind, field: &str, value: &JsonValue) -> bool {
        self.records_of(kind).iter().any(|r| r.get(field) == Some(value))
    }

    /// Enforce the backend's per-kind payload rules.
    fn check(&self, kind: EntityKind, payload: &Map<String, JsonValue>) -> SeedResult<()> {
        match kind {
            EntityKind::Actor => {
                let username = required_str(kind, payload, "username")?;
                required_str(kind, payload, "password")?;
                if self.users.contains_key(username) {
                    return Err(SeedError::validation(
                        kind,
                        format!("username `{username}` already taken"),
                    ));
                }
            }
            EntityKind::Brand | EntityKind::Catalogue | EntityKind::Provider => {
                self.unique(kind, payload, "name")?;
            }
            EntityKind::Product => {
                self.unique(kind, payload, "code")?;
                self.reference(kind, payload, "brand_name", EntityKind::Brand, "name")?;
                self.reference(kind, payload, "catalogue_name", EntityKind::Catalogue, "name")?;
            }
            EntityKind::Entry => {
                self.reference(kind, payload, "provider_name", EntityKind::Provider, "name")?;
            }
            EntityKind::Purchase => {
                self.reference(kind, payload, "entry_id", EntityKind::Entry, "pk")?;
                self.reference(kind, payload, "product_code", EntityKind::Product, "code")?;
                positive_quantity(kind, payload)?;
            }
            EntityKind::Exit => {}
            EntityKind::Sale => {
                self.reference(kind, payload, "exit_id", EntityKind::Exit, "pk")?;
                self.reference(kind, payload, "product_code", EntityKind::Product, "code")?;
                positive_quantity(kind, payload)?;
            }
        }
        Ok(())
    }

    fn unique(
        &self,
        kind: EntityKind,
        payload: &Map<String, JsonValue>,
        field: &str,
    ) -> SeedResult<()> {
        let value = required_str(kind, payload, field)?;
        if self.exists(kind, field, &json!(value)) {
            return Err(SeedError::validation(
                kind,
                format!("{field} `{value}` already exists"),
            ));
        }
        Ok(())
    }

    fn reference(
        &self,
        kind: EntityKind,
        payload: &Map<String, JsonValue>,
        field: &str,
        parent: EntityKind,
        parent_field: &str,
    ) -> SeedResult<()> {
        let value = payload
            .get(field)
            .filter(|v| !v.is_null())
            .ok_or_else(|| SeedError::validation(kind, format!("{field} is required")))?;
        if !self.exists(parent, parent_field, value) {
            return Err(SeedError::validation(
                kind,
                format!("{field} {value} does not match any {parent}"),
            ));
        }
        Ok(())
    }
}

fn required_str<'a>(
    kind: EntityKind,
    payload: &'a Map<String, JsonValue>,
    field: &str,
) -> SeedResult<&'a str> {
    payload
        .get(field)
        .and_then(JsonValue::as_str)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| SeedError::validation(kind, format!("{field} is required")))
}

fn positive_quantity(kind: EntityKind, payload: &Map<String, JsonValue>) -> SeedResult<()> {
    match payload.get("quantity") {
        None => Ok(()),
        Some(q) if q.as_i64().is_some_and(|n| n > 0) => Ok(()),
        Some(q) => Err(SeedError::validation(
            kind,
            format!("quantity must be a positive integer, got {q}"),
        )),
    }
}

/// Reference implementation of the retail API, held in memory.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    state: RwLock<State>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style variant of [`InMemoryBackend::add_user`].
    pub fn with_user(self, username: &str, password: &str, is_admin: bool) -> Self {
        if let Ok(mut state) = self.state.write() {
            insert_user(&mut state, username, password, is_admin);
        }
        self
    }

    /// Register an actor directly, bypassing the API.
    pub fn add_user(&self, username: &str, password: &str, is_admin: bool) -> SeedResult<()> {
        let mut state = self.write()?;
        insert_user(&mut state, username, password, is_admin);
        Ok(())
    }

    /// Store a record as if an earlier run had created it.
    ///
    /// Reference rules still apply. The record is journaled under the `fixture`
    /// actor.
    pub fn preload(&self, kind: EntityKind, payload: JsonValue) -> SeedResult<JsonValue> {
        let mut state = self.write()?;
        store(&mut state, "fixture", kind, payload)
    }

    /// Every accepted creation, in order.
    pub fn journal(&self) -> Vec<JournalEntry> {
        self.read().map(|s| s.journal.clone()).unwrap_or_default()
    }

    /// Stored records of `kind` (actors excluded; see [`InMemoryBackend::usernames`]).
    pub fn records(&self, kind: EntityKind) -> Vec<JsonValue> {
        self.read()
            .map(|s| s.records_of(kind).to_vec())
            .unwrap_or_default()
    }

    pub fn count(&self, kind: EntityKind) -> usize {
        match kind {
            EntityKind::Actor => self.usernames().len(),
            _ => self.read().map(|s| s.records_of(kind).len()).unwrap_or(0),
        }
    }

    pub fn usernames(&self) -> Vec<String> {
        self.read()
            .map(|s| s.users.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn profile(&self, username: &str) -> Option<JsonValue> {
        self.read()
            .ok()
            .and_then(|s| s.users.get(username).and_then(|u| u.profile.clone()))
    }

    pub fn is_admin(&self, username: &str) -> bool {
        self.read()
            .ok()
            .and_then(|s| s.users.get(username).map(|u| u.is_admin))
            .unwrap_or(false)
    }

    fn read(&self) -> SeedResult<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|_| SeedError::Transport("in-memory backend lock poisoned".to_string()))
    }

    fn write(&self) -> SeedResult<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|_| SeedError::Transport("in-memory backend lock poisoned".to_string()))
    }

    fn login_sync(&self, credentials: &Credentials) -> SeedResult<Token> {
        let mut state = self.write()?;
        let accepted = state
            .users
            .get(&credentials.username)
            .is_some_and(|u| u.password == credentials.password);
        if !accepted {
            return Err(SeedError::authentication(
                &credentials.username,
                "unable to log in with provided credentials",
            ));
        }

        state.next_token += 1;
        let token = format!("tok-{:04}-{}", state.next_token, credentials.username);
        state
            .sessions
            .insert(token.clone(), credentials.username.clone());
        Ok(Token::new(token))
    }

    fn create_sync(
        &self,
        token: &Token,
        kind: EntityKind,
        payload: JsonValue,
    ) -> SeedResult<JsonValue> {
        let mut state = self.write()?;
        let (username, user) = state.actor_for(token)?;
        if kind.requires_admin() && !user.is_admin {
            return Err(SeedError::Unauthorized(format!(
                "`{username}` may not create a {kind}"
            )));
        }
        let username = username.to_string();
        store(&mut state, &username, kind, payload)
    }

    fn update_profile_sync(&self, token: &Token, profile: JsonValue) -> SeedResult<JsonValue> {
        let mut state = self.write()?;
        let username = state.actor_for(token)?.0.to_string();
        if !profile.is_object() {
            return Err(SeedError::Api {
                status: 400,
                body: "profile must be an object".to_string(),
            });
        }

        if let Some(user) = state.users.get_mut(&username) {
            user.profile = Some(profile.clone());
        }
        let mut response = profile;
        if let Some(obj) = response.as_object_mut() {
            obj.insert("username".to_string(), json!(username));
        }
        Ok(response)
    }

    fn list_sync(&self, token: Option<&Token>, kind: EntityKind) -> SeedResult<Vec<JsonValue>> {
        let state = self.read()?;
        let token =
            token.ok_or_else(|| SeedError::Unauthorized("authentication required".to_string()))?;
        state.actor_for(token)?;

        Ok(match kind {
            EntityKind::Actor => state
                .users
                .iter()
                .map(|(name, u)| json!({ "username": name, "is_admin": u.is_admin }))
                .collect(),
            _ => state.records_of(kind).to_vec(),
        })
    }
}

fn insert_user(state: &mut State, username: &str, password: &str, is_admin: bool) {
    state.users.insert(
        username.to_string(),
        StoredUser {
            password: password.to_string(),
            is_admin,
            profile: None,
        },
    );
}

/// Validate, assign a key, store and journal one record.
fn store(
    state: &mut State,
    actor: &str,
    kind: EntityKind,
    payload: JsonValue,
) -> SeedResult<JsonValue> {
    let JsonValue::Object(mut fields) = payload else {
        return Err(SeedError::validation(kind, "payload must be a JSON object"));
    };
    state.check(kind, &fields)?;

    state.next_pk += 1;
    let pk = RecordId::Int(state.next_pk);

    if kind == EntityKind::Actor {
        let username = required_str(kind, &fields, "username")?.to_string();
        let password = required_str(kind, &fields, "password")?.to_string();
        let is_admin = fields.get("role").and_then(JsonValue::as_str) == Some("admin");
        insert_user(state, &username, &password, is_admin);
        fields.remove("password");
    } else if matches!(kind, EntityKind::Entry | EntityKind::Exit) {
        fields.insert("created_by".to_string(), json!(actor));
    }
    fields.insert("pk".to_string(), json!(pk));

    let record = JsonValue::Object(fields);
    if kind != EntityKind::Actor {
        state.records.entry(kind).or_default().push(record.clone());
    }

    let sequence = state.journal.len() as u64 + 1;
    state.journal.push(JournalEntry {
        sequence,
        kind,
        pk,
        actor: actor.to_string(),
        record: record.clone(),
        created_at: Utc::now(),
    });
    Ok(record)
}

#[async_trait]
impl Backend for InMemoryBackend {
    async fn login(&self, credentials: &Credentials) -> SeedResult<Token> {
        self.login_sync(credentials)
    }

    async fn create(
        &self,
        token: &Token,
        kind: EntityKind,
        payload: JsonValue,
    ) -> SeedResult<JsonValue> {
        self.create_sync(token, kind, payload)
    }

    async fn update_profile(&self, token: &Token, profile: JsonValue) -> SeedResult<JsonValue> {
        self.update_profile_sync(token, profile)
    }

    async fn list(&self, token: Option<&Token>, kind: EntityKind) -> SeedResult<Vec<JsonValue>> {
        self.list_sync(token, kind)
    }
}
