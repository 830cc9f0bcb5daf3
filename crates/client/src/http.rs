//! HTTP implementation of [`Backend`] over `reqwest`.

use std::collections::HashSet;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::debug;

use stockseed_core::{Credentials, EntityKind, SeedError, SeedResult, Token};

use crate::backend::Backend;

/// How the token is presented in the `Authorization` header.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthScheme {
    /// `Authorization: Bearer <token>`
    #[default]
    Bearer,
    /// `Authorization: Token <token>` (Django REST framework token auth).
    Token,
}

impl AuthScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthScheme::Bearer => "Bearer",
            AuthScheme::Token => "Token",
        }
    }
}

impl core::str::FromStr for AuthScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bearer" => Ok(AuthScheme::Bearer),
            "token" => Ok(AuthScheme::Token),
            other => Err(format!("unknown auth scheme `{other}` (expected bearer or token)")),
        }
    }
}

/// Paths of every endpoint the seeder calls, relative to the base URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub login: String,
    pub register: String,
    pub profile: String,
    pub users: String,
    pub brands: String,
    pub catalogues: String,
    pub products: String,
    pub providers: String,
    pub entries: String,
    pub purchases: String,
    pub exits: String,
    pub sales: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            login: "/login".to_string(),
            register: "/register".to_string(),
            profile: "/profile".to_string(),
            users: "/users".to_string(),
            brands: "/brands".to_string(),
            catalogues: "/catalogues".to_string(),
            products: "/products".to_string(),
            providers: "/providers".to_string(),
            entries: "/entries".to_string(),
            purchases: "/purchases".to_string(),
            exits: "/exits".to_string(),
            sales: "/sales".to_string(),
        }
    }
}

impl Endpoints {
    /// Path a new record of `kind` is POSTed to.
    pub fn create_path(&self, kind: EntityKind) -> &str {
        match kind {
            EntityKind::Actor => &self.register,
            _ => self.collection_path(kind),
        }
    }

    /// Path records of `kind` are listed from.
    pub fn list_path(&self, kind: EntityKind) -> &str {
        match kind {
            EntityKind::Actor => &self.users,
            _ => self.collection_path(kind),
        }
    }

    fn collection_path(&self, kind: EntityKind) -> &str {
        match kind {
            EntityKind::Actor => &self.users,
            EntityKind::Brand => &self.brands,
            EntityKind::Catalogue => &self.catalogues,
            EntityKind::Product => &self.products,
            EntityKind::Provider => &self.providers,
            EntityKind::Entry => &self.entries,
            EntityKind::Purchase => &self.purchases,
            EntityKind::Exit => &self.exits,
            EntityKind::Sale => &self.sales,
        }
    }
}

/// Login responses carry the token under `token`, `key` or `access`.
#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(alias = "key", alias = "access")]
    token: String,
}

/// A list response: either a bare array or a paginated page.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ListResponse {
    Items(Vec<JsonValue>),
    Page {
        results: Vec<JsonValue>,
        #[serde(default)]
        next: Option<String>,
    },
}

/// [`Backend`] reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    endpoints: Endpoints,
    auth_scheme: AuthScheme,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            endpoints: Endpoints::default(),
            auth_scheme: AuthScheme::default(),
        }
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn with_auth_scheme(mut self, scheme: AuthScheme) -> Self {
        self.auth_scheme = scheme;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, req: reqwest::RequestBuilder, token: &Token) -> reqwest::RequestBuilder {
        match self.auth_scheme {
            AuthScheme::Bearer => req.bearer_auth(token.as_str()),
            AuthScheme::Token => req.header(
                AUTHORIZATION,
                format!("{} {}", self.auth_scheme.as_str(), token.as_str()),
            ),
        }
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> SeedResult<(StatusCode, String)> {
        let resp = req
            .send()
            .await
            .map_err(|e| SeedError::Transport(e.to_string()))?;
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| SeedError::Transport(e.to_string()))?;
        Ok((status, body))
    }
}

/// Map a non-success status of an authenticated call onto the error taxonomy.
fn rejection(kind: Option<EntityKind>, status: StatusCode, body: String) -> SeedError {
    match (status, kind) {
        (StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY, Some(kind)) => {
            SeedError::validation(kind, body)
        }
        (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN, _) => SeedError::Unauthorized(body),
        _ => SeedError::Api {
            status: status.as_u16(),
            body,
        },
    }
}

fn parse_body(body: &str) -> SeedResult<JsonValue> {
    if body.trim().is_empty() {
        return Ok(JsonValue::Null);
    }
    serde_json::from_str(body).map_err(|e| SeedError::decode(e.to_string()))
}

#[async_trait]
impl Backend for HttpBackend {
    async fn login(&self, credentials: &Credentials) -> SeedResult<Token> {
        let req = self
            .client
            .post(self.url(&self.endpoints.login))
            .json(credentials);
        let (status, body) = self.send(req).await?;

        match status {
            s if s.is_success() => {
                let parsed: LoginResponse =
                    serde_json::from_str(&body).map_err(|e| SeedError::decode(e.to_string()))?;
                debug!(username = %credentials.username, "login accepted");
                Ok(Token::new(parsed.token))
            }
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(SeedError::authentication(&credentials.username, body))
            }
            s => Err(SeedError::Api {
                status: s.as_u16(),
                body,
            }),
        }
    }

    async fn create(
        &self,
        token: &Token,
        kind: EntityKind,
        payload: JsonValue,
    ) -> SeedResult<JsonValue> {
        let path = self.endpoints.create_path(kind);
        let req = self.authorize(self.client.post(self.url(path)), token).json(&payload);
        let (status, body) = self.send(req).await?;

        if !status.is_success() {
            return Err(rejection(Some(kind), status, body));
        }
        debug!(%kind, path, "record created");
        parse_body(&body)
    }

    async fn update_profile(&self, token: &Token, profile: JsonValue) -> SeedResult<JsonValue> {
        let req = self
            .authorize(self.client.put(self.url(&self.endpoints.profile)), token)
            .json(&profile);
        let (status, body) = self.send(req).await?;

        if !status.is_success() {
            return Err(rejection(None, status, body));
        }
        parse_body(&body)
    }

    async fn list(&self, token: Option<&Token>, kind: EntityKind) -> SeedResult<Vec<JsonValue>> {
        let mut items = Vec::new();
        let mut visited = HashSet::new();
        let mut next = Some(self.url(self.endpoints.list_path(kind)));

        // Paginated backends link pages through absolute `next` URLs.
        while let Some(url) = next.take() {
            if !visited.insert(url.clone()) {
                return Err(SeedError::decode(format!(
                    "{kind} pagination loops back to {url}"
                )));
            }
            let mut req = self.client.get(&url);
            if let Some(token) = token {
                req = self.authorize(req, token);
            }
            let (status, body) = self.send(req).await?;
            if !status.is_success() {
                return Err(rejection(None, status, body));
            }

            let page: ListResponse =
                serde_json::from_str(&body).map_err(|e| SeedError::decode(e.to_string()))?;
            match page {
                ListResponse::Items(mut v) => items.append(&mut v),
                ListResponse::Page {
                    mut results,
                    next: link,
                } => {
                    items.append(&mut results);
                    next = link;
                }
            }
        }

        debug!(%kind, count = items.len(), "listed records");
        Ok(items)
    }
}
