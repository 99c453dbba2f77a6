//! Minimal query client for the hosted backend's row API.
//!
//! Covers the subset the portal needs: select, insert and update against a
//! table, with equality filters, ordering and limits.
//!
//! ```rust,no_run
//! use bsm_portal::backend::RestClient;
//! use bsm_portal::models::UserProfile;
//!
//! # async fn example() -> Result<(), bsm_portal::backend::AuthError> {
//! let client = RestClient::new("https://project.example.co", "anon-key");
//! let rows: Vec<UserProfile> = client
//!     .table("users")
//!     .eq("role", "admin")
//!     .order("last_login", false)
//!     .limit(10)
//!     .select()
//!     .await?;
//! # Ok(())
//! # }
//! ```

use super::{AuthError, AuthResult};
use reqwest::{RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::fmt::Display;
use std::time::Duration;

#[derive(Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl RestClient {
    pub fn new(base_url: &str, anon_key: &str) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Start a query against `table`.
    pub fn table(&self, table: &str) -> TableQuery<'_> {
        TableQuery {
            client: self,
            table: table.to_string(),
            params: Vec::new(),
            bearer: None,
        }
    }

    pub fn post(&self, path: &str, bearer: Option<&str>) -> RequestBuilder {
        self.authorized(self.http.post(self.endpoint(path)), bearer)
    }

    /// Attach the project key, and the user's token when one is available.
    fn authorized(&self, builder: RequestBuilder, bearer: Option<&str>) -> RequestBuilder {
        builder
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer.unwrap_or(&self.anon_key))
    }
}

pub struct TableQuery<'a> {
    client: &'a RestClient,
    table: String,
    params: Vec<(String, String)>,
    bearer: Option<String>,
}

impl<'a> TableQuery<'a> {
    pub fn eq(mut self, column: &str, value: impl Display) -> Self {
        self.params.push((column.to_string(), format!("eq.{}", value)));
        self
    }

    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        let direction = if ascending { "asc" } else { "desc" };
        self.params
            .push(("order".to_string(), format!("{}.{}", column, direction)));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.params.push(("limit".to_string(), limit.to_string()));
        self
    }

    /// Run the query as a signed-in user instead of with the project key.
    pub fn bearer(mut self, token: Option<&str>) -> Self {
        self.bearer = token.map(str::to_string);
        self
    }

    pub async fn select<T: DeserializeOwned>(self) -> AuthResult<Vec<T>> {
        let response = self
            .request(reqwest::Method::GET)
            .query(&[("select", "*")])
            .send()
            .await?;
        read_json(response).await
    }

    pub async fn insert<B, T>(self, row: &B) -> AuthResult<Vec<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .request(reqwest::Method::POST)
            .header("Prefer", "return=representation")
            .json(row)
            .send()
            .await?;
        read_json(response).await
    }

    pub async fn update<B: Serialize + ?Sized>(self, changes: &B) -> AuthResult<()> {
        let response = self
            .request(reqwest::Method::PATCH)
            .header("Prefer", "return=minimal")
            .json(changes)
            .send()
            .await?;
        ensure_success(response).await
    }

    fn request(&self, method: reqwest::Method) -> RequestBuilder {
        let url = self.client.endpoint(&format!("/rest/v1/{}", self.table));
        let builder = self
            .client
            .http
            .request(method, url)
            .query(&self.params);
        self.client.authorized(builder, self.bearer.as_deref())
    }
}

/// Decode a successful JSON body, or turn an error status into [`AuthError::Backend`].
pub async fn read_json<T: DeserializeOwned>(response: Response) -> AuthResult<T> {
    if !response.status().is_success() {
        return Err(error_from_response(response).await);
    }
    response
        .json::<T>()
        .await
        .map_err(|e| AuthError::InvalidResponse(e.to_string()))
}

pub async fn ensure_success(response: Response) -> AuthResult<()> {
    if response.status().is_success() {
        Ok(())
    } else {
        Err(error_from_response(response).await)
    }
}

async fn error_from_response(response: Response) -> AuthError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|json| extract_message(&json))
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        });

    AuthError::Backend {
        status: status.as_u16(),
        message,
    }
}

/// The auth and row APIs report errors under different keys.
fn extract_message(json: &Value) -> Option<String> {
    ["error_description", "msg", "message", "error"]
        .iter()
        .find_map(|key| json.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}
