//! PostgREST (Supabase REST) backend for the Remote Store capability.
//!
//! # Responsibility
//! - Translate table CRUD calls into `/rest/v1/{table}` HTTP requests.
//! - Map non-success statuses to `RemoteError::Status`.
//!
//! # Invariants
//! - Every request carries the `apikey` header and a bearer token.
//! - Update and delete requests always filter by `id=eq.{id}`.

use super::{value_text, Direction, RemoteError, RemoteResult, RemoteStore, Row, SelectQuery, Table};
use async_trait::async_trait;
use log::debug;
use reqwest::{Client, Method, RequestBuilder, Response};

const REST_PREFIX: &str = "rest/v1";

/// HTTP client for a hosted PostgREST endpoint.
pub struct PostgrestStore {
    base_url: String,
    api_key: String,
    client: Client,
}

impl PostgrestStore {
    /// Creates a store with a default HTTP client.
    ///
    /// # Errors
    /// - Returns `RemoteError::Transport` when the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> RemoteResult<Self> {
        let client = Client::builder().build()?;
        Ok(Self::with_client(base_url, api_key, client))
    }

    /// Creates a store with a caller-configured HTTP client.
    pub fn with_client(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        client: Client,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            client,
        }
    }

    fn table_url(&self, table: Table) -> String {
        format!(
            "{}/{REST_PREFIX}/{}",
            self.base_url.trim_end_matches('/'),
            table.as_str()
        )
    }

    fn request(&self, method: Method, table: Table) -> RequestBuilder {
        self.client
            .request(method, self.table_url(table))
            .header("apikey", self.api_key.as_str())
            .bearer_auth(self.api_key.as_str())
    }

    async fn send(&self, request: RequestBuilder) -> RemoteResult<Response> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "unreadable error body".to_string());
        Err(RemoteError::Status {
            status: status.as_u16(),
            message,
        })
    }
}

/// Builds PostgREST query-string pairs for a select.
fn query_pairs(query: &SelectQuery) -> Vec<(String, String)> {
    let mut pairs: Vec<(String, String)> = query
        .filters
        .iter()
        .map(|(column, value)| (column.clone(), format!("eq.{}", value_text(value))))
        .collect();

    if let Some(order) = &query.order {
        let direction = match order.direction {
            Direction::Ascending => "asc",
            Direction::Descending => "desc",
        };
        pairs.push(("order".to_string(), format!("{}.{direction}", order.column)));
    }

    if let Some(limit) = query.limit {
        pairs.push(("limit".to_string(), limit.to_string()));
    }

    pairs
}

fn id_filter(id: &str) -> [(&'static str, String); 1] {
    [("id", format!("eq.{id}"))]
}

#[async_trait]
impl RemoteStore for PostgrestStore {
    async fn select(&self, table: Table, query: &SelectQuery) -> RemoteResult<Vec<Row>> {
        let pairs = query_pairs(query);
        debug!("event=remote_select module=remote backend=postgrest table={table}");
        let response = self
            .send(self.request(Method::GET, table).query(&pairs))
            .await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn insert(&self, table: Table, row: Row) -> RemoteResult<()> {
        debug!("event=remote_insert module=remote backend=postgrest table={table}");
        self.send(
            self.request(Method::POST, table)
                .header("Prefer", "return=minimal")
                .json(&row),
        )
        .await?;
        Ok(())
    }

    async fn update(&self, table: Table, patch: Row, id: &str) -> RemoteResult<()> {
        debug!("event=remote_update module=remote backend=postgrest table={table}");
        self.send(
            self.request(Method::PATCH, table)
                .query(&id_filter(id))
                .header("Prefer", "return=minimal")
                .json(&patch),
        )
        .await?;
        Ok(())
    }

    async fn delete(&self, table: Table, id: &str) -> RemoteResult<()> {
        debug!("event=remote_delete module=remote backend=postgrest table={table}");
        self.send(self.request(Method::DELETE, table).query(&id_filter(id)))
            .await?;
        Ok(())
    }
}
