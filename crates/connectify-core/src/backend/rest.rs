//! Table endpoints (`/rest/v1`).

use std::fmt::Display;

use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::{BackendClient, error_parts};
use crate::error::{ClientError, ClientResult};

/// Query against one table: column selection, `eq` filters, ordering, limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    table: &'static str,
    params: Vec<(String, String)>,
}

impl Query {
    pub fn table(table: &'static str) -> Self {
        Self {
            table,
            params: Vec::new(),
        }
    }

    #[must_use]
    pub fn select(mut self, columns: &str) -> Self {
        self.params.push(("select".to_string(), columns.to_string()));
        self
    }

    #[must_use]
    pub fn eq(mut self, column: &str, value: impl Display) -> Self {
        self.params.push((column.to_string(), format!("eq.{value}")));
        self
    }

    #[must_use]
    pub fn order_desc(mut self, column: &str) -> Self {
        self.params.push(("order".to_string(), format!("{column}.desc")));
        self
    }

    #[must_use]
    pub fn limit(mut self, n: usize) -> Self {
        self.params.push(("limit".to_string(), n.to_string()));
        self
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    fn path(&self) -> String {
        format!("/rest/v1/{}", self.table)
    }
}

impl BackendClient {
    /// Runs a read query and decodes the rows.
    ///
    /// # Errors
    /// Returns `ClientError::Data` if the backend rejects the query.
    pub async fn select<T: DeserializeOwned>(&self, query: &Query) -> ClientResult<Vec<T>> {
        tracing::debug!(table = query.table, "GET /rest/v1");
        let response = self
            .request(Method::GET, &query.path())
            .query(query.params())
            .send()
            .await?;
        let response = check_data(response).await?;
        Ok(response.json().await?)
    }

    /// Inserts one row and returns the stored representation.
    ///
    /// # Errors
    /// Returns `ClientError::Data` if the insert is rejected.
    pub async fn insert<B, T>(&self, query: &Query, row: &B) -> ClientResult<Vec<T>>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        tracing::debug!(table = query.table, "POST /rest/v1");
        let response = self
            .request(Method::POST, &query.path())
            .query(query.params())
            .header("Prefer", "return=representation")
            .json(row)
            .send()
            .await?;
        let response = check_data(response).await?;
        Ok(response.json().await?)
    }

    /// Inserts one row without reading it back.
    ///
    /// # Errors
    /// Returns `ClientError::Data` if the insert is rejected.
    pub async fn insert_minimal<B: Serialize + Sync>(
        &self,
        query: &Query,
        row: &B,
    ) -> ClientResult<()> {
        tracing::debug!(table = query.table, "POST /rest/v1");
        let response = self
            .request(Method::POST, &query.path())
            .header("Prefer", "return=minimal")
            .json(row)
            .send()
            .await?;
        check_data(response).await?;
        Ok(())
    }

    /// Deletes every row matching the query filters.
    ///
    /// # Errors
    /// Returns `ClientError::Data` if the delete is rejected.
    pub async fn delete_rows(&self, query: &Query) -> ClientResult<()> {
        tracing::debug!(table = query.table, "DELETE /rest/v1");
        let response = self
            .request(Method::DELETE, &query.path())
            .query(query.params())
            .send()
            .await?;
        check_data(response).await?;
        Ok(())
    }
}

async fn check_data(response: reqwest::Response) -> ClientResult<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let (status, message) = error_parts(response).await;
    tracing::warn!(status, %message, "table request failed");
    Err(ClientError::Data { status, message })
}
