//! PostgREST client for Supabase-backed tables.

use reqwest::blocking::Client;
use serde_json::Value;
use tracing::debug;

use super::{StoreConfig, StoreError, TableSource};
use crate::model::types::Table;

/// Production [`TableSource`]: `GET {url}/rest/v1/{table}?select=*`.
pub struct SupabaseSource {
    client: Client,
    config: StoreConfig,
}

impl SupabaseSource {
    /// Connect with explicit settings.
    pub fn connect(config: StoreConfig) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("ivy-insights/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(StoreError::Connect)?;
        Ok(Self { client, config })
    }

    /// Connect from `SUPABASE_URL` / `SUPABASE_KEY`.
    pub fn from_env() -> Result<Self, StoreError> {
        Self::connect(StoreConfig::from_env()?)
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}?select=*", self.config.url, table)
    }
}

impl TableSource for SupabaseSource {
    fn get(&self, table: &str) -> Result<Table, StoreError> {
        let url = self.table_url(table);
        debug!(%table, "fetching table from store");

        let response = self
            .client
            .get(&url)
            .header("apikey", &self.config.key)
            .bearer_auth(&self.config.key)
            .header("Accept", "application/json")
            .send()
            .map_err(|source| StoreError::Transport {
                table: table.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Status {
                table: table.to_string(),
                status: status.as_u16(),
            });
        }

        let body: Value = response.json().map_err(|source| StoreError::Decode {
            table: table.to_string(),
            source,
        })?;
        let normalized = Table::from_response(body);
        debug!(%table, rows = normalized.len(), "fetched table");
        Ok(normalized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn config(url: &str) -> StoreConfig {
        StoreConfig {
            url: url.to_string(),
            key: "test-key".to_string(),
            timeout: Duration::from_secs(2),
        }
    }

    #[test]
    fn table_url_targets_postgrest() {
        let source = SupabaseSource::connect(config("https://example.supabase.co")).expect("client");
        assert_eq!(
            source.table_url("suppliers"),
            "https://example.supabase.co/rest/v1/suppliers?select=*"
        );
    }

    #[test]
    fn unreachable_host_is_a_transport_error() {
        // Port 1 on loopback is closed; the connection is refused fast.
        let source = SupabaseSource::connect(config("http://127.0.0.1:1")).expect("client");
        let err = source.get("suppliers").unwrap_err();
        assert!(matches!(err, StoreError::Transport { .. }), "got: {err}");
    }
}
