//! HTTP client for the public extract endpoint.

use std::time::Duration;

use async_trait::async_trait;
use extracto_core::{DrawDate, DrawSet};
use tracing::info;

use crate::fetch::{DrawFetcher, DrawQuery, FetchError};
use crate::wire::ExtractoResponse;

pub const DEFAULT_BASE_URL: &str = "https://lotemovil.tecnoaccion.com.ar";

/// Status the upstream answers with when it has no extract for a date.
const NO_DATA_STATUS: u16 = 500;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Like `https://host` (no trailing slash needed).
    pub base_url: String,
    /// Bearer token; requests go out unauthenticated when `None`.
    pub token: Option<String>,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: None,
            timeout: Duration::from_secs(30),
            user_agent: format!("extracto/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Client for `GET {base}/api/public/{organization}/extracto`.
pub struct ExtractoClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ExtractoClient {
    pub fn new(config: ClientConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent)
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token,
        })
    }

    fn extract_url(&self, query: DrawQuery, date: DrawDate) -> String {
        format!(
            "{}/api/public/{}/extracto?imputacion={}&fechasorteo={}",
            self.base_url,
            query.organization,
            query.classification,
            date.to_string().replace('/', "%2F"),
        )
    }

    /// Fetch the raw extract of one date.
    ///
    /// A 500 from the upstream means there was no draw that day and comes
    /// back as an empty response rather than an error.
    pub async fn fetch_extract(
        &self,
        query: DrawQuery,
        date: DrawDate,
    ) -> Result<ExtractoResponse, FetchError> {
        let url = self.extract_url(query, date);

        info!(url = %url, "fetching extract");
        let mut request = self.client.get(&url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let resp = request.send().await?;
        let status = resp.status();
        if status.as_u16() == NO_DATA_STATUS {
            info!(date = %date, "no extract for date");
            return Ok(ExtractoResponse::default());
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(FetchError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let extract: ExtractoResponse = resp.json().await?;
        info!(date = %date, numeros = extract.numeros.len(), "fetched extract");
        Ok(extract)
    }
}

#[async_trait]
impl DrawFetcher for ExtractoClient {
    async fn fetch(&self, query: DrawQuery, date: DrawDate) -> Result<DrawSet, FetchError> {
        self.fetch_extract(query, date)
            .await
            .map(ExtractoResponse::into_draw_set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str) -> ExtractoClient {
        ExtractoClient::new(ClientConfig {
            base_url: base_url.into(),
            ..ClientConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn trims_trailing_slash() {
        let client = client("http://localhost:4000/");
        assert_eq!(client.base_url, "http://localhost:4000");
    }

    #[test]
    fn builds_encoded_extract_url() {
        let client = client("http://localhost:4000");
        let url = client.extract_url(DrawQuery::new(1, 0), "05/03/2024".parse().unwrap());
        assert_eq!(
            url,
            "http://localhost:4000/api/public/1/extracto?imputacion=0&fechasorteo=05%2F03%2F2024"
        );
    }

    #[test]
    fn default_config_points_at_public_api() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert!(config.token.is_none());
        assert!(config.user_agent.starts_with("extracto/"));
    }
}
