//! Thin wrapper around the FediDB software listing.
//!
//! One listing request per `fetch`, or per `fetch_all` for the whole set; entries
//! are picked out client-side. No retries: a failed request fails the cycle.
use crate::StatsSource;
use crate::fedidb::types::SoftwareList;
use async_trait::async_trait;
use std::borrow::Cow;
use std::time::Duration;
use threadcount_common::{Result, ThreadcountError};
use threadcount_history::UserCount;
use threadcount_http::{HttpClient, RequestOpts};

pub const FEDIDB_ENDPOINT: &str = "https://api.fedidb.org/v1/";
const DEFAULT_LIMIT: u32 = 40;

#[derive(Clone, Debug)]
pub struct FediDbClient {
    http: HttpClient,
    limit: u32,
}

impl FediDbClient {
    pub fn new(endpoint: &str) -> Result<Self> {
        let http = HttpClient::new(endpoint)
            .map_err(|e| ThreadcountError::Config(format!("stats endpoint: {e}")))?;
        Ok(Self::with_http(http))
    }

    pub fn with_http(http: HttpClient) -> Self {
        Self {
            http,
            limit: DEFAULT_LIMIT,
        }
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.http = self.http.with_timeout(timeout);
        self
    }

    pub async fn list_software(&self) -> Result<SoftwareList> {
        let resp: SoftwareList = self
            .http
            .get_json(
                "software",
                RequestOpts {
                    query: Some(vec![("limit", Cow::Owned(self.limit.to_string()))]),
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| ThreadcountError::Fetch(e.to_string()))?;

        tracing::debug!(entries = resp.data.len(), "stats.fedidb.listing");
        Ok(resp)
    }
}

#[async_trait]
impl StatsSource for FediDbClient {
    async fn fetch(&self, software: &str) -> Result<UserCount> {
        tracing::info!(%software, "stats.fetch.start");
        let counts = self.list_software().await?.counts_for(software);
        tracing::info!(
            %software,
            total = counts.total,
            mau = counts.mau,
            "stats.fetch"
        );
        Ok(counts)
    }

    async fn fetch_all(&self, software: &[String]) -> Result<Vec<(String, UserCount)>> {
        let listing = self.list_software().await?;
        Ok(software
            .iter()
            .map(|name| {
                let counts = listing.counts_for(name);
                tracing::info!(
                    software = %name,
                    total = counts.total,
                    mau = counts.mau,
                    "stats.fetch"
                );
                (name.clone(), counts)
            })
            .collect())
    }
}
