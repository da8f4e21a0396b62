//! Catalog fetching (Jikan / MyAnimeList).
//!
//! Each pass issues one GET per configured endpoint, extracts the result array
//! and caps it. A failing endpoint only loses its own contribution; the pass
//! never aborts because of a single endpoint.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::{config::Config, Error, Result};

/// One catalog endpoint polled on every pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoint {
    pub name: String,
    pub url: String,
    /// Name of the top-level array holding the entries.
    pub result_key: String,
}

impl Endpoint {
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        result_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            result_key: result_key.into(),
        }
    }

    /// The two lists polled by the hosted bot: current season and top airing.
    pub fn defaults(base_url: &str) -> Vec<Self> {
        let base = base_url.trim_end_matches('/');
        vec![
            Self::new("Current Season", format!("{base}/seasons/now"), "data"),
            Self::new(
                "Currently Airing",
                format!("{base}/top/anime?filter=airing&limit=25"),
                "data",
            ),
        ]
    }
}

/// A catalog item as returned by the API, with every field optional.
///
/// Extraction is best-effort: wrong types are treated the same as missing
/// fields.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawEntry {
    pub mal_id: Option<i64>,
    pub title: Option<String>,
    pub title_english: Option<String>,
    pub score: Option<f64>,
    pub status: Option<String>,
    pub episodes: Option<u32>,
    pub aired_from: Option<String>,
    pub url: Option<String>,
    pub image_url: Option<String>,
    pub synopsis: Option<String>,
}

impl RawEntry {
    /// Extract an entry from one element of the result array.
    ///
    /// Returns `None` for elements that are not JSON objects.
    pub fn from_json(v: &Value) -> Option<Self> {
        let obj = v.as_object()?;
        let str_field = |key: &str| obj.get(key).and_then(Value::as_str).map(str::to_string);

        Some(Self {
            mal_id: obj.get("mal_id").and_then(Value::as_i64),
            title: str_field("title"),
            title_english: str_field("title_english"),
            score: obj.get("score").and_then(Value::as_f64),
            status: str_field("status"),
            episodes: obj
                .get("episodes")
                .and_then(Value::as_u64)
                .and_then(|n| u32::try_from(n).ok()),
            aired_from: v
                .pointer("/aired/from")
                .and_then(Value::as_str)
                .map(str::to_string),
            url: str_field("url"),
            image_url: v
                .pointer("/images/jpg/image_url")
                .and_then(Value::as_str)
                .filter(|s| !s.trim().is_empty())
                .map(str::to_string),
            synopsis: str_field("synopsis"),
        })
    }
}

/// Extract and cap the entry list at `result_key` from a response document.
///
/// A missing key or a non-array value yields an empty list.
pub fn extract_entries(doc: &Value, result_key: &str, limit: usize) -> Vec<RawEntry> {
    let Some(items) = doc.get(result_key).and_then(Value::as_array) else {
        return Vec::new();
    };

    items
        .iter()
        .take(limit)
        .filter_map(|item| {
            let parsed = RawEntry::from_json(item);
            if parsed.is_none() {
                debug!("skipping non-object catalog element");
            }
            parsed
        })
        .collect()
}

/// Anything that can produce one raw batch per pass.
///
/// The HTTP implementation never fails as a whole; the `Result` lets other
/// sources (and tests) surface pass-level failures to the poll loop.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<RawEntry>>;
}

#[derive(Clone, Copy, Debug)]
pub struct FetchSettings {
    pub timeout: Duration,
    /// Delay between two endpoint requests (upstream rate limit).
    pub spacing: Duration,
    pub per_endpoint_limit: usize,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            spacing: Duration::from_secs(1),
            per_endpoint_limit: 10,
        }
    }
}

impl From<&Config> for FetchSettings {
    fn from(cfg: &Config) -> Self {
        Self {
            timeout: cfg.request_timeout,
            spacing: cfg.request_spacing,
            per_endpoint_limit: cfg.per_endpoint_limit,
        }
    }
}

/// HTTP catalog client over a fixed list of endpoints.
#[derive(Clone, Debug)]
pub struct HttpCatalog {
    http: reqwest::Client,
    endpoints: Vec<Endpoint>,
    settings: FetchSettings,
}

impl HttpCatalog {
    pub fn new(endpoints: Vec<Endpoint>, settings: FetchSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .user_agent(concat!("anitrack/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            endpoints,
            settings,
        })
    }

    async fn fetch_endpoint(&self, endpoint: &Endpoint) -> Result<Vec<RawEntry>> {
        info!(endpoint = %endpoint.name, url = %endpoint.url, "fetching catalog");

        let resp = self
            .http
            .get(&endpoint.url)
            .send()
            .await
            .map_err(|e| classify(endpoint, e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Status {
                endpoint: endpoint.name.clone(),
                status: status.as_u16(),
            });
        }

        let doc: Value = resp.json().await.map_err(|e| classify(endpoint, e))?;
        let entries = extract_entries(&doc, &endpoint.result_key, self.settings.per_endpoint_limit);
        if entries.is_empty() {
            warn!(endpoint = %endpoint.name, "no entries in response");
        }
        Ok(entries)
    }
}

fn classify(endpoint: &Endpoint, e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout {
            endpoint: endpoint.name.clone(),
        }
    } else {
        Error::Http(e)
    }
}

#[async_trait]
impl CatalogSource for HttpCatalog {
    async fn fetch(&self) -> Result<Vec<RawEntry>> {
        let mut out = Vec::new();

        for (idx, endpoint) in self.endpoints.iter().enumerate() {
            if idx > 0 && !self.settings.spacing.is_zero() {
                sleep(self.settings.spacing).await;
            }

            match self.fetch_endpoint(endpoint).await {
                Ok(entries) => {
                    debug!(endpoint = %endpoint.name, count = entries.len(), "fetched");
                    out.extend(entries);
                }
                Err(e) => warn!(endpoint = %endpoint.name, "skipping endpoint: {e}"),
            }
        }

        Ok(out)
    }
}
