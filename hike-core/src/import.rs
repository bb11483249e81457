use reqwest::Client;
use serde_json::Value;
use std::{convert::Infallible, fmt, path::PathBuf, str::FromStr, time::Duration};

use crate::{error::ImportError, model::HikingDay};

/// Request timeout for bundle downloads.
pub const IMPORT_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for bundle downloads.
pub fn http_client(timeout: Duration) -> Result<Client, ImportError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ImportError::Fetch {
            source_name: "import client".to_string(),
            reason: e.to_string(),
        })
}

/// Where a `{ "hikingDays": [...] }` bundle is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportSource {
    Url(String),
    File(PathBuf),
}

impl FromStr for ImportSource {
    type Err = Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        if value.starts_with("http://") || value.starts_with("https://") {
            Ok(ImportSource::Url(value.to_string()))
        } else {
            Ok(ImportSource::File(PathBuf::from(value)))
        }
    }
}

impl fmt::Display for ImportSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportSource::Url(url) => f.write_str(url),
            ImportSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

impl ImportSource {
    /// Fetch the bundle and return its entries, dates at noon and ids recomputed.
    pub async fn load(&self, http: &Client) -> Result<Vec<HikingDay>, ImportError> {
        let text = self.fetch(http).await?;
        parse_bundle(&self.to_string(), &text)
    }

    async fn fetch(&self, http: &Client) -> Result<String, ImportError> {
        let fetch_err = |reason: String| ImportError::Fetch {
            source_name: self.to_string(),
            reason,
        };

        match self {
            ImportSource::Url(url) => {
                let res = http
                    .get(url)
                    .send()
                    .await
                    .map_err(|e| fetch_err(e.to_string()))?;
                let status = res.status();
                if !status.is_success() {
                    return Err(fetch_err(format!("status {status}")));
                }
                res.text().await.map_err(|e| fetch_err(e.to_string()))
            }
            ImportSource::File(path) => tokio::fs::read_to_string(path)
                .await
                .map_err(|e| fetch_err(e.to_string())),
        }
    }
}

/// Parse a bundle body. Anything but an object with a `hikingDays` array of
/// well-formed entries is an [`ImportError::InvalidFormat`].
pub fn parse_bundle(source_name: &str, text: &str) -> Result<Vec<HikingDay>, ImportError> {
    let invalid = |reason: String| ImportError::InvalidFormat {
        source_name: source_name.to_string(),
        reason,
    };

    let mut value: Value = serde_json::from_str(text).map_err(|e| invalid(e.to_string()))?;
    let entries = match value.get_mut("hikingDays").map(Value::take) {
        Some(entries @ Value::Array(_)) => entries,
        _ => return Err(invalid("expected a `hikingDays` array".to_string())),
    };

    let days: Vec<HikingDay> =
        serde_json::from_value(entries).map_err(|e| invalid(e.to_string()))?;

    Ok(days.into_iter().map(HikingDay::normalized).collect())
}
