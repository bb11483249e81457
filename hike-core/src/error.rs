use thiserror::Error;

/// Failures of the geocoding / forecast provider.
#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("OpenWeather API key not configured.\nHint: run `hike configure` or set OPENWEATHER_API_KEY.")]
    MissingApiKey,

    #[error("Failed to reach {endpoint}: {source}")]
    Http {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} request failed with status {status}: {body}")]
    Status {
        endpoint: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Failed to parse {endpoint} JSON: {source}")]
    Parse {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Failures of the local key-value store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage I/O error on key '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize stored data: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Failures while loading an import bundle.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Unable to load import source '{source_name}': {reason}")]
    Fetch { source_name: String, reason: String },

    #[error("Invalid data format in '{source_name}': {reason}")]
    InvalidFormat { source_name: String, reason: String },
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}
