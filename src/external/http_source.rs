use async_trait::async_trait;
use tracing::debug;
use url::Url;

use crate::external::series_source::{SeriesKind, SeriesSource, SourceError};
use crate::models::Symbol;

/// Fetches the CSV resources over HTTP from a static file host.
pub struct HttpSeriesSource {
    client: reqwest::Client,
    base: Url,
}

impl HttpSeriesSource {
    pub fn new(base: Url) -> Self {
        // Url::join drops the last path segment unless it ends with '/'
        let base = if base.path().ends_with('/') {
            base
        } else {
            let mut with_slash = base.clone();
            with_slash.set_path(&format!("{}/", base.path()));
            with_slash
        };

        Self {
            client: reqwest::Client::new(),
            base,
        }
    }

    pub fn resource_url(&self, symbol: &Symbol, kind: SeriesKind) -> Result<Url, SourceError> {
        self.base
            .join(&kind.relative_path(symbol))
            .map_err(|e| SourceError::Network(e.to_string()))
    }
}

#[async_trait]
impl SeriesSource for HttpSeriesSource {
    async fn fetch(&self, symbol: &Symbol, kind: SeriesKind) -> Result<String, SourceError> {
        let url = self.resource_url(symbol, kind)?;
        debug!("GET {}", url);

        let resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
                location: url.to_string(),
            });
        }

        resp.text()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))
    }

    fn describe(&self) -> String {
        self.base.to_string()
    }
}
