use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;

use crate::external::series_source::{SeriesKind, SeriesSource, SourceError};
use crate::models::Symbol;

/// Reads the CSV resources from a local directory laid out like the
/// published site (`data/price/...`, `data/indicators/...`).
pub struct FsSeriesSource {
    root: PathBuf,
}

impl FsSeriesSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl SeriesSource for FsSeriesSource {
    async fn fetch(&self, symbol: &Symbol, kind: SeriesKind) -> Result<String, SourceError> {
        let path = self.root.join(kind.relative_path(symbol));
        tokio::fs::read_to_string(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => SourceError::Missing(path.display().to_string()),
            _ => SourceError::Io {
                location: path.display().to_string(),
                message: e.to_string(),
            },
        })
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}
