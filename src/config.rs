use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use url::Url;

use crate::errors::AppError;
use crate::external::fs_source::FsSeriesSource;
use crate::external::http_source::HttpSeriesSource;
use crate::external::series_source::SeriesSource;
use crate::models::{Symbol, SymbolInfo, SymbolRegistry};
use crate::render::Layout;

const DEFAULT_SYMBOLS: &str = "9501.T=東京電力HD,9502.T=中部電力";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
// 07:00 JST, shortly after the pipeline publishes the day's files
const DEFAULT_REFRESH_CRON: &str = "0 0 22 * * *";

/// Where the CSV resources live.
#[derive(Debug, Clone, PartialEq)]
pub enum DataBase {
    Url(Url),
    Dir(PathBuf),
}

impl DataBase {
    /// `http(s)://` bases are fetched over HTTP; anything else is a directory.
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let raw = raw.trim();
        if raw.starts_with("http://") || raw.starts_with("https://") {
            Url::parse(raw)
                .map(DataBase::Url)
                .map_err(|e| AppError::Config(format!("DATA_BASE is not a valid URL: {}", e)))
        } else if raw.is_empty() {
            Err(AppError::Config("DATA_BASE is empty".to_string()))
        } else {
            Ok(DataBase::Dir(PathBuf::from(raw)))
        }
    }

    pub fn source(&self) -> Arc<dyn SeriesSource> {
        match self {
            DataBase::Url(url) => Arc::new(HttpSeriesSource::new(url.clone())),
            DataBase::Dir(dir) => Arc::new(FsSeriesSource::new(dir.clone())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_base: DataBase,
    pub symbols: Vec<SymbolInfo>,
    pub default_symbol: Symbol,
    pub bind_addr: SocketAddr,
    pub fetch_timeout: Option<Duration>,
    pub refresh_cron: String,
    pub chart_width: f64,
    pub chart_height: f64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_base = DataBase::parse(&lookup("DATA_BASE").unwrap_or_else(|| ".".to_string()))?;
        let symbols = parse_symbols(&lookup("SYMBOLS").unwrap_or_else(|| DEFAULT_SYMBOLS.to_string()))?;

        let registry = SymbolRegistry::new(symbols.clone());
        let default_symbol = match lookup("DEFAULT_SYMBOL") {
            Some(raw) => registry
                .resolve(&raw)
                .map_err(|_| AppError::Config(format!("DEFAULT_SYMBOL {} is not listed in SYMBOLS", raw.trim())))?,
            None => symbols[0].symbol.clone(),
        };

        let bind_addr = lookup("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| AppError::Config(format!("BIND_ADDR is invalid: {}", e)))?;

        let fetch_timeout = match lookup("FETCH_TIMEOUT_SECS") {
            Some(raw) => {
                let secs = raw
                    .trim()
                    .parse::<u64>()
                    .map_err(|e| AppError::Config(format!("FETCH_TIMEOUT_SECS is invalid: {}", e)))?;
                (secs > 0).then(|| Duration::from_secs(secs))
            }
            None => None,
        };

        let chart_width = parse_dimension(&lookup, "CHART_WIDTH", 1200.0)?;
        let chart_height = parse_dimension(&lookup, "CHART_HEIGHT", 500.0)?;

        Ok(Self {
            data_base,
            symbols,
            default_symbol,
            bind_addr,
            fetch_timeout,
            refresh_cron: lookup("REFRESH_CRON").unwrap_or_else(|| DEFAULT_REFRESH_CRON.to_string()),
            chart_width,
            chart_height,
        })
    }

    pub fn symbol_registry(&self) -> SymbolRegistry {
        SymbolRegistry::new(self.symbols.clone())
    }

    pub fn layout(&self) -> Layout {
        Layout::sized(self.chart_width, self.chart_height)
    }

    pub fn log_summary(&self) {
        info!("⚙️  Data base: {:?}", self.data_base);
        info!(
            "⚙️  Symbols: {} (default {})",
            self.symbols.iter().map(|s| s.symbol.as_str()).collect::<Vec<_>>().join(", "),
            self.default_symbol
        );
        match self.fetch_timeout {
            Some(timeout) => info!("⚙️  Fetch timeout: {}s", timeout.as_secs()),
            None => info!("⚙️  Fetch timeout: none"),
        }
    }
}

/// `SYM[=Display name],SYM[=Display name],...`
fn parse_symbols(raw: &str) -> Result<Vec<SymbolInfo>, AppError> {
    let mut symbols: Vec<SymbolInfo> = Vec::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (symbol, name) = match entry.split_once('=') {
            Some((symbol, name)) => (symbol.trim(), Some(name.trim().to_string()).filter(|n| !n.is_empty())),
            None => (entry, None),
        };
        if symbol.is_empty() {
            return Err(AppError::Config(format!("SYMBOLS entry '{}' has no symbol", entry)));
        }
        if symbols.iter().any(|s| s.symbol.as_str().eq_ignore_ascii_case(symbol)) {
            return Err(AppError::Config(format!("SYMBOLS lists {} twice", symbol)));
        }
        symbols.push(SymbolInfo {
            symbol: Symbol::new(symbol),
            name,
        });
    }

    if symbols.is_empty() {
        return Err(AppError::Config("SYMBOLS is empty".to_string()));
    }
    Ok(symbols)
}

fn parse_dimension<F>(lookup: &F, key: &str, default: f64) -> Result<f64, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => match raw.trim().parse::<f64>() {
            Ok(value) if value.is_finite() && value > 0.0 => Ok(value),
            _ => Err(AppError::Config(format!("{} must be a positive number, got '{}'", key, raw))),
        },
        None => Ok(default),
    }
}
