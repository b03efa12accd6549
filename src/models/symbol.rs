use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Ticker identifier as used in the dataset file names (e.g. `9501.T`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolInfo {
    pub symbol: Symbol,
    pub name: Option<String>,
}

/// The closed set of symbols this deployment serves, taken from configuration.
#[derive(Debug, Clone, Default)]
pub struct SymbolRegistry {
    symbols: Vec<SymbolInfo>,
}

impl SymbolRegistry {
    pub fn new(symbols: Vec<SymbolInfo>) -> Self {
        Self { symbols }
    }

    pub fn resolve(&self, raw: &str) -> Result<Symbol, AppError> {
        let wanted = raw.trim();
        self.symbols
            .iter()
            .find(|info| info.symbol.as_str().eq_ignore_ascii_case(wanted))
            .map(|info| info.symbol.clone())
            .ok_or_else(|| AppError::Validation(format!("Unknown symbol: {}", wanted)))
    }

    pub fn all(&self) -> &[SymbolInfo] {
        &self.symbols
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> SymbolRegistry {
        SymbolRegistry::new(vec![
            SymbolInfo { symbol: Symbol::new("9501.T"), name: Some("Tokyo Electric Power HD".into()) },
            SymbolInfo { symbol: Symbol::new("9502.T"), name: None },
        ])
    }

    #[test]
    fn test_resolve_accepts_configured_symbol() {
        let symbol = registry().resolve("9502.t").unwrap();
        assert_eq!(symbol.as_str(), "9502.T");
    }

    #[test]
    fn test_resolve_rejects_unknown_symbol() {
        let err = registry().resolve("7203.T").unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
