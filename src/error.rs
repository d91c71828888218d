use thiserror::Error;

use crate::symbol::SymbolError;

#[derive(Debug, Error)]
pub enum Error {
    /// The scan configuration is unusable; nothing was scanned.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The symbol set could not be read completely.
    #[error("scan failed: {source}")]
    Scan {
        #[source]
        source: SymbolError,
    },
}

impl Error {
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration(reason.into())
    }

    pub fn scan(source: impl Into<SymbolError>) -> Self {
        Self::Scan {
            source: source.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
