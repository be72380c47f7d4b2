use std::io;

use thiserror::Error;

/// Common result type for TOC generation operations
pub type Result<T> = std::result::Result<T, TocError>;

/// Error types for TOC generation
#[derive(Debug, Error)]
pub enum TocError {
    /// IO error wrapper
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A rule or attribute pattern failed to compile
    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),

    /// Markup could not be parsed or written
    #[error("Markup error: {0}")]
    Markup(String),

    /// The package is missing a required container (OPF, manifest, spine)
    #[error("Package structure error: {0}")]
    Structure(String),

    /// EPUB archive error
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Generic error message
    #[error("{0}")]
    Generic(String),
}

impl From<quick_xml::Error> for TocError {
    fn from(err: quick_xml::Error) -> Self {
        TocError::Markup(err.to_string())
    }
}

impl From<std::string::FromUtf8Error> for TocError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        TocError::Markup(format!("invalid UTF-8: {}", err))
    }
}

impl From<String> for TocError {
    fn from(msg: String) -> Self {
        TocError::Generic(msg)
    }
}

impl From<&str> for TocError {
    fn from(msg: &str) -> Self {
        TocError::Generic(msg.to_string())
    }
}
