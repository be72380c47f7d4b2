use std::fmt;

use crate::utils::error::{Result, TocError};

/// Outcome of one generation run
#[derive(Debug)]
pub struct GenerationReport {
    /// Why the run stopped early, if it did
    pub error: Option<TocError>,
    /// Headings numbered before the run finished or failed
    pub occurrences: usize,
}

impl GenerationReport {
    pub fn success(occurrences: usize) -> Self {
        Self {
            error: None,
            occurrences,
        }
    }

    pub fn failure(error: TocError, occurrences: usize) -> Self {
        Self {
            error: Some(error),
            occurrences,
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn into_result(self) -> Result<usize> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.occurrences),
        }
    }
}

impl fmt::Display for GenerationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error {
            Some(error) => write!(f, "failed after {} headings: {}", self.occurrences, error),
            None => write!(f, "{} headings", self.occurrences),
        }
    }
}
