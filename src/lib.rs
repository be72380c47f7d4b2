//! Rule-driven heading classification and table of contents generation for EPUB books.
//!
//! A run scans the spine documents in reading order, classifies heading-like
//! elements with an ordered rule list, stamps a generated anchor on each match,
//! then writes `toc.ncx` and `toc.html` and registers both in the package.

pub mod config;
pub mod generator;
pub mod markup;
pub mod package;
pub mod toc;
pub mod utils;

pub use config::{Criteria, Rule, ZoneType};
pub use generator::{generate_toc, GenerationReport};
pub use package::{DocumentStore, EpubPackage};
pub use utils::error::{Result, TocError};
