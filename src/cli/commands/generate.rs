use std::path::{Path, PathBuf};

use log::info;

use epub_tocgen::config::{self, find_config_file, validate_criteria, Criteria};
use epub_tocgen::generator::generate_toc;
use epub_tocgen::package::EpubPackage;
use epub_tocgen::utils::error::Result;

pub fn handle_generate_command(
    book: &Path,
    config_path: Option<&Path>,
    output: Option<&Path>,
    tags: Option<&[String]>,
) -> Result<()> {
    let config_path = config_path
        .map(Path::to_path_buf)
        .or_else(|| default_config_location(book));
    if let Some(path) = &config_path {
        info!("Using rules from {}", path.display());
    }

    let mut criteria = config::load_criteria(config_path.as_deref())?;
    if let Some(tags) = tags {
        criteria.tags = tags
            .iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        restrict_rules_to_tags(&mut criteria);
        validate_criteria(&criteria)?;
    }

    let mut package = EpubPackage::open(book)?;
    let report = generate_toc(&mut package, &criteria);
    let occurrences = report.into_result()?;

    if occurrences == 0 {
        println!("No headings matched; {} was not changed", book.display());
        return Ok(());
    }

    let target = output.unwrap_or(book);
    package.save(target)?;
    println!("{} headings found, table of contents written to {}", occurrences, target.display());
    Ok(())
}

/// Drop the rules that can no longer match under a narrowed tag list
fn restrict_rules_to_tags(criteria: &mut Criteria) {
    let tags = criteria.tags.clone();
    let scanned = |name: &str| name.is_empty() || tags.is_empty() || tags.iter().any(|t| t == name);
    let before = criteria.rules.len();
    criteria
        .rules
        .retain(|rule| scanned(rule.element.trim()) && scanned(rule.child_element.trim()));
    if criteria.rules.len() < before {
        info!(
            "{} rules skipped: their elements are not in --tags",
            before - criteria.rules.len()
        );
    }
}

/// A `tocgen.*` file inside an unpacked book or next to an archive
fn default_config_location(book: &Path) -> Option<PathBuf> {
    if book.is_dir() {
        if let Some(found) = find_config_file(book) {
            return Some(found);
        }
    }
    book.parent()
        .map(|dir| if dir.as_os_str().is_empty() { Path::new(".") } else { dir })
        .and_then(find_config_file)
}
