use log::warn;

use crate::config::types::Criteria;
use crate::toc::compile_text_pattern;
use crate::utils::error::{Result, TocError};

/// Validate generation criteria before a run
pub fn validate_criteria(criteria: &Criteria) -> Result<()> {
    validate_rules(criteria)?;
    validate_style(criteria)?;
    Ok(())
}

/// Every rule needs a level, an element from the scanned tag set and a valid pattern
fn validate_rules(criteria: &Criteria) -> Result<()> {
    for (idx, rule) in criteria.rules.iter().enumerate() {
        let row = idx + 1;

        if rule.level == 0 {
            return Err(TocError::Config(format!("rule {}: level must be 1 or higher", row)));
        }

        let element = rule.element.trim();
        if element.is_empty() {
            return Err(TocError::Config(format!("rule {}: element must not be empty", row)));
        }

        if !criteria.scans_tag(element) {
            return Err(TocError::Config(format!(
                "rule {}: element '{}' is not in the scanned tags",
                row, element
            )));
        }

        let child = rule.child_element.trim();
        if !child.is_empty() && !criteria.tags.is_empty() && !criteria.tags.iter().any(|t| t == child) {
            return Err(TocError::Config(format!(
                "rule {}: child element '{}' is not in the scanned tags",
                row, child
            )));
        }

        let pattern = compile_text_pattern(&rule.text_pattern, rule.case_insensitive).map_err(|e| {
            TocError::Config(format!("rule {}: invalid text pattern '{}': {}", row, rule.text_pattern, e))
        })?;

        // Group 0 is the whole match
        if rule.level == 1 && pattern.captures_len() < 2 {
            warn!(
                "rule {}: pattern '{}' has no capture group, {{num}} will be empty",
                row, rule.text_pattern
            );
        }
    }

    Ok(())
}

/// Style keys are heading levels
fn validate_style(criteria: &Criteria) -> Result<()> {
    for level in criteria.style.keys() {
        if level.trim().parse::<usize>().is_err() {
            return Err(TocError::Config(format!(
                "style key '{}' is not a heading level",
                level
            )));
        }
    }
    Ok(())
}
