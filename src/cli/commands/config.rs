use std::path::Path;

use epub_tocgen::config::{self, render_criteria, Criteria};
use epub_tocgen::utils::error::Result;

use crate::cli::types::ConfigFormat;

pub fn handle_config_command(validate: Option<&Path>, format: ConfigFormat) -> Result<()> {
    match validate {
        Some(path) => {
            let criteria = config::load_criteria(Some(path))?;
            println!("{} is valid", path.display());
            for rule in &criteria.rules {
                if rule.description.is_empty() {
                    println!("  level {}: {}", rule.level, rule.summary());
                } else {
                    println!("  level {}: {} ({})", rule.level, rule.summary(), rule.description);
                }
            }
        }
        None => {
            println!("{}", render_criteria(&Criteria::default(), format.as_str())?);
        }
    }
    Ok(())
}
