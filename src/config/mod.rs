mod types;
mod loader;
pub mod defaults;
mod validation;

pub use types::*;
pub use loader::{find_config_file, load_criteria, render_criteria, CONFIG_FILES};
pub use validation::validate_criteria;
