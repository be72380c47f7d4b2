mod config;
mod generate;

pub use config::handle_config_command;
pub use generate::handle_generate_command;
