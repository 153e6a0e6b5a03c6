pub mod cli;
pub mod load_config;
pub mod logger;

pub use cli::{error_category, run, Cli};
