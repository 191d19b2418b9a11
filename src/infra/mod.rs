pub mod cli_adapter;
pub mod config;

pub use cli_adapter::CliRuntimeAdapter;
pub use config::AppConfig;
