pub mod loader;
pub mod schema;

pub use loader::{
    find_config_path, load_config, records_path, resolve_path, save_config, CONFIG_ENV,
};
pub use schema::{Config, DisplayConfig, RecordsConfig, SortConfig};
