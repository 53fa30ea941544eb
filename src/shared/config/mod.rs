pub mod global;
pub mod model;

pub use global::CONFIG;
pub use model::{
    EngineConfig, LoggingConfig, MigrationsConfig, RetryConfig, Settings, StoreConfig,
    load_settings, load_settings_from,
};
