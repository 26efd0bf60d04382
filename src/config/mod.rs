//! エンジン設定
mod loader;
mod manager;
mod types;

pub use manager::ConfigManager;
pub use types::{
    BroadcastConfig,
    ConfigError,
    EngineSettings,
    ValidationError,
    WatcherConfig,
};
