pub mod app;
pub mod backend;
pub mod session;

pub use app::AppConfig;
pub use backend::BackendConfig;
pub use session::{
    validate_production_config, ConfigError, Environment, SessionConfig, SessionLayer,
    SessionSecret,
};
