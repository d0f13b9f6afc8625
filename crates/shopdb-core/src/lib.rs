pub mod app_config;
pub mod catalog;
pub mod config;
pub mod specs;
pub mod store;

pub use app_config::{AppConfig, Environment};
pub use catalog::{
    Category, ImportSummary, ItemError, NewImage, NewProduct, OwnerType, ScrapedCandidate,
    UNKNOWN_BRAND,
};
pub use config::{load_app_config, load_app_config_from_env};
pub use specs::SpecTable;
pub use store::{CatalogStore, CategoryLookup, ImageStore, StoreError};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
