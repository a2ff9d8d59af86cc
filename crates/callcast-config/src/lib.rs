//! callcast configuration: the config model plus layered JSON5 loading.

mod error;
mod loader;
mod model;

pub use error::ConfigError;
pub use loader::{
    CONFIG_FILE_NAME, ConfigLayer, ConfigLayerSource, LayeredConfig, LayeredConfigOptions,
};
pub use model::*;
