mod errors;
mod normalized;
mod raw;

pub use errors::{ConfigError, ConfigResult};
pub use normalized::IndexConfig;
pub use raw::RawIndexConfig;

/// Environment variable holding a JSON [`RawIndexConfig`].
pub const CONFIG_ENV: &str = "KINSHIP_CONFIG";
