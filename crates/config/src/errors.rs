use thiserror::Error;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Malformed index config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Environment variable `{name}` is not valid unicode.")]
    NotUnicode { name: &'static str },
}
