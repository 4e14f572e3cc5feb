use std::num::NonZeroU32;

use crate::errors::{ConfigError, ConfigResult};
use crate::raw::RawIndexConfig;

macro_rules! normalized_option {
    ($s: ident, $(($option: ident, $ty: ty)),* $(,)?) => {
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $s {
            $(pub(super) $option: $ty,)*
        }
        impl $s {
            $(pub fn $option(&self) -> & $ty {
                &self.$option
            })*
        }
    };
}

normalized_option!(
    IndexConfig,
    // `None` disables automatic sweep passes.
    (sweep_interval, Option<NonZeroU32>),
    (initial_capacity, usize),
);

impl Default for IndexConfig {
    fn default() -> Self {
        RawIndexConfig::default().normalize()
    }
}

impl IndexConfig {
    pub fn from_json(input: &str) -> ConfigResult<Self> {
        let raw: RawIndexConfig = serde_json::from_str(input)?;
        Ok(raw.normalize())
    }

    /// Reads [`crate::CONFIG_ENV`]. Returns the default config when the
    /// variable is unset.
    pub fn from_env() -> ConfigResult<Self> {
        match std::env::var(crate::CONFIG_ENV) {
            Ok(input) => Self::from_json(&input),
            Err(std::env::VarError::NotPresent) => Ok(Self::default()),
            Err(std::env::VarError::NotUnicode(_)) => Err(ConfigError::NotUnicode {
                name: crate::CONFIG_ENV,
            }),
        }
    }

    #[inline(always)]
    pub const fn auto_sweep(&self) -> bool {
        self.sweep_interval.is_some()
    }
}
