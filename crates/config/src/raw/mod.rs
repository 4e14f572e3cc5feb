macro_rules! with_option {
    ($s: ident, $(($option: ident, $ty: ty)),* $(,)?) => {
        #[derive(Debug, Default, Clone, serde::Deserialize, serde::Serialize)]
        #[serde(rename_all = "camelCase", deny_unknown_fields)]
        pub struct $s {
            $(pub(super) $option: Option<$ty>,)*
        }
        impl $s {
            paste::paste! {
                $(
                    pub fn [<with_ $option>](mut self, $option: $ty) -> Self {
                        self.$option = Some($option);
                        self
                    }
                    pub fn [<with_ $option _if_none>](mut self, $option: $ty) -> Self {
                        if self.$option.is_none() {
                            self.$option = Some($option);
                        }
                        self
                    }
                    pub fn [<config_ $option>](mut self, f: impl FnOnce($ty) -> $ty) -> Self {
                        self.$option = match self.$option {
                            Some(c) => Some(f(c)),
                            None => Some(f(Default::default())),
                        };
                        self
                    }
                )*
            }
        }
    };
}

with_option!(
    RawIndexConfig,
    (sweep_interval, u32),
    (initial_capacity, usize),
);

impl RawIndexConfig {
    pub const DEFAULT_SWEEP_INTERVAL: u32 = 256;
    pub const DEFAULT_INITIAL_CAPACITY: usize = 64;

    pub fn normalize(self) -> super::IndexConfig {
        let sweep_interval = std::num::NonZeroU32::new(
            self.sweep_interval
                .unwrap_or(Self::DEFAULT_SWEEP_INTERVAL),
        );
        let initial_capacity = self
            .initial_capacity
            .unwrap_or(Self::DEFAULT_INITIAL_CAPACITY);
        super::IndexConfig {
            sweep_interval,
            initial_capacity,
        }
    }
}
