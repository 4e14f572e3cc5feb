use std::env;
use std::sync::Once;

use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;

pub const LOG_ENV: &str = "KINSHIP_LOG";

struct LoggerConfig {
    filter: Option<String>,
}

impl LoggerConfig {
    fn from_env() -> Self {
        let filter = env::var(LOG_ENV).ok().filter(|f| !f.trim().is_empty());
        Self { filter }
    }
}

/// Installs a hierarchical stderr subscriber filtered by `KINSHIP_LOG`.
///
/// Does nothing when the variable is unset. Only the first call in a
/// process has any effect.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let cfg = LoggerConfig::from_env();
        let Some(filter) = cfg.filter else {
            return;
        };
        let layer = tracing_tree::HierarchicalLayer::default()
            .with_indent_amount(2)
            .with_targets(true)
            .with_writer(std::io::stderr);
        let subscribe = tracing_subscriber::Registry::default()
            .with(EnvFilter::new(filter))
            .with(layer);
        // the host may already own the global subscriber
        let _ = tracing::subscriber::set_global_default(subscribe);
    });
}
