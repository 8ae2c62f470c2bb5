//! Tracing setup for batch runs.
//!
//! Safe to call multiple times - only the first call has effect. Library
//! crates emit through `tracing` macros; embedders that bring their own
//! subscriber simply skip this.

use std::sync::OnceLock;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

static INIT: OnceLock<()> = OnceLock::new();

/// Initializes the default subscriber with an env-filtered format layer.
///
/// `RUST_LOG` overrides the defaults; without it the runner logs at `info`
/// and the computing crates at `warn`.
pub fn init() {
    INIT.get_or_init(|| {
        let filter = EnvFilter::builder()
            .with_default_directive("icqa_runner=info".parse().expect("static directive"))
            .from_env_lossy()
            .add_directive("icqa_engine=warn".parse().expect("static directive"))
            .add_directive("icqa_provenance=warn".parse().expect("static directive"));

        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init();
        init();
    }
}
