use std::sync::Once;

static INIT: Once = Once::new();

/// Quiet tracing for integration runs; warnings still come through.
pub fn init_test_env() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::new("warn"))
            .try_init();
    });
}
