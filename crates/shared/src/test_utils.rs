//! Test Utilities
//!
//! Common test utilities shared across test modules to provide consistent
//! testing infrastructure.

use std::sync::Once;

static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests
///
/// Safe to call from every test; only the first call installs the
/// subscriber. Test output is filtered at DEBUG so swallowed configuration
/// warnings stay visible when a test fails.
pub fn init_test_logging() {
    INIT_LOGGING.call_once(|| {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .finish();
        // A subscriber installed by the harness already is fine
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init_test_logging();
        init_test_logging();
    }
}
