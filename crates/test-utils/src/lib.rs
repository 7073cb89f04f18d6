pub mod builders;
pub mod scripted;

use std::sync::Once;
use tracing_subscriber::{EnvFilter, fmt};

static INIT: Once = Once::new();

/// Filter used when neither `SEARCHTRACE_LOG` nor `RUST_LOG` is set.
/// Per-notification tap output is at `trace`, so keep tests quiet by default.
const DEFAULT_TEST_FILTER: &str = "warn,searchtrace=info";

/// Install a test-writer subscriber once per test binary.
///
/// `SEARCHTRACE_LOG` wins over `RUST_LOG`, mirroring the binary, e.g.
/// `SEARCHTRACE_LOG=searchtrace::trace=trace cargo test --test scenarios`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env("SEARCHTRACE_LOG")
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_TEST_FILTER));

        // try_init: a test may already have installed its own subscriber.
        let _ = fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(false)
            .compact()
            .try_init();
    });
}
