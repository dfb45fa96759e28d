use std::sync::Once;

static INIT: Once = Once::new();

/// Routes tracing output through the test harness, once per process.
pub fn init_logging() {
	INIT.call_once(|| {
		let _ = tracing_subscriber::fmt()
			.with_max_level(tracing::Level::WARN)
			.with_test_writer()
			.try_init();
	});
}
