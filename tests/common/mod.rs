#![allow(dead_code)]

use std::time::Duration;

use tokio::sync::mpsc;

use scriptmon::monitor::{MonitorOptions, OutputEvent};

pub use scriptmon_test_utils::builders::CatalogFixture;
pub use scriptmon_test_utils::fake_launcher::FakeLauncher;
pub use scriptmon_test_utils::{init_tracing, with_timeout};

/// Fast polling so tests don't wait on the production interval.
pub fn fast_options() -> MonitorOptions {
    MonitorOptions {
        poll_interval: Duration::from_millis(10),
        stop_grace: Duration::from_millis(100),
    }
}

/// Next event, failing the test after 5 seconds.
pub async fn next_event(rx: &mut mpsc::UnboundedReceiver<OutputEvent>) -> OutputEvent {
    with_timeout(rx.recv())
        .await
        .expect("event channel closed unexpectedly")
}

/// Assert that no event shows up within `wait`.
pub async fn assert_quiet(rx: &mut mpsc::UnboundedReceiver<OutputEvent>, wait: Duration) {
    if let Ok(Some(event)) = tokio::time::timeout(wait, rx.recv()).await {
        panic!("unexpected event: {event:?}");
    }
}
