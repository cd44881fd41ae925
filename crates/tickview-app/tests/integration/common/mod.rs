//! Shared test collaborators and helpers.

pub mod mock_api;
pub mod mock_ws;

use std::time::Duration;
use tickview::SessionSnapshot;
use tokio::sync::watch;

/// Wait until a published snapshot satisfies `pred`, or panic after 5s.
pub async fn wait_for<F>(rx: &mut watch::Receiver<SessionSnapshot>, pred: F) -> SessionSnapshot
where
    F: Fn(&SessionSnapshot) -> bool,
{
    let waited = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            {
                let snapshot = rx.borrow_and_update();
                if pred(&snapshot) {
                    return snapshot.clone();
                }
            }
            rx.changed().await.expect("session closed while waiting");
        }
    })
    .await;

    waited.expect("timed out waiting for snapshot")
}
