use crate::NewsClient;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::interval;

/// Keep-warm loop: on every tick, force-refresh every key resident in the
/// cache regardless of freshness. Runs for the lifetime of the process;
/// per-key failures never stop the loop.
pub fn spawn_refresher(client: NewsClient, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        // tokio intervals fire immediately; skip that first tick
        ticker.tick().await;
        loop {
            ticker.tick().await;
            client.refresh_resident().await;
        }
    })
}
