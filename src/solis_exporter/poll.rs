// Solis Exporter - Prometheus metrics exporter for Solis solar inverters
//
// Copyright 2023 Nick Pillitteri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//

use crate::client::FetchReading;
use crate::snapshot::SnapshotStore;
use std::time::Duration;
use tokio::time::{self, MissedTickBehavior};
use tracing::{event, Level};

/// Periodically fetch readings from the inverter and replace the cached
/// snapshot with each valid one.
///
/// Failures never propagate out of the poller: a failed fetch or a reading
/// without an inverter serial is logged and the previous snapshot is kept,
/// so HTTP clients keep seeing the last good data.
pub struct Poller<F> {
    client: F,
    store: SnapshotStore,
}

impl<F> Poller<F>
where
    F: FetchReading,
{
    pub fn new(client: F, store: SnapshotStore) -> Self {
        Poller { client, store }
    }

    /// Run a single acquisition tick: fetch one reading and store it if valid.
    pub async fn poll(&self) {
        match self.client.fetch().await {
            Ok(reading) if reading.is_valid() => {
                self.store.set(reading);
                event!(Level::DEBUG, message = "snapshot updated from inverter reading");
            }
            Ok(reading) => {
                event!(
                    Level::WARN,
                    message = "discarding reading without an inverter serial",
                    reading = ?reading,
                );
            }
            Err(e) => {
                event!(
                    Level::ERROR,
                    message = "unable to fetch reading from inverter",
                    kind = e.kind().as_label(),
                    error = %e,
                );
            }
        }
    }

    /// Fetch a reading immediately and then once per `period`, forever.
    ///
    /// Fetches never overlap: each one is awaited before the next tick is
    /// taken, and ticks that come due while a fetch is still in flight are
    /// skipped rather than queued.
    pub async fn run(&self, period: Duration) {
        let mut interval = time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            let _ = interval.tick().await;
            self.poll().await;
        }
    }
}

#[cfg(test)]
mod test {
    use super::Poller;
    use crate::snapshot::SnapshotStore;
    use crate::test::{reading, FailingFetcher, FixedFetcher};

    #[tokio::test]
    async fn test_poll_valid_reading_stored() {
        let store = SnapshotStore::new();
        let poller = Poller::new(
            FixedFetcher {
                reading: reading("X", 500.0),
            },
            store.clone(),
        );

        poller.poll().await;

        let snapshot = store.get().unwrap();
        assert_eq!(reading("X", 500.0), snapshot.reading);
    }

    #[tokio::test]
    async fn test_poll_fetch_error_store_empty() {
        let store = SnapshotStore::new();
        let poller = Poller::new(FailingFetcher, store.clone());

        poller.poll().await;

        assert!(store.get().is_none());
    }

    #[tokio::test]
    async fn test_poll_fetch_error_keeps_previous_snapshot() {
        let store = SnapshotStore::new();
        store.set(reading("X", 500.0));
        let before = store.get().unwrap();

        let poller = Poller::new(FailingFetcher, store.clone());
        poller.poll().await;

        assert_eq!(before, store.get().unwrap());
    }

    #[tokio::test]
    async fn test_poll_invalid_reading_store_empty() {
        let store = SnapshotStore::new();
        let poller = Poller::new(
            FixedFetcher {
                reading: reading("", 500.0),
            },
            store.clone(),
        );

        poller.poll().await;

        assert!(store.get().is_none());
    }

    #[tokio::test]
    async fn test_poll_invalid_reading_keeps_previous_snapshot() {
        let store = SnapshotStore::new();
        store.set(reading("X", 500.0));
        let before = store.get().unwrap();

        let poller = Poller::new(
            FixedFetcher {
                reading: reading("", 750.0),
            },
            store.clone(),
        );
        poller.poll().await;

        // Neither the reading nor its capture time may move on a discard
        assert_eq!(before, store.get().unwrap());
    }
}
