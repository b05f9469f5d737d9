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

use crate::client::InverterReading;
use chrono::{DateTime, Utc};
use std::sync::{Arc, RwLock};

/// The last valid reading fetched from the inverter and when it was stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub reading: InverterReading,
    pub captured_at: DateTime<Utc>,
}

/// Holder for the most recent valid inverter reading, shared between the
/// acquisition loop and HTTP request handlers.
///
/// The store starts empty and is only ever replaced whole: readers observe
/// either the snapshot from before a replacement or the one after, never a
/// mix of the two. Cloning the store is cheap and clones share the same
/// underlying snapshot.
#[derive(Debug, Clone, Default)]
pub struct SnapshotStore {
    current: Arc<RwLock<Option<Snapshot>>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Default::default()
    }

    /// Return the current snapshot, or `None` if no valid reading has been
    /// stored since the process started.
    pub fn get(&self) -> Option<Snapshot> {
        self.current.read().unwrap().clone()
    }

    /// Replace the stored snapshot with the given reading, captured now.
    pub fn set(&self, reading: InverterReading) {
        let mut current = self.current.write().unwrap();
        *current = Some(Snapshot {
            reading,
            captured_at: Utc::now(),
        });
    }
}

#[cfg(test)]
mod test {
    use super::SnapshotStore;
    use crate::test::reading;

    #[test]
    fn test_store_starts_empty() {
        let store = SnapshotStore::new();
        assert!(store.get().is_none());
    }

    #[test]
    fn test_store_set_then_get() {
        let store = SnapshotStore::new();
        store.set(reading("X", 500.0));

        let snapshot = store.get().unwrap();
        assert_eq!(reading("X", 500.0), snapshot.reading);
    }

    #[test]
    fn test_store_replaced_whole() {
        let store = SnapshotStore::new();
        store.set(reading("X", 500.0));
        let first = store.get().unwrap();

        store.set(reading("Y", 750.0));
        let second = store.get().unwrap();

        assert_eq!("Y", second.reading.inverter.serial);
        assert_eq!(750.0, second.reading.power);
        assert!(second.captured_at >= first.captured_at);
    }

    #[test]
    fn test_store_clones_share_snapshot() {
        let store = SnapshotStore::new();
        let other = store.clone();
        store.set(reading("X", 500.0));

        assert_eq!(store.get(), other.get());
    }
}
