// =============================================================================
// CN DASHBOARD — snapshot.rs
// Imported statistics snapshot and the shared store that hands it out
// =============================================================================

use crate::nation::{Nation, War, WarCounts};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;

pub const DEFAULT_SNAPSHOT_TTL_SECS: u64 = 3600;

#[derive(Debug, Clone)]
pub struct Snapshot {
    pub nations: Vec<Nation>,
    pub wars: Vec<War>,
    pub loaded_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(nations: Vec<Nation>, wars: Vec<War>) -> Self {
        Snapshot { nations, wars, loaded_at: Utc::now() }
    }

    pub fn alliance_nations(&self, alliance_id: u64) -> Vec<&Nation> {
        self.nations
            .iter()
            .filter(|n| n.alliance_id == alliance_id)
            .collect()
    }

    pub fn war_counts(&self) -> WarCounts {
        WarCounts::from_wars(&self.wars)
    }

    pub fn active_war_count(&self) -> usize {
        self.wars.iter().filter(|w| w.is_active()).count()
    }
}

// -----------------------------------------------------------------------------
// SnapshotStore — one current snapshot, swapped whole on reload
// -----------------------------------------------------------------------------

pub struct SnapshotStore {
    current: RwLock<Option<Arc<Snapshot>>>,
    ttl_secs: u64,
}

impl SnapshotStore {
    pub fn new(ttl_secs: u64) -> Self {
        SnapshotStore { current: RwLock::new(None), ttl_secs }
    }

    pub async fn replace(&self, snapshot: Snapshot) {
        let mut guard = self.current.write().await;
        *guard = Some(Arc::new(snapshot));
    }

    pub async fn current(&self) -> Option<Arc<Snapshot>> {
        self.current.read().await.clone()
    }

    pub async fn age_secs(&self, now: DateTime<Utc>) -> Option<u64> {
        self.current()
            .await
            .map(|s| (now - s.loaded_at).num_seconds().max(0) as u64)
    }

    /// Missing snapshots count as stale.
    pub async fn is_stale(&self, now: DateTime<Utc>) -> bool {
        match self.age_secs(now).await {
            Some(age) => age >= self.ttl_secs,
            None => true,
        }
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }
}
