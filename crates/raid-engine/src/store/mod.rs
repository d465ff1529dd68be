//! Raid store
//!
//! Active raids keyed `space -> sub-space -> message`, each level a `DashMap`.
//! The maps only guard their own structure; a raid's contents are guarded by the
//! async mutex inside its [`RaidSlot`].

use std::cmp::Reverse;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use raid_core::{RaidRecord, Snowflake};
use tokio::sync::{Mutex, MutexGuard};

/// Full address of a raid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RaidKey {
    pub space_id: Snowflake,
    pub sub_space_id: Snowflake,
    pub message_id: Snowflake,
}

impl RaidKey {
    pub fn new(space_id: Snowflake, sub_space_id: Snowflake, message_id: Snowflake) -> Self {
        Self {
            space_id,
            sub_space_id,
            message_id,
        }
    }
}

impl fmt::Display for RaidKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.space_id, self.sub_space_id, self.message_id)
    }
}

/// A stored raid and the lock serialising every change to it
pub struct RaidSlot {
    key: RaidKey,
    created_at: DateTime<Utc>,
    record: Mutex<RaidRecord>,
}

impl RaidSlot {
    fn new(key: RaidKey, record: RaidRecord) -> Self {
        Self {
            key,
            created_at: record.created_at(),
            record: Mutex::new(record),
        }
    }

    #[inline]
    pub fn key(&self) -> RaidKey {
        self.key
    }

    /// Creation instant, readable without taking the lock
    #[inline]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Wait for exclusive access; waiters are served in the order they arrived
    pub async fn lock(&self) -> MutexGuard<'_, RaidRecord> {
        self.record.lock().await
    }
}

impl fmt::Debug for RaidSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RaidSlot")
            .field("key", &self.key)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

type MessageMap = DashMap<Snowflake, Arc<RaidSlot>>;
type SubSpaceMap = DashMap<Snowflake, Arc<MessageMap>>;

/// Concurrent three-level map of active raids
///
/// Intermediate levels are created on demand and never pruned: dropping an empty
/// level could race with a concurrent `put` into it.
#[derive(Default)]
pub struct RaidStore {
    spaces: DashMap<Snowflake, Arc<SubSpaceMap>>,
}

impl RaidStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    fn messages(&self, space_id: Snowflake, sub_space_id: Snowflake) -> Option<Arc<MessageMap>> {
        let sub_spaces = self.spaces.get(&space_id).map(|r| Arc::clone(r.value()))?;
        sub_spaces.get(&sub_space_id).map(|r| Arc::clone(r.value()))
    }

    fn messages_or_create(&self, space_id: Snowflake, sub_space_id: Snowflake) -> Arc<MessageMap> {
        // Clone the Arc out so no shard guard outlives the statement
        let sub_spaces = Arc::clone(self.spaces.entry(space_id).or_default().value());
        let messages = Arc::clone(sub_spaces.entry(sub_space_id).or_default().value());
        messages
    }

    /// Insert or replace a raid
    pub fn put(&self, key: RaidKey, record: RaidRecord) -> Arc<RaidSlot> {
        let slot = Arc::new(RaidSlot::new(key, record));
        self.messages_or_create(key.space_id, key.sub_space_id)
            .insert(key.message_id, Arc::clone(&slot));

        tracing::debug!(raid = %key, "Raid stored");

        slot
    }

    /// Return the stored raid, inserting `record` only if the key is vacant
    ///
    /// The flag is `true` when `record` was inserted.
    pub fn get_or_put(&self, key: RaidKey, record: RaidRecord) -> (Arc<RaidSlot>, bool) {
        let messages = self.messages_or_create(key.space_id, key.sub_space_id);
        let mut inserted = false;
        let slot = Arc::clone(
            messages
                .entry(key.message_id)
                .or_insert_with(|| {
                    inserted = true;
                    Arc::new(RaidSlot::new(key, record))
                })
                .value(),
        );
        (slot, inserted)
    }

    pub fn get(&self, key: RaidKey) -> Option<Arc<RaidSlot>> {
        self.messages(key.space_id, key.sub_space_id)?
            .get(&key.message_id)
            .map(|r| Arc::clone(r.value()))
    }

    /// The `skip`-th most recently created raid of a sub-space (0 = newest)
    pub fn get_most_recent(
        &self,
        space_id: Snowflake,
        sub_space_id: Snowflake,
        skip: usize,
    ) -> Option<Arc<RaidSlot>> {
        let messages = self.messages(space_id, sub_space_id)?;
        let mut slots: Vec<Arc<RaidSlot>> =
            messages.iter().map(|r| Arc::clone(r.value())).collect();
        slots.sort_by_key(|slot| Reverse((slot.created_at, slot.key.message_id)));
        slots.into_iter().nth(skip)
    }

    /// Remove a raid; `true` if it was present
    pub fn remove(&self, key: RaidKey) -> bool {
        let removed = self
            .messages(key.space_id, key.sub_space_id)
            .and_then(|messages| messages.remove(&key.message_id))
            .is_some();

        if removed {
            tracing::debug!(raid = %key, "Raid removed");
        }

        removed
    }

    /// Remove exactly this slot, leaving any replacement stored under its key alone
    pub fn remove_slot(&self, slot: &Arc<RaidSlot>) -> bool {
        let key = slot.key;
        self.messages(key.space_id, key.sub_space_id)
            .and_then(|messages| {
                messages.remove_if(&key.message_id, |_, stored| Arc::ptr_eq(stored, slot))
            })
            .is_some()
    }

    /// Every stored raid, produced lazily one sub-space at a time
    ///
    /// Each sub-space is snapshotted before its raids are yielded, so callers may
    /// await while iterating and concurrent puts/removes never block on the walk.
    /// Raids added or removed mid-walk may or may not be seen.
    pub fn enumerate_all(&self) -> impl Iterator<Item = Arc<RaidSlot>> {
        let spaces: Vec<Arc<SubSpaceMap>> =
            self.spaces.iter().map(|r| Arc::clone(r.value())).collect();

        spaces
            .into_iter()
            .flat_map(|sub_spaces| {
                sub_spaces
                    .iter()
                    .map(|r| Arc::clone(r.value()))
                    .collect::<Vec<_>>()
            })
            .flat_map(|messages| {
                messages
                    .iter()
                    .map(|r| Arc::clone(r.value()))
                    .collect::<Vec<_>>()
            })
    }

    /// Number of stored raids
    pub fn len(&self) -> usize {
        self.enumerate_all().count()
    }

    pub fn is_empty(&self) -> bool {
        self.enumerate_all().next().is_none()
    }
}

impl fmt::Debug for RaidStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RaidStore")
            .field("spaces", &self.spaces.len())
            .finish()
    }
}
