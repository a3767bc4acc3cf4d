//! Dense bot registry with recycled IDs.
//!
//! Records live contiguously in a dense `Vec`; a sparse array maps each
//! stable ID to its dense position. Removal swaps the last record into the
//! hole, so lookups and removals are O(1) and the dense array never has
//! gaps, at the cost of iteration order changing across removals.
//!
//! Freed IDs are recycled lowest-first before a new ID is minted. Two
//! secondary indices resolve external identities (an engine handle and a
//! profile string) to the same record; neither owns any data.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::ops::{Index, IndexMut};

use crate::state::BotEntity;

/// Owner of every [`BotEntity`] in a session.
#[derive(Debug, Default)]
pub struct EntityRegistry {
    /// Dense records. Position `i` holds the bot whose `sparse` entry is `i`.
    entities: Vec<BotEntity>,
    /// id → dense index (`None` for free IDs).
    sparse: Vec<Option<usize>>,
    /// Freed IDs awaiting reuse, smallest on top.
    free_ids: BinaryHeap<Reverse<usize>>,
    /// Next never-used ID.
    next_id: usize,
    /// engine handle → id. Grows to the largest handle seen.
    engine_index: Vec<Option<usize>>,
    /// profile id → id.
    profile_index: HashMap<String, usize>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a bot with no external identities. Returns its ID.
    pub fn add(&mut self) -> usize {
        let id = self.allocate_id();
        if id >= self.sparse.len() {
            self.sparse.resize(id + 1, None);
        }
        self.sparse[id] = Some(self.entities.len());
        self.entities.push(BotEntity::new(id));
        log::trace!("registry: added bot {} ({} live)", id, self.entities.len());
        id
    }

    /// Register a bot and map `engine_id` to it.
    pub fn add_with_engine_id(&mut self, engine_id: usize) -> usize {
        self.add_bot(Some(engine_id), None)
    }

    /// Register a bot with any combination of external identities.
    ///
    /// A handle or profile already mapped to a live bot is re-pointed at the
    /// new bot; the old bot keeps its record but loses that identity.
    /// `usize::MAX` cannot be indexed as an engine handle: the bot is still
    /// registered, just without that mapping.
    pub fn add_bot(&mut self, engine_id: Option<usize>, profile_id: Option<String>) -> usize {
        let id = self.add();

        if let Some(engine_id) = engine_id {
            self.map_engine_id(id, engine_id);
        }

        if let Some(profile_id) = profile_id {
            if let Some(previous) = self.profile_index.insert(profile_id.clone(), id) {
                log::warn!(
                    "registry: profile {} moved from bot {} to bot {}",
                    profile_id,
                    previous,
                    id
                );
                if let Some(old) = self.try_get_mut(previous) {
                    old.profile_id = None;
                }
            }
            self[id].profile_id = Some(profile_id);
        }

        id
    }

    fn map_engine_id(&mut self, id: usize, engine_id: usize) {
        let Some(len) = engine_id.checked_add(1) else {
            log::warn!(
                "registry: engine id {} out of range, bot {} left unmapped",
                engine_id,
                id
            );
            return;
        };
        if len > self.engine_index.len() {
            self.engine_index.resize(len, None);
        }
        if let Some(previous) = self.engine_index[engine_id].replace(id) {
            log::warn!(
                "registry: engine id {} moved from bot {} to bot {}",
                engine_id,
                previous,
                id
            );
            if let Some(old) = self.try_get_mut(previous) {
                old.engine_id = None;
            }
        }
        self[id].engine_id = Some(engine_id);
    }

    /// Swap-remove the bot with `id`. Returns `false` if it is not live.
    pub fn remove(&mut self, id: usize) -> bool {
        let Some(index) = self.dense_index(id) else {
            return false;
        };

        let removed = self.entities.swap_remove(index);
        if let Some(moved) = self.entities.get(index) {
            self.sparse[moved.id] = Some(index);
        }
        self.sparse[id] = None;

        if let Some(engine_id) = removed.engine_id {
            if let Some(slot) = self.engine_index.get_mut(engine_id) {
                if *slot == Some(id) {
                    *slot = None;
                }
            }
        }
        if let Some(profile_id) = &removed.profile_id {
            if self.profile_index.get(profile_id) == Some(&id) {
                self.profile_index.remove(profile_id);
            }
        }

        if self.entities.is_empty() {
            // Last bot gone: start over instead of keeping stale free IDs.
            self.reset_bookkeeping();
        } else {
            self.free_ids.push(Reverse(id));
        }

        log::trace!("registry: removed bot {} ({} live)", id, self.entities.len());
        true
    }

    /// True if `id` refers to a live bot.
    pub fn contains(&self, id: usize) -> bool {
        self.dense_index(id).is_some()
    }

    pub fn try_get(&self, id: usize) -> Option<&BotEntity> {
        self.dense_index(id).map(|i| &self.entities[i])
    }

    pub fn try_get_mut(&mut self, id: usize) -> Option<&mut BotEntity> {
        match self.dense_index(id) {
            Some(i) => Some(&mut self.entities[i]),
            None => None,
        }
    }

    pub fn get_by_engine_id(&self, engine_id: usize) -> Option<&BotEntity> {
        self.id_for_engine(engine_id).and_then(|id| self.try_get(id))
    }

    pub fn get_by_engine_id_mut(&mut self, engine_id: usize) -> Option<&mut BotEntity> {
        let id = self.id_for_engine(engine_id)?;
        self.try_get_mut(id)
    }

    pub fn get_by_profile_id(&self, profile_id: &str) -> Option<&BotEntity> {
        self.profile_index
            .get(profile_id)
            .and_then(|&id| self.try_get(id))
    }

    pub fn get_by_profile_id_mut(&mut self, profile_id: &str) -> Option<&mut BotEntity> {
        let id = self.profile_index.get(profile_id).copied()?;
        self.try_get_mut(id)
    }

    /// Position of `id` in the dense array, if live.
    pub fn dense_index(&self, id: usize) -> Option<usize> {
        self.sparse.get(id).copied().flatten()
    }

    /// Number of live bots.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Dense iteration. Order changes whenever a bot is removed.
    pub fn iter(&self) -> impl Iterator<Item = &BotEntity> {
        self.entities.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut BotEntity> {
        self.entities.iter_mut()
    }

    /// Snapshot of live IDs in dense order.
    pub fn ids(&self) -> Vec<usize> {
        self.entities.iter().map(|e| e.id).collect()
    }

    /// Drop every bot and all bookkeeping.
    pub fn clear(&mut self) {
        self.entities.clear();
        self.reset_bookkeeping();
        log::trace!("registry: cleared");
    }

    fn allocate_id(&mut self) -> usize {
        match self.free_ids.pop() {
            Some(Reverse(id)) => id,
            None => {
                let id = self.next_id;
                self.next_id += 1;
                id
            }
        }
    }

    fn id_for_engine(&self, engine_id: usize) -> Option<usize> {
        self.engine_index.get(engine_id).copied().flatten()
    }

    fn reset_bookkeeping(&mut self) {
        self.sparse.clear();
        self.free_ids.clear();
        self.next_id = 0;
        self.engine_index.clear();
        self.profile_index.clear();
    }
}

impl Index<usize> for EntityRegistry {
    type Output = BotEntity;

    /// Panics if `id` is not live: callers must only index with IDs they
    /// know to be registered.
    fn index(&self, id: usize) -> &BotEntity {
        match self.dense_index(id) {
            Some(i) => &self.entities[i],
            None => panic!("no live bot with id {id}"),
        }
    }
}

impl IndexMut<usize> for EntityRegistry {
    fn index_mut(&mut self, id: usize) -> &mut BotEntity {
        match self.dense_index(id) {
            Some(i) => &mut self.entities[i],
            None => panic!("no live bot with id {id}"),
        }
    }
}
