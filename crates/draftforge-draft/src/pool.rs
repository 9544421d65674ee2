//! Participant records and the resource pool being drafted.

use draftforge_protocol::{DrafterName, ParticipantKey, PoolItem};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Drafter
// ---------------------------------------------------------------------------

/// One participant of one draft: the caller-supplied identity plus the
/// fresh key generated for this draft.
///
/// The key is never reused across drafts, even for the same name — it is
/// the address a connection presents, not a durable account id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Drafter {
    name: DrafterName,
    key: ParticipantKey,
}

impl Drafter {
    /// Pairs a name with a freshly generated key.
    pub fn new(name: DrafterName, key: ParticipantKey) -> Self {
        Self { name, key }
    }

    /// The caller-supplied identity.
    pub fn name(&self) -> &DrafterName {
        &self.name
    }

    /// The per-draft participant key.
    pub fn key(&self) -> ParticipantKey {
        self.key
    }
}

// ---------------------------------------------------------------------------
// ResourcePool
// ---------------------------------------------------------------------------

/// The shared pool of items a draft consumes.
///
/// Plain data — the pool carries no legality or scoring rules. The draft
/// shuffles it and deals it into packs; anything left over after the
/// configured deal stays undrafted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcePool {
    /// Display name of the pool (e.g. the cube or set name).
    pub name: String,
    /// All draftable items.
    pub items: Vec<PoolItem>,
}

impl ResourcePool {
    /// Builds a pool from a name and items.
    pub fn new(name: impl Into<String>, items: Vec<PoolItem>) -> Self {
        Self {
            name: name.into(),
            items,
        }
    }

    /// Number of items in the pool.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// `true` if the pool holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
