//! The draft coordinator: tracks all live drafts and their participants.
//!
//! This is the single shared mutable structure of the whole server.
//! Every inbound network event from every concurrent connection task
//! funnels through it, so its job is to make three guarantees hold
//! under arbitrary interleavings:
//!
//! - no lost draft — a registered draft stays resolvable until it is
//!   deliberately completed
//! - no dangling binding — a slot always points at a live draft
//! - no partial teardown — a draft's slots vanish all at once, never
//!   one by one
//!
//! # Lifecycle (as observed through the coordinator)
//!
//! ```text
//! start_draft() ────────→ [Registered + Running] ────────→ removed
//!       │                       │        ↑
//!       │                 connect()  disconnect()
//!       │                       ↓        │
//!       │                  [slot Attached ⇄ Detached]
//!       ▼
//!  (no partial registration is ever observable)
//! ```

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use draftforge_draft::{
    DraftConfig, DraftEventSender, DraftHandle, Drafter, ResourcePool,
    spawn_draft,
};
use draftforge_protocol::{DraftId, DrafterName, ParticipantKey};
use draftforge_ring::Ring;
use draftforge_transport::ConnectionId;

use crate::{ConnectionHandle, CoordinatorError, DraftSlot};

/// The two registry structures. Guarded by ONE mutex so they can only
/// ever change together.
///
/// Invariant: the key set of `slots` is exactly the union of the
/// participant keys of every handle in `drafts`.
struct Registry {
    /// Live drafts, keyed by draft id. Each handle carries its
    /// immutable ring of drafters, so teardown can enumerate the keys
    /// to remove without asking the actor.
    drafts: HashMap<DraftId, DraftHandle>,

    /// One slot per participant of every live draft, keyed by the
    /// opaque per-draft participant key.
    slots: HashMap<ParticipantKey, DraftSlot>,
}

/// Process-wide directory of drafts and participant connections.
///
/// Constructed once at server startup and shared (behind an `Arc`) with
/// every connection task and the draft event dispatcher. There is no
/// implicit global — whoever needs the coordinator gets handed it.
pub struct DraftCoordinator {
    inner: Mutex<Registry>,

    /// Event channel handed to every spawned draft actor; completion
    /// signals and outbound draft messages flow back through it.
    events: DraftEventSender,
}

impl DraftCoordinator {
    /// Creates an empty coordinator whose drafts will report on the
    /// given event channel.
    pub fn new(events: DraftEventSender) -> Self {
        Self {
            inner: Mutex::new(Registry {
                drafts: HashMap::new(),
                slots: HashMap::new(),
            }),
            events,
        }
    }

    /// Locks the registry, recovering from poisoning.
    ///
    /// Every critical section does its fallible work before touching the
    /// maps and performs only infallible inserts/removes after, so a
    /// panicking thread cannot have left a half-written record — the
    /// data behind a poisoned lock is still internally consistent.
    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Creates, registers, and starts a new draft.
    ///
    /// Generates one fresh [`ParticipantKey`] per participant, builds the
    /// rotation ring in the order given, spawns the draft actor, and
    /// registers one detached slot per participant — the registration is
    /// a single atomic unit with respect to every other coordinator
    /// operation. Only after the lock is released does the actor get its
    /// Start command, so draft startup (which emits events that may race
    /// back into the coordinator) never runs under the registry lock.
    ///
    /// # Errors
    /// - [`CoordinatorError::EmptyDraft`] — no participants
    /// - [`CoordinatorError::DuplicateDrafter`] — the same identity twice
    /// - [`CoordinatorError::PoolTooSmall`] — pool can't cover the deal
    /// - [`CoordinatorError::StartFailed`] — the actor never started;
    ///   the registration has been rolled back
    pub async fn start_draft(
        &self,
        names: Vec<DrafterName>,
        pool: ResourcePool,
        config: DraftConfig,
    ) -> Result<DraftId, CoordinatorError> {
        if names.is_empty() {
            return Err(CoordinatorError::EmptyDraft);
        }
        let mut seen = std::collections::HashSet::new();
        for name in &names {
            if !seen.insert(name) {
                return Err(CoordinatorError::DuplicateDrafter(
                    name.clone(),
                ));
            }
        }
        let needed = config.items_needed(names.len());
        if pool.len() < needed {
            return Err(CoordinatorError::PoolTooSmall {
                needed,
                have: pool.len(),
            });
        }

        // All fallible work happens above; from here to the end of the
        // lock scope nothing can fail.
        let drafters: Vec<Drafter> = names
            .into_iter()
            .map(|name| Drafter::new(name, ParticipantKey::generate()))
            .collect();
        let ring = Ring::new(drafters)
            .map_err(|_| CoordinatorError::EmptyDraft)?;

        let draft_id = DraftId::generate();
        let handle = spawn_draft(
            draft_id,
            ring,
            pool,
            config,
            self.events.clone(),
        );

        {
            let mut reg = self.registry();
            for drafter in handle.drafters() {
                reg.slots.insert(
                    drafter.key(),
                    DraftSlot::new(handle.clone(), drafter.clone()),
                );
            }
            reg.drafts.insert(draft_id, handle.clone());
        }

        tracing::info!(
            %draft_id,
            drafters = handle.drafters().len(),
            "draft registered"
        );

        // Phase two: start, outside the lock.
        if let Err(e) = handle.start().await {
            // The actor died before its Start command — unwind the
            // registration so no dead draft lingers in the directory.
            self.complete_draft(draft_id);
            tracing::error!(%draft_id, error = %e, "draft failed to start");
            return Err(CoordinatorError::StartFailed(e));
        }

        Ok(draft_id)
    }

    /// Resolves a participant key to its slot.
    ///
    /// Returns a cloned snapshot; `None` for a key that was never
    /// issued or whose draft has completed. An unknown key is a
    /// legitimate outcome (stale or forged), never an error.
    pub fn slot(&self, key: ParticipantKey) -> Option<DraftSlot> {
        self.registry().slots.get(&key).cloned()
    }

    /// Attaches a connection to a participant's slot, replacing any
    /// previously attached handle (reconnect-replaces-old).
    ///
    /// The coordinator does not notify or close the replaced handle —
    /// sequencing between rival connections is the transport layer's
    /// business, via [`ConnectionId`] comparison. Attaching to a key
    /// that is no longer registered is a no-op.
    pub fn connect(
        &self,
        key: ParticipantKey,
        connection: ConnectionHandle,
    ) {
        let mut reg = self.registry();
        match reg.slots.get_mut(&key) {
            Some(slot) => {
                tracing::info!(
                    %key,
                    conn = %connection.id(),
                    drafter = %slot.drafter().name(),
                    "participant connected"
                );
                slot.attach(connection);
            }
            None => {
                tracing::debug!(%key, "connect for unknown key ignored");
            }
        }
    }

    /// Detaches whatever connection a participant's slot holds.
    ///
    /// Idempotent: a second call, or a call on an already-detached or
    /// already-removed slot, does nothing.
    pub fn disconnect(&self, key: ParticipantKey) {
        let mut reg = self.registry();
        if let Some(slot) = reg.slots.get_mut(&key) {
            if slot.connection().is_some() {
                tracing::info!(
                    %key,
                    drafter = %slot.drafter().name(),
                    "participant disconnected"
                );
            }
            slot.detach();
        }
    }

    /// Detaches a participant's connection only if the attached handle
    /// carries the given id.
    ///
    /// This is the compare-and-clear a connection handler uses on
    /// teardown: if the participant already reconnected (a fresher
    /// handle with a larger id is attached), the stale handler's cleanup
    /// must not knock the new connection off the slot.
    pub fn disconnect_if_current(
        &self,
        key: ParticipantKey,
        connection_id: ConnectionId,
    ) {
        let mut reg = self.registry();
        if let Some(slot) = reg.slots.get_mut(&key) {
            if slot
                .connection()
                .is_some_and(|c| c.id() == connection_id)
            {
                tracing::info!(
                    %key,
                    conn = %connection_id,
                    "participant disconnected"
                );
                slot.detach();
            }
        }
    }

    /// Removes a draft and every one of its participant slots, as one
    /// atomic unit.
    ///
    /// Called from the draft event dispatcher when a draft signals
    /// completion. Completing a draft that was already removed is a
    /// silent no-op — duplicate completion signals are tolerated.
    ///
    /// The actor itself is not told anything; once the registry's
    /// handles are dropped and in-flight snapshots expire, its command
    /// channel closes and the task winds down on its own.
    pub fn complete_draft(&self, draft_id: DraftId) {
        let mut reg = self.registry();
        let Some(handle) = reg.drafts.remove(&draft_id) else {
            tracing::debug!(
                %draft_id,
                "completion for unknown draft ignored"
            );
            return;
        };
        for drafter in handle.drafters() {
            reg.slots.remove(&drafter.key());
        }
        drop(reg);

        tracing::info!(
            %draft_id,
            drafters = handle.drafters().len(),
            "draft deregistered"
        );
    }

    /// Resolves a draft id to its handle, if live.
    pub fn draft(&self, draft_id: DraftId) -> Option<DraftHandle> {
        self.registry().drafts.get(&draft_id).cloned()
    }

    /// Ids of all live drafts.
    pub fn draft_ids(&self) -> Vec<DraftId> {
        self.registry().drafts.keys().copied().collect()
    }

    /// Number of live drafts.
    pub fn draft_count(&self) -> usize {
        self.registry().drafts.len()
    }

    /// Number of registered participants across all live drafts.
    pub fn participant_count(&self) -> usize {
        self.registry().slots.len()
    }
}

// =========================================================================
// Tests
// =========================================================================
