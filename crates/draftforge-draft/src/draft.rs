//! Draft actor: an isolated Tokio task that owns one draft in progress.
//!
//! Each draft runs in its own task, communicating with the outside world
//! through channels only — commands in via [`DraftHandle`], events out
//! via the shared [`DraftEvent`] channel. The actor addresses
//! participants purely by key; whether a participant currently has a
//! live connection is somebody else's problem.

use std::collections::VecDeque;
use std::sync::Arc;

use draftforge_protocol::{
    DraftId, DraftMessage, Pack, ParticipantKey, PoolItem, PoolItemId,
};
use draftforge_ring::Ring;
use rand::seq::SliceRandom;
use tokio::sync::{mpsc, oneshot};

use crate::{DraftConfig, DraftError, DraftState, Drafter, ResourcePool};

/// Default command channel size for draft actors.
const DEFAULT_CHANNEL_SIZE: usize = 64;

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// What a draft actor emits on the shared event channel.
///
/// The receiver (the server's dispatcher) resolves keys to live
/// connections and forwards; a key with no attached connection simply
/// misses the message and catches up via resync on reconnect.
#[derive(Debug)]
pub enum DraftEvent {
    /// Deliver `msg` to the participant addressed by `key`.
    Outbound {
        key: ParticipantKey,
        msg: DraftMessage,
    },

    /// The draft has reached its terminal state. The owner is expected
    /// to deregister it (the coordinator's `complete_draft`).
    Completed { draft_id: DraftId },
}

/// Sender half of the draft event channel.
pub type DraftEventSender = mpsc::UnboundedSender<DraftEvent>;

// ---------------------------------------------------------------------------
// Commands and replies
// ---------------------------------------------------------------------------

/// Commands sent to a draft actor through its channel.
enum DraftCommand {
    /// Deal the packs and open the draft. Sent exactly once, after the
    /// coordinator has finished registering slots.
    Start {
        reply: oneshot::Sender<Result<(), DraftError>>,
    },

    /// Record a pick by the participant holding `key`.
    Pick {
        key: ParticipantKey,
        item: PoolItemId,
        reply: oneshot::Sender<Result<PoolItem, DraftError>>,
    },

    /// Snapshot a drafter's current pack and picks (reconnect catch-up).
    Resync {
        key: ParticipantKey,
        reply: oneshot::Sender<Result<ResyncInfo, DraftError>>,
    },

    /// Request draft metadata.
    Info { reply: oneshot::Sender<DraftInfo> },

    /// Tear the actor down without completing (server shutdown).
    Shutdown,
}

/// A snapshot of draft metadata (not the pack contents).
#[derive(Debug, Clone)]
pub struct DraftInfo {
    /// The draft's unique id.
    pub draft_id: DraftId,
    /// Current lifecycle state.
    pub state: DraftState,
    /// Number of seats in the rotation.
    pub drafters: usize,
    /// Current round, 1-based. 0 while Pending.
    pub round: u32,
}

/// A drafter's view of their own seat, for reconnect catch-up.
#[derive(Debug, Clone)]
pub struct ResyncInfo {
    /// Current lifecycle state of the draft.
    pub state: DraftState,
    /// Current round, 1-based.
    pub round: u32,
    /// The pack awaiting this drafter's pick, if any.
    pub pack: Option<Pack>,
    /// Everything this drafter has picked so far.
    pub picks: Vec<PoolItem>,
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// Handle to a running draft actor.
///
/// Cheap to clone — an `mpsc::Sender` plus shared immutable metadata.
/// The handle also carries the rotation ring, so owners (the
/// coordinator) can enumerate the draft's participants without a
/// round-trip into the actor.
#[derive(Clone)]
pub struct DraftHandle {
    draft_id: DraftId,
    drafters: Arc<Ring<Drafter>>,
    sender: mpsc::Sender<DraftCommand>,
}

impl DraftHandle {
    /// The draft's unique id.
    pub fn draft_id(&self) -> DraftId {
        self.draft_id
    }

    /// The immutable rotation ring of this draft's participants.
    pub fn drafters(&self) -> &Ring<Drafter> {
        &self.drafters
    }

    /// Opens the draft: deals packs and presents the first round.
    ///
    /// # Errors
    /// [`DraftError::NotActive`] if the draft was already started,
    /// [`DraftError::Unavailable`] if the actor is gone.
    pub async fn start(&self) -> Result<(), DraftError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(DraftCommand::Start { reply: reply_tx })
            .await
            .map_err(|_| DraftError::Unavailable(self.draft_id))?;
        reply_rx
            .await
            .map_err(|_| DraftError::Unavailable(self.draft_id))?
    }

    /// Records a pick, returning the item that was picked.
    pub async fn pick(
        &self,
        key: ParticipantKey,
        item: PoolItemId,
    ) -> Result<PoolItem, DraftError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(DraftCommand::Pick {
                key,
                item,
                reply: reply_tx,
            })
            .await
            .map_err(|_| DraftError::Unavailable(self.draft_id))?;
        reply_rx
            .await
            .map_err(|_| DraftError::Unavailable(self.draft_id))?
    }

    /// Snapshots a drafter's seat for reconnect catch-up.
    pub async fn resync(
        &self,
        key: ParticipantKey,
    ) -> Result<ResyncInfo, DraftError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(DraftCommand::Resync {
                key,
                reply: reply_tx,
            })
            .await
            .map_err(|_| DraftError::Unavailable(self.draft_id))?;
        reply_rx
            .await
            .map_err(|_| DraftError::Unavailable(self.draft_id))?
    }

    /// Requests the current draft metadata.
    pub async fn info(&self) -> Result<DraftInfo, DraftError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(DraftCommand::Info { reply: reply_tx })
            .await
            .map_err(|_| DraftError::Unavailable(self.draft_id))?;
        reply_rx
            .await
            .map_err(|_| DraftError::Unavailable(self.draft_id))
    }

    /// Tells the draft to shut down without completing.
    pub async fn shutdown(&self) -> Result<(), DraftError> {
        self.sender
            .send(DraftCommand::Shutdown)
            .await
            .map_err(|_| DraftError::Unavailable(self.draft_id))
    }
}

// ---------------------------------------------------------------------------
// Actor
// ---------------------------------------------------------------------------

/// One seat at the draft table: a drafter, the packs queued in front of
/// them, and what they have picked.
struct Seat {
    drafter: Drafter,
    queue: VecDeque<Pack>,
    picks: Vec<PoolItem>,
}

/// The internal draft actor state. Runs inside a Tokio task.
struct DraftActor {
    draft_id: DraftId,
    ring: Arc<Ring<Drafter>>,
    config: DraftConfig,
    state: DraftState,
    /// Seats, index-aligned with `ring`.
    seats: Vec<Seat>,
    /// The pool, consumed at start when packs are dealt.
    pool: Option<ResourcePool>,
    /// Rounds not yet opened, front first.
    pending_rounds: VecDeque<Vec<Pack>>,
    /// Current round, 1-based. 0 while Pending.
    round: u32,
    /// Packs of the current round that still contain items.
    in_flight: usize,
    events: DraftEventSender,
    receiver: mpsc::Receiver<DraftCommand>,
}

impl DraftActor {
    /// Runs the actor loop, processing commands until shutdown or until
    /// every handle is dropped.
    async fn run(mut self) {
        tracing::info!(draft_id = %self.draft_id, "draft actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                DraftCommand::Start { reply } => {
                    let result = self.handle_start();
                    let _ = reply.send(result);
                }
                DraftCommand::Pick { key, item, reply } => {
                    let result = self.handle_pick(key, item);
                    let _ = reply.send(result);
                }
                DraftCommand::Resync { key, reply } => {
                    let _ = reply.send(self.handle_resync(key));
                }
                DraftCommand::Info { reply } => {
                    let _ = reply.send(self.info());
                }
                DraftCommand::Shutdown => {
                    tracing::info!(
                        draft_id = %self.draft_id,
                        "draft shutting down"
                    );
                    break;
                }
            }
        }

        tracing::info!(draft_id = %self.draft_id, "draft actor stopped");
    }

    fn handle_start(&mut self) -> Result<(), DraftError> {
        if self.state != DraftState::Pending {
            return Err(DraftError::NotActive(self.draft_id));
        }

        // The deal: shuffle the pool once, then slice it into
        // rounds x seats packs of `pack_size`. The caller validated the
        // pool is large enough; a short pool would only produce short
        // final packs, never a panic.
        let mut items = self
            .pool
            .take()
            .map(|p| p.items)
            .unwrap_or_default();
        items.shuffle(&mut rand::rng());

        let n = self.ring.len();
        let mut iter = items.into_iter();
        for _ in 0..self.config.rounds {
            let mut packs = Vec::with_capacity(n);
            for _ in 0..n {
                let items: Vec<PoolItem> =
                    iter.by_ref().take(self.config.pack_size).collect();
                packs.push(Pack { items });
            }
            self.pending_rounds.push_back(packs);
        }

        self.state = DraftState::Drafting;
        tracing::info!(
            draft_id = %self.draft_id,
            drafters = n,
            rounds = self.config.rounds,
            "draft started"
        );
        self.advance_round();
        Ok(())
    }

    /// Opens the next round, or completes the draft when none remain.
    fn advance_round(&mut self) {
        loop {
            let Some(packs) = self.pending_rounds.pop_front() else {
                self.complete();
                return;
            };

            self.round += 1;
            self.in_flight =
                packs.iter().filter(|p| !p.is_empty()).count();

            self.broadcast(DraftMessage::RoundStarted { round: self.round });
            for (seat, pack) in self.seats.iter_mut().zip(packs) {
                // An empty dealt pack (short pool) never hits a queue —
                // there is nothing in it to pick.
                if !pack.is_empty() {
                    seat.queue.push_back(pack);
                }
            }
            for idx in 0..self.seats.len() {
                self.present_head(idx);
            }

            tracing::debug!(
                draft_id = %self.draft_id,
                round = self.round,
                packs = self.in_flight,
                "round opened"
            );

            // A round of entirely empty packs (degenerate config) has
            // nothing to pick — keep advancing.
            if self.in_flight > 0 {
                return;
            }
        }
    }

    fn handle_pick(
        &mut self,
        key: ParticipantKey,
        item: PoolItemId,
    ) -> Result<PoolItem, DraftError> {
        if !self.state.is_active() {
            return Err(DraftError::NotActive(self.draft_id));
        }

        let idx = self
            .seats
            .iter()
            .position(|s| s.drafter.key() == key)
            .ok_or(DraftError::UnknownDrafter(key))?;

        let seat = &mut self.seats[idx];
        let pack = seat
            .queue
            .front_mut()
            .ok_or(DraftError::NoPackQueued)?;

        let pos = pack
            .items
            .iter()
            .position(|i| i.id == item)
            .ok_or(DraftError::ItemNotInPack(item))?;

        let picked = pack.items.remove(pos);
        seat.picks.push(picked.clone());

        // The picked-from pack leaves the picker's queue: its remainder
        // travels on to the neighbor, or is discarded when empty.
        let passed = seat
            .queue
            .pop_front()
            .expect("front existed above");

        let picker_name = seat.drafter.name().clone();
        let picker_key = seat.drafter.key();

        tracing::debug!(
            draft_id = %self.draft_id,
            drafter = %picker_name,
            item = %picked.id,
            "pick recorded"
        );

        self.emit(
            picker_key,
            DraftMessage::PickRecorded {
                item: picked.clone(),
            },
        );
        self.broadcast_except(
            idx,
            DraftMessage::DrafterPicked { name: picker_name },
        );

        // The picker's next queued pack (if any) surfaces immediately.
        self.present_head(idx);

        if passed.is_empty() {
            self.in_flight -= 1;
            if self.in_flight == 0 {
                self.advance_round();
            }
        } else {
            // Odd rounds rotate one way, even rounds the other.
            let neighbor = if self.round % 2 == 1 {
                self.ring.succ(idx)
            } else {
                self.ring.pred(idx)
            };
            self.seats[neighbor].queue.push_back(passed);
            // Only a pack landing at the head of an empty queue becomes
            // visible; anything behind a pending pick stays queued.
            if self.seats[neighbor].queue.len() == 1 {
                self.present_head(neighbor);
            }
        }

        Ok(picked)
    }

    fn handle_resync(
        &self,
        key: ParticipantKey,
    ) -> Result<ResyncInfo, DraftError> {
        let seat = self
            .seats
            .iter()
            .find(|s| s.drafter.key() == key)
            .ok_or(DraftError::UnknownDrafter(key))?;

        Ok(ResyncInfo {
            state: self.state,
            round: self.round,
            pack: seat.queue.front().cloned(),
            picks: seat.picks.clone(),
        })
    }

    fn complete(&mut self) {
        self.state = DraftState::Finished;
        tracing::info!(draft_id = %self.draft_id, "draft completed");

        for seat in &self.seats {
            let _ = self.events.send(DraftEvent::Outbound {
                key: seat.drafter.key(),
                msg: DraftMessage::DraftCompleted {
                    picks: seat.picks.clone(),
                },
            });
        }
        let _ = self.events.send(DraftEvent::Completed {
            draft_id: self.draft_id,
        });
    }

    /// Sends the head of a seat's queue to its drafter, if there is one.
    fn present_head(&self, idx: usize) {
        let seat = &self.seats[idx];
        if let Some(pack) = seat.queue.front() {
            self.emit(
                seat.drafter.key(),
                DraftMessage::PackPresented { pack: pack.clone() },
            );
        }
    }

    /// Sends an outbound draft message to a single participant. Silently
    /// drops if the dispatcher is gone (server shutting down).
    fn emit(&self, key: ParticipantKey, msg: DraftMessage) {
        let _ = self.events.send(DraftEvent::Outbound { key, msg });
    }

    fn broadcast(&self, msg: DraftMessage) {
        for seat in &self.seats {
            self.emit(seat.drafter.key(), msg.clone());
        }
    }

    fn broadcast_except(&self, excluded: usize, msg: DraftMessage) {
        for (idx, seat) in self.seats.iter().enumerate() {
            if idx != excluded {
                self.emit(seat.drafter.key(), msg.clone());
            }
        }
    }

    fn info(&self) -> DraftInfo {
        DraftInfo {
            draft_id: self.draft_id,
            state: self.state,
            drafters: self.seats.len(),
            round: self.round,
        }
    }
}

/// Spawns a new draft actor task and returns a handle to command it.
///
/// The actor starts in [`DraftState::Pending`] and deals nothing until
/// it receives Start — the window the coordinator uses to register
/// every participant before the first pack becomes visible.
pub fn spawn_draft(
    draft_id: DraftId,
    drafters: Ring<Drafter>,
    pool: ResourcePool,
    config: DraftConfig,
    events: DraftEventSender,
) -> DraftHandle {
    let (tx, rx) = mpsc::channel(DEFAULT_CHANNEL_SIZE);
    let ring = Arc::new(drafters);

    let seats = ring
        .iter()
        .map(|drafter| Seat {
            drafter: drafter.clone(),
            queue: VecDeque::new(),
            picks: Vec::new(),
        })
        .collect();

    let actor = DraftActor {
        draft_id,
        ring: Arc::clone(&ring),
        config,
        state: DraftState::Pending,
        seats,
        pool: Some(pool),
        pending_rounds: VecDeque::new(),
        round: 0,
        in_flight: 0,
        events,
        receiver: rx,
    };

    tokio::spawn(actor.run());

    DraftHandle {
        draft_id,
        drafters: ring,
        sender: tx,
    }
}
