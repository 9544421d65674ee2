//! The draft coordinator: the process-wide directory of live drafts and
//! participant connections.
//!
//! This crate is the synchronization heart of Draftforge. Every inbound
//! network event — a connection presenting its key, a disconnect, a
//! pick, a completion signal — lands on the [`DraftCoordinator`], which
//! is responsible for:
//!
//! 1. **Creating drafts** — generating fresh participant keys, building
//!    the rotation ring, spawning the draft actor, and registering one
//!    slot per participant, atomically
//! 2. **Addressing** — resolving an opaque [`ParticipantKey`]
//!    (draftforge_protocol::ParticipantKey) to its [`DraftSlot`]
//! 3. **Connection binding** — attaching/detaching exactly one live
//!    connection handle per participant, with reconnect-replaces-old
//!    semantics
//! 4. **Teardown** — removing a completed draft and all of its slots as
//!    one atomic unit
//!
//! # Concurrency note
//!
//! One `std::sync::Mutex` guards the slot registry and the live-draft
//! set JOINTLY, so the two structures can never be observed out of step
//! with each other. Every operation is synchronous and holds the lock
//! only for its map accesses; nothing async, and nothing that can call
//! back into the coordinator, ever runs under the lock. `start_draft`
//! is the one async operation, and it is async only for the
//! register-then-start handoff — the Start command is sent strictly
//! after the lock is released.

mod coordinator;
mod error;
mod slot;

pub use coordinator::DraftCoordinator;
pub use error::CoordinatorError;
pub use slot::{ConnectionHandle, DraftSlot};
