//! Integration tests for the draft actor.
//!
//! The pack deal is shuffled, so these tests never assert on WHICH item
//! lands in WHICH pack — they read the packs back out of the event
//! stream and assert on structure: counts, membership, and the
//! completion signal.

use std::collections::HashMap;

use draftforge_draft::{
    DraftConfig, DraftError, DraftEvent, DraftState, Drafter,
    ResourcePool, spawn_draft,
};
use draftforge_protocol::{
    DraftId, DraftMessage, DrafterName, ParticipantKey, PoolItem,
    PoolItemId,
};
use draftforge_ring::Ring;
use tokio::sync::mpsc;

// -- Helpers --------------------------------------------------------------

fn pool_of(count: u64) -> ResourcePool {
    ResourcePool::new(
        "test cube",
        (0..count)
            .map(|i| PoolItem {
                id: PoolItemId(i),
                name: format!("item-{i}"),
            })
            .collect(),
    )
}

fn drafters(names: &[&str]) -> Ring<Drafter> {
    Ring::new(names.iter().map(|n| {
        Drafter::new(DrafterName::from(*n), ParticipantKey::generate())
    }))
    .expect("non-empty")
}

/// Receives events until the next `Outbound` for `key` matching `pred`,
/// panicking if the channel closes first. Other events are discarded.
async fn next_matching(
    rx: &mut mpsc::UnboundedReceiver<DraftEvent>,
    key: ParticipantKey,
    pred: impl Fn(&DraftMessage) -> bool,
) -> DraftMessage {
    loop {
        match rx.recv().await.expect("event channel open") {
            DraftEvent::Outbound { key: k, msg }
                if k == key && pred(&msg) =>
            {
                return msg;
            }
            _ => continue,
        }
    }
}

fn is_pack_presented(msg: &DraftMessage) -> bool {
    matches!(msg, DraftMessage::PackPresented { .. })
}

// -- Start / deal ---------------------------------------------------------

#[tokio::test]
async fn test_start_presents_one_pack_per_drafter() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let ring = drafters(&["alice", "bob"]);
    let keys: Vec<ParticipantKey> =
        ring.iter().map(|d| d.key()).collect();

    let config = DraftConfig {
        pack_size: 3,
        rounds: 1,
    };
    let handle = spawn_draft(
        DraftId::generate(),
        ring,
        pool_of(6),
        config,
        tx,
    );
    handle.start().await.expect("start should succeed");

    for key in keys {
        let msg = next_matching(&mut rx, key, is_pack_presented).await;
        let DraftMessage::PackPresented { pack } = msg else {
            unreachable!()
        };
        assert_eq!(pack.len(), 3, "first pack holds pack_size items");
    }

    let info = handle.info().await.expect("info");
    assert_eq!(info.state, DraftState::Drafting);
    assert_eq!(info.round, 1);
    assert_eq!(info.drafters, 2);
}

#[tokio::test]
async fn test_start_twice_returns_not_active() {
    let (tx, _rx) = mpsc::unbounded_channel();
    let handle = spawn_draft(
        DraftId::generate(),
        drafters(&["alice"]),
        pool_of(15),
        DraftConfig {
            pack_size: 15,
            rounds: 1,
        },
        tx,
    );

    handle.start().await.expect("first start");
    let result = handle.start().await;
    assert!(matches!(result, Err(DraftError::NotActive(_))));
}

// -- Picks ----------------------------------------------------------------

#[tokio::test]
async fn test_pick_before_start_returns_not_active() {
    let (tx, _rx) = mpsc::unbounded_channel();
    let ring = drafters(&["alice"]);
    let key = ring.members()[0].key();
    let handle = spawn_draft(
        DraftId::generate(),
        ring,
        pool_of(15),
        DraftConfig::default(),
        tx,
    );

    let result = handle.pick(key, PoolItemId(0)).await;
    assert!(matches!(result, Err(DraftError::NotActive(_))));
}

#[tokio::test]
async fn test_pick_with_foreign_key_returns_unknown_drafter() {
    let (tx, _rx) = mpsc::unbounded_channel();
    let handle = spawn_draft(
        DraftId::generate(),
        drafters(&["alice"]),
        pool_of(2),
        DraftConfig {
            pack_size: 2,
            rounds: 1,
        },
        tx,
    );
    handle.start().await.unwrap();

    let forged = ParticipantKey::generate();
    let result = handle.pick(forged, PoolItemId(0)).await;
    assert!(
        matches!(result, Err(DraftError::UnknownDrafter(k)) if k == forged)
    );
}

#[tokio::test]
async fn test_pick_item_not_in_pack_is_rejected() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let ring = drafters(&["alice"]);
    let key = ring.members()[0].key();
    let handle = spawn_draft(
        DraftId::generate(),
        ring,
        pool_of(2),
        DraftConfig {
            pack_size: 2,
            rounds: 1,
        },
        tx,
    );
    handle.start().await.unwrap();
    let _ = next_matching(&mut rx, key, is_pack_presented).await;

    // Item ids run 0..2, so 999 can't be in the pack.
    let result = handle.pick(key, PoolItemId(999)).await;
    assert!(matches!(
        result,
        Err(DraftError::ItemNotInPack(PoolItemId(999)))
    ));
}

#[tokio::test]
async fn test_pick_records_item_and_presents_remainder_to_solo_drafter() {
    // A solo drafter passes packs to themselves: after each pick the
    // remainder comes straight back around.
    let (tx, mut rx) = mpsc::unbounded_channel();
    let ring = drafters(&["alice"]);
    let key = ring.members()[0].key();
    let handle = spawn_draft(
        DraftId::generate(),
        ring,
        pool_of(2),
        DraftConfig {
            pack_size: 2,
            rounds: 1,
        },
        tx,
    );
    handle.start().await.unwrap();

    let DraftMessage::PackPresented { pack } =
        next_matching(&mut rx, key, is_pack_presented).await
    else {
        unreachable!()
    };
    let first = pack.items[0].clone();

    let picked = handle.pick(key, first.id).await.expect("pick");
    assert_eq!(picked, first);

    // The one-item remainder wraps around to the same seat.
    let DraftMessage::PackPresented { pack } =
        next_matching(&mut rx, key, is_pack_presented).await
    else {
        unreachable!()
    };
    assert_eq!(pack.len(), 1);
    assert!(!pack.items.contains(&first), "picked item left the pack");
}

#[tokio::test]
async fn test_pick_with_empty_queue_returns_no_pack_queued() {
    // Two drafters: after alice's first pick her queue is empty until
    // bob passes her something.
    let (tx, mut rx) = mpsc::unbounded_channel();
    let ring = drafters(&["alice", "bob"]);
    let alice = ring.members()[0].key();
    let handle = spawn_draft(
        DraftId::generate(),
        ring,
        pool_of(4),
        DraftConfig {
            pack_size: 2,
            rounds: 1,
        },
        tx,
    );
    handle.start().await.unwrap();

    let DraftMessage::PackPresented { pack } =
        next_matching(&mut rx, alice, is_pack_presented).await
    else {
        unreachable!()
    };
    handle.pick(alice, pack.items[0].id).await.expect("pick");

    let result = handle.pick(alice, pack.items[1].id).await;
    assert!(matches!(result, Err(DraftError::NoPackQueued)));
}

// -- Resync ---------------------------------------------------------------

#[tokio::test]
async fn test_resync_reports_current_pack_and_picks() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let ring = drafters(&["alice"]);
    let key = ring.members()[0].key();
    let handle = spawn_draft(
        DraftId::generate(),
        ring,
        pool_of(3),
        DraftConfig {
            pack_size: 3,
            rounds: 1,
        },
        tx,
    );
    handle.start().await.unwrap();

    let DraftMessage::PackPresented { pack } =
        next_matching(&mut rx, key, is_pack_presented).await
    else {
        unreachable!()
    };
    let picked = handle.pick(key, pack.items[0].id).await.unwrap();

    let snapshot = handle.resync(key).await.expect("resync");
    assert_eq!(snapshot.state, DraftState::Drafting);
    assert_eq!(snapshot.round, 1);
    assert_eq!(snapshot.picks, vec![picked]);
    let current = snapshot.pack.expect("remainder wrapped back around");
    assert_eq!(current.len(), 2);
}

#[tokio::test]
async fn test_resync_with_foreign_key_returns_unknown_drafter() {
    let (tx, _rx) = mpsc::unbounded_channel();
    let handle = spawn_draft(
        DraftId::generate(),
        drafters(&["alice"]),
        pool_of(15),
        DraftConfig::default(),
        tx,
    );

    let forged = ParticipantKey::generate();
    let result = handle.resync(forged).await;
    assert!(matches!(result, Err(DraftError::UnknownDrafter(_))));
}

// -- Full drafts ----------------------------------------------------------

/// Drives a draft to completion by picking the first item of every pack
/// the moment it is presented. Returns the picks each drafter ended up
/// with and asserts the completion signal arrived.
async fn drive_to_completion(
    names: &[&str],
    config: DraftConfig,
) -> HashMap<ParticipantKey, Vec<PoolItem>> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let ring = drafters(names);
    let pool = pool_of(config.items_needed(names.len()) as u64);
    let pool_items = pool.items.clone();
    let draft_id = DraftId::generate();
    let handle = spawn_draft(draft_id, ring, pool, config, tx);
    handle.start().await.expect("start");

    let mut completed: HashMap<ParticipantKey, Vec<PoolItem>> =
        HashMap::new();
    loop {
        match rx.recv().await.expect("event channel open") {
            DraftEvent::Outbound {
                key,
                msg: DraftMessage::PackPresented { pack },
            } => {
                handle
                    .pick(key, pack.items[0].id)
                    .await
                    .expect("presented pack is pickable");
            }
            DraftEvent::Outbound {
                key,
                msg: DraftMessage::DraftCompleted { picks },
            } => {
                completed.insert(key, picks);
            }
            DraftEvent::Completed { draft_id: id } => {
                assert_eq!(id, draft_id);
                break;
            }
            _ => continue,
        }
    }

    // Every dealt item was drafted by exactly one seat.
    let mut all: Vec<PoolItem> =
        completed.values().flatten().cloned().collect();
    all.sort_by_key(|i| i.id.0);
    let mut expected = pool_items;
    expected.sort_by_key(|i| i.id.0);
    assert_eq!(all, expected, "picks partition the dealt pool");

    let info = handle.info().await.expect("actor still answers");
    assert_eq!(info.state, DraftState::Finished);

    completed
}

#[tokio::test]
async fn test_two_drafter_draft_runs_to_completion() {
    let picks = drive_to_completion(
        &["alice", "bob"],
        DraftConfig {
            pack_size: 2,
            rounds: 1,
        },
    )
    .await;

    assert_eq!(picks.len(), 2);
    for seat_picks in picks.values() {
        assert_eq!(seat_picks.len(), 2, "pack_size picks per round");
    }
}

#[tokio::test]
async fn test_three_drafter_multi_round_draft_completes() {
    // Two rounds exercise both passing directions (succ then pred).
    let picks = drive_to_completion(
        &["alice", "bob", "carol"],
        DraftConfig {
            pack_size: 3,
            rounds: 2,
        },
    )
    .await;

    assert_eq!(picks.len(), 3);
    for seat_picks in picks.values() {
        assert_eq!(seat_picks.len(), 6, "rounds x pack_size picks each");
    }
}

#[tokio::test]
async fn test_pick_after_completion_returns_not_active() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let ring = drafters(&["alice"]);
    let key = ring.members()[0].key();
    let handle = spawn_draft(
        DraftId::generate(),
        ring,
        pool_of(1),
        DraftConfig {
            pack_size: 1,
            rounds: 1,
        },
        tx,
    );
    handle.start().await.unwrap();

    let DraftMessage::PackPresented { pack } =
        next_matching(&mut rx, key, is_pack_presented).await
    else {
        unreachable!()
    };
    handle.pick(key, pack.items[0].id).await.expect("only pick");

    let result = handle.pick(key, pack.items[0].id).await;
    assert!(matches!(result, Err(DraftError::NotActive(_))));
}
