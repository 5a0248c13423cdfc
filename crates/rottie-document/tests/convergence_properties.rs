mod common;

use std::collections::VecDeque;

use common::{actor, deliver, replica};
use proptest::prelude::*;
use rottie_document::{Change, Checkpoint, Document, ElementTree, Ticket};

#[derive(Debug, Clone)]
enum Edit {
    Set(u8, i32),
    Remove(u8),
    Push(i32),
    InsertHead(i32),
    RemoveAt(usize),
    Nest(u8),
}

fn edit_strategy() -> impl Strategy<Value = Edit> {
    prop_oneof![
        (0u8..3, any::<i32>()).prop_map(|(k, v)| Edit::Set(k, v)),
        (0u8..3).prop_map(Edit::Remove),
        any::<i32>().prop_map(Edit::Push),
        any::<i32>().prop_map(Edit::InsertHead),
        (0usize..4).prop_map(Edit::RemoveAt),
        (0u8..3).prop_map(Edit::Nest),
    ]
}

const KEYS: [&str; 3] = ["a", "b", "c"];

/// Apply one edit as its own change. Edits that do not fit the current
/// state (missing key, index past the end) are skipped.
fn perform(doc: &mut Document, edit: &Edit) {
    let _ = doc.update(None, |root| match edit {
        Edit::Set(k, v) => root.set(KEYS[*k as usize], *v).map(|_| ()),
        Edit::Remove(k) => root.remove(KEYS[*k as usize]),
        Edit::Push(v) => root.array("list")?.push(*v).map(|_| ()),
        Edit::InsertHead(v) => root
            .array("list")?
            .insert_after(Ticket::INITIAL, *v)
            .map(|_| ()),
        Edit::RemoveAt(i) => root.array("list")?.remove(*i),
        Edit::Nest(k) => {
            let mut obj = root.set_new_object(KEYS[*k as usize])?;
            obj.set("n", 1i32)?;
            obj.set_new_array("inner")?;
            Ok(())
        }
    });
}

/// A base document every actor has seen, then concurrent edit sessions.
fn concurrent_changes(sessions: &[Vec<Edit>]) -> (Vec<Change>, Vec<Vec<Change>>) {
    let mut seed = replica(0);
    seed.update(None, |root| {
        root.set_new_array("list")?.push(0i32)?;
        root.set("a", 0i32).map(|_| ())
    })
    .unwrap();
    let base = seed.local_changes().to_vec();

    let per_actor = sessions
        .iter()
        .enumerate()
        .map(|(i, edits)| {
            let mut doc = replica(i as u8 + 1);
            deliver(&mut doc, 1, &base);
            for edit in edits {
                perform(&mut doc, edit);
            }
            doc.local_changes().to_vec()
        })
        .collect();
    (base, per_actor)
}

/// Merge per-actor queues into one delivery order, keeping each actor's own
/// order, with `picks` choosing which actor goes next.
fn interleave(per_actor: &[Vec<Change>], picks: &[usize]) -> Vec<Change> {
    let mut queues: Vec<VecDeque<Change>> =
        per_actor.iter().map(|c| c.iter().cloned().collect()).collect();
    let mut out = Vec::new();
    let mut picks = picks.iter().cycle();
    loop {
        let open: Vec<usize> = (0..queues.len()).filter(|i| !queues[*i].is_empty()).collect();
        if open.is_empty() {
            return out;
        }
        let pick = picks.next().copied().unwrap_or(0);
        if let Some(change) = queues[open[pick % open.len()]].pop_front() {
            out.push(change);
        }
    }
}

fn replay(base: &[Change], order: &[Change]) -> ElementTree {
    let mut tree = ElementTree::new();
    for change in base.iter().chain(order) {
        tree.apply_change(change).unwrap();
    }
    tree
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn ticket_order_is_lexicographic(
        a in (any::<u64>(), any::<u32>(), any::<u8>()),
        b in (any::<u64>(), any::<u32>(), any::<u8>()),
    ) {
        let ta = Ticket::new(a.0, a.1, actor(a.2));
        let tb = Ticket::new(b.0, b.1, actor(b.2));
        prop_assert_eq!(ta.cmp(&tb), a.cmp(&b));
        prop_assert_eq!(ta.cmp(&tb), tb.cmp(&ta).reverse());
        prop_assert_eq!(ta == tb, a == b);
    }

    #[test]
    fn concurrent_changes_commute(
        sessions in prop::collection::vec(prop::collection::vec(edit_strategy(), 1..6), 2..4),
        first in prop::collection::vec(any::<usize>(), 1..16),
        second in prop::collection::vec(any::<usize>(), 1..16),
    ) {
        let (base, per_actor) = concurrent_changes(&sessions);
        let one = replay(&base, &interleave(&per_actor, &first));
        let two = replay(&base, &interleave(&per_actor, &second));
        prop_assert_eq!(one.to_json(), two.to_json());
        prop_assert_eq!(one, two);
    }

    #[test]
    fn reapplying_changes_is_idempotent(
        sessions in prop::collection::vec(prop::collection::vec(edit_strategy(), 1..6), 1..3),
    ) {
        let (base, per_actor) = concurrent_changes(&sessions);
        let all: Vec<Change> = per_actor.into_iter().flatten().collect();
        let mut tree = replay(&base, &all);
        let once = tree.clone();
        for change in base.iter().chain(&all) {
            tree.apply_change(change).unwrap();
        }
        prop_assert_eq!(tree, once);
    }

    #[test]
    fn checkpoint_never_moves_backward(
        proposals in prop::collection::vec(
            (prop::option::of(0u64..50), prop::option::of(0u64..50)),
            1..20,
        ),
    ) {
        let mut cp = Checkpoint::INITIAL;
        for (server, client) in proposals {
            let regress = server.map_or(false, |s| s < cp.server_seq())
                || client.map_or(false, |c| c < cp.client_seq());
            match cp.advance(server, client) {
                Ok(next) => {
                    prop_assert!(!regress);
                    prop_assert!(next.server_seq() >= cp.server_seq());
                    prop_assert!(next.client_seq() >= cp.client_seq());
                    cp = next;
                }
                Err(_) => prop_assert!(regress),
            }
        }
    }
}
