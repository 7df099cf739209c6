use std::collections::HashSet;

use proptest::prelude::*;

use notebook::{BlockId, BlockInitializer, BlockType, Direction, Notebook};

#[derive(Debug, Clone)]
enum Op {
    Insert(usize, BlockType),
    Delete(usize),
    Move(usize, Direction),
    Duplicate(usize),
}

fn arb_block_type() -> impl Strategy<Value = BlockType> {
    prop_oneof![Just(BlockType::Markdown), Just(BlockType::Query)]
}

fn arb_direction() -> impl Strategy<Value = Direction> {
    prop_oneof![Just(Direction::Up), Just(Direction::Down)]
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..12usize, arb_block_type()).prop_map(|(i, t)| Op::Insert(i, t)),
        (0..12usize).prop_map(Op::Delete),
        (0..12usize, arb_direction()).prop_map(|(i, d)| Op::Move(i, d)),
        (0..12usize).prop_map(Op::Duplicate),
    ]
}

/// Resolve a position to an id; positions past the end produce a stale id.
fn id_at(notebook: &Notebook, index: usize) -> BlockId {
    notebook
        .blocks()
        .get(index)
        .map(|b| b.id.clone())
        .unwrap_or_else(BlockId::generate)
}

fn ids(notebook: &Notebook) -> Vec<BlockId> {
    notebook.blocks().iter().map(|b| b.id.clone()).collect()
}

proptest! {
    /// Ids stay unique and each one came from exactly one creating call.
    #[test]
    fn prop_ids_unique_and_created_once(ops in prop::collection::vec(arb_op(), 0..40)) {
        let mut nb = Notebook::new([BlockInitializer::markdown("seed")]);
        let mut created: Vec<BlockId> = ids(&nb);

        for op in ops {
            match op {
                Op::Insert(i, t) => {
                    created.push(nb.insert_block_at_index(i, t, "x").id.clone());
                }
                Op::Delete(i) => {
                    let id = id_at(&nb, i);
                    nb.delete_block_by_id(&id);
                }
                Op::Move(i, d) => {
                    let id = id_at(&nb, i);
                    nb.move_block_by_id(&id, d);
                }
                Op::Duplicate(i) => {
                    let id = id_at(&nb, i);
                    if let Some(copy) = nb.duplicate_block_by_id(&id) {
                        created.push(copy.id.clone());
                    }
                }
            }

            let current = ids(&nb);
            let unique: HashSet<_> = current.iter().collect();
            prop_assert_eq!(unique.len(), current.len());
            for id in &current {
                prop_assert_eq!(created.iter().filter(|c| *c == id).count(), 1);
            }
        }
    }

    #[test]
    fn prop_adjacency_round_trip(len in 1..10usize, pick in 0..10usize) {
        let nb = Notebook::new((0..len).map(|i| BlockInitializer::query(i.to_string())));
        let id = id_at(&nb, pick % len);
        if let Some(next) = nb.next_block_id(&id) {
            prop_assert_eq!(nb.previous_block_id(next), Some(&id));
        } else {
            prop_assert_eq!(nb.index_of(&id), Some(len - 1));
        }
    }

    #[test]
    fn prop_delete_shrinks_by_one_iff_present(len in 0..8usize, pick in 0..12usize) {
        let mut nb = Notebook::new((0..len).map(|i| BlockInitializer::markdown(i.to_string())));
        let id = id_at(&nb, pick);
        let present = nb.contains(&id);
        nb.delete_block_by_id(&id);
        let expected = if present { len - 1 } else { len };
        prop_assert_eq!(nb.len(), expected);
    }

    #[test]
    fn prop_move_up_swaps_with_predecessor(len in 1..8usize, pick in 0..8usize) {
        let mut nb = Notebook::new((0..len).map(|i| BlockInitializer::markdown(i.to_string())));
        let index = pick % len;
        let before = ids(&nb);
        nb.move_block_by_id(&before[index], Direction::Up);
        let after = ids(&nb);

        let mut expected = before.clone();
        if index > 0 {
            expected.swap(index, index - 1);
        }
        prop_assert_eq!(after, expected);
    }

    #[test]
    fn prop_duplicate_inserts_after_source(len in 1..8usize, pick in 0..8usize) {
        let mut nb = Notebook::new((0..len).map(|i| BlockInitializer::query(i.to_string())));
        let index = pick % len;
        let source = nb.blocks()[index].clone();
        let copy = nb.duplicate_block_by_id(&source.id).cloned();

        let copy = copy.expect("source exists");
        prop_assert_eq!(nb.len(), len + 1);
        prop_assert_ne!(&copy.id, &source.id);
        prop_assert_eq!(copy.block_type(), source.block_type());
        prop_assert_eq!(&copy.input, &source.input);
        prop_assert_eq!(nb.index_of(&copy.id), Some(index + 1));
    }
}
