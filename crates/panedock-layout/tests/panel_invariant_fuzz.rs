//! Property/fuzz-style invariants for panel split-tree operations.
//!
//! Random operation streams run against the public PanelTree API. After each
//! step the tree must validate, rejected operations must leave it untouched,
//! and the solved layout must stay deterministic and inside the area.

use panedock_core::geometry::Rect;
use panedock_layout::{
    DockConfig, PanelId, PanelOperation, PanelRegion, PanelTree, TabId, TabKind,
};
use proptest::prelude::*;

#[derive(Debug, Clone)]
struct Lcg {
    state: u64,
}

impl Lcg {
    fn new(seed: u64) -> Self {
        Self {
            state: seed ^ 0x9E37_79B9_7F4A_7C15,
        }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1);
        self.state
    }

    fn choose_index(&mut self, len: usize) -> usize {
        debug_assert!(len > 0);
        (self.next_u64() % len as u64) as usize
    }

    fn next_unit(&mut self) -> f32 {
        (self.next_u64() >> 40) as f32 / (1u64 << 24) as f32
    }
}

const KINDS: [&str; 5] = ["scene", "game", "console", "inspector", "hierarchy"];
const REGIONS: [PanelRegion; 5] = [
    PanelRegion::Center,
    PanelRegion::Left,
    PanelRegion::Top,
    PanelRegion::Right,
    PanelRegion::Bottom,
];

fn split_ids(tree: &PanelTree) -> Vec<PanelId> {
    tree.nodes()
        .filter(|node| !node.is_leaf())
        .map(|node| node.id)
        .collect()
}

fn tab_ids(tree: &PanelTree) -> Vec<TabId> {
    tree.tabs().map(|record| record.id()).collect()
}

fn random_operation(tree: &PanelTree, rng: &mut Lcg) -> PanelOperation {
    let leaves = tree.leaves();
    let splits = split_ids(tree);
    let tabs = tab_ids(tree);
    let leaf = leaves[rng.choose_index(leaves.len())];

    let mut candidates = vec![0usize]; // OpenTab
    if !tabs.is_empty() {
        candidates.extend([1, 1, 2, 3, 3]); // MoveTab, SelectTab, Split (weighted)
    }
    if leaves.len() > 1 {
        candidates.extend([4, 5, 7]); // Merge, MergePanels, PruneEmpty
    }
    if !splits.is_empty() {
        candidates.push(6); // SetSplitRatio
    }

    match candidates[rng.choose_index(candidates.len())] {
        1 => PanelOperation::MoveTab {
            tab: tabs[rng.choose_index(tabs.len())],
            target: leaf,
        },
        2 => PanelOperation::SelectTab {
            leaf,
            tab: tabs[rng.choose_index(tabs.len())],
        },
        3 => PanelOperation::Split {
            leaf,
            tab: tabs[rng.choose_index(tabs.len())],
            region: REGIONS[rng.choose_index(REGIONS.len())],
        },
        4 => PanelOperation::Merge { leaf },
        5 => PanelOperation::MergePanels {
            first: leaf,
            second: leaves[rng.choose_index(leaves.len())],
        },
        6 => PanelOperation::SetSplitRatio {
            split: splits[rng.choose_index(splits.len())],
            ratio: rng.next_unit() * 1.4 - 0.2,
        },
        7 => PanelOperation::PruneEmpty { leaf },
        _ => PanelOperation::OpenTab {
            kind: TabKind::new(KINDS[rng.choose_index(KINDS.len())]),
            leaf,
        },
    }
}

fn assert_layout_determinism_and_bounds(tree: &PanelTree, area: Rect) {
    let first = tree.solve_layout(area).expect("valid tree should solve");
    let second = tree.solve_layout(area).expect("valid tree should solve");
    assert_eq!(first, second, "solve_layout must be deterministic");

    for leaf in tree.leaves() {
        let rect = first.panel(leaf).expect("every leaf has a rect");
        assert!(rect.x >= area.x - 0.01);
        assert!(rect.y >= area.y - 0.01);
        assert!(rect.right() <= area.right() + 0.01);
        assert!(rect.bottom() <= area.bottom() + 0.01);
        assert!(rect.width >= 0.0 && rect.height >= 0.0);
        for tab in tree.node(leaf).expect("leaf").tabs() {
            assert!(first.label(*tab).is_some(), "docked tab without a label");
        }
    }
}

fn run_sequence(seed: u64, steps: usize) -> (PanelTree, Vec<PanelOperation>) {
    let mut tree = PanelTree::new(DockConfig::default());
    let mut rng = Lcg::new(seed);
    let mut applied = Vec::with_capacity(steps);

    for step in 0..steps {
        let operation = random_operation(&tree, &mut rng);
        let operation_id = (step as u64) + 1;
        let before = tree.clone();

        match tree.apply_operation(operation_id, operation.clone()) {
            Ok(outcome) => {
                assert_eq!(outcome.after_hash, tree.state_hash());
                for removed in &outcome.removed_panels {
                    assert!(tree.node(*removed).is_none());
                }
                if let Some(survivor) = outcome.survivor {
                    assert!(tree.is_leaf(survivor), "survivor must be a leaf");
                }
                applied.push(operation.clone());
            }
            Err(err) => {
                assert_eq!(tree, before, "rejected {operation:?} mutated the tree: {err}");
                assert_eq!(err.before_hash, tree.state_hash());
            }
        }

        tree.validate().unwrap_or_else(|err| {
            panic!("tree invalid at step {step}, seed={seed}, op={operation:?}: {err}")
        });
        let extent = 200.0 + rng.next_unit() * 600.0;
        assert_layout_determinism_and_bounds(&tree, Rect::new(0.0, 0.0, extent, extent * 0.75));
    }

    (tree, applied)
}

#[test]
fn long_fixed_seed_sequence_stays_valid() {
    let (tree, applied) = run_sequence(0x5EED, 400);
    assert!(!applied.is_empty());
    assert_eq!(tree.validate(), Ok(()));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn random_operation_sequences_preserve_invariants(
        seed in any::<u64>(),
        steps in 20usize..120,
    ) {
        let (tree, _) = run_sequence(seed, steps);
        prop_assert!(tree.validate().is_ok());
    }

    #[test]
    fn random_operation_sequences_replay_deterministically(
        seed in any::<u64>(),
        steps in 20usize..80,
    ) {
        let (final_tree, operations) = run_sequence(seed, steps);

        let mut replay = PanelTree::new(DockConfig::default());
        for (idx, operation) in operations.into_iter().enumerate() {
            replay
                .apply_operation(idx as u64 + 1, operation)
                .expect("replayed operation should apply");
        }
        prop_assert_eq!(replay.state_hash(), final_tree.state_hash());
    }

    #[test]
    fn export_import_round_trips_random_trees(
        seed in any::<u64>(),
        steps in 10usize..60,
    ) {
        let (tree, _) = run_sequence(seed, steps);
        let exported = tree.to_layout_tree();
        let imported = PanelTree::from_layout_tree(&exported, DockConfig::default(), |_, _| true)
            .expect("exported tree should import");
        prop_assert!(imported.to_layout_tree().approx_eq(&exported, 1e-6));
        prop_assert_eq!(imported.tab_count(), tree.tab_count());
        prop_assert_eq!(imported.leaves().len(), tree.leaves().len());
    }
}
