#![forbid(unsafe_code)]

//! Panel split tree.
//!
//! A [`PanelTree`] is an arena of [`PanelNode`]s keyed by [`PanelId`]. Every
//! node is either a leaf hosting an ordered list of tabs, or a split node with
//! exactly two children laid out along a [`SplitOrientation`]. Tabs are
//! tracked separately as [`TabRecord`]s whose back reference always names the
//! leaf that lists them.
//!
//! All structural edits go through [`PanelTree::apply_operation`], which
//! mutates a working copy, re-validates every invariant and commits only on
//! success. A failed operation leaves the tree untouched.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::DockConfig;
use crate::grid::FlexWeight;
use crate::region::PanelRegion;
use crate::tab::{TabId, TabKind, TabRecord};
use crate::tree::{LayoutTree, LayoutTreeError, SplitOrientation};

const LOG_TARGET: &str = "panedock.panel";

/// Stable identifier for a panel node.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PanelId(u64);

impl PanelId {
    /// Lowest valid panel ID.
    pub const MIN: Self = Self(1);

    /// Create a new panel ID, rejecting 0.
    pub fn new(raw: u64) -> Result<Self, PanelModelError> {
        if raw == 0 {
            return Err(PanelModelError::ZeroPanelId);
        }
        Ok(Self(raw))
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Return the next ID, or an error on overflow.
    pub fn checked_next(self) -> Result<Self, PanelModelError> {
        let Some(next) = self.0.checked_add(1) else {
            return Err(PanelModelError::PanelIdOverflow { current: self });
        };
        Self::new(next)
    }
}

impl Default for PanelId {
    fn default() -> Self {
        Self::MIN
    }
}

impl fmt::Display for PanelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "panel#{}", self.0)
    }
}

/// Leaf or split payload of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelContent {
    Leaf { tabs: Vec<TabId>, selected: usize },
    Split { first: PanelId, second: PanelId },
}

/// One node of the panel tree.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelNode {
    pub id: PanelId,
    pub parent: Option<PanelId>,
    /// Split axis. Leaves keep theirs so exports round-trip.
    pub orientation: SplitOrientation,
    /// Share of space given to the first child.
    pub ratio: f32,
    /// Weight this node contributes to its parent's grid.
    pub flex: FlexWeight,
    pub content: PanelContent,
}

impl PanelNode {
    fn leaf(id: PanelId, parent: Option<PanelId>, tabs: Vec<TabId>, selected: usize) -> Self {
        Self {
            id,
            parent,
            orientation: SplitOrientation::default(),
            ratio: 0.5,
            flex: FlexWeight::default(),
            content: PanelContent::Leaf { tabs, selected },
        }
    }

    #[must_use]
    pub fn is_leaf(&self) -> bool {
        matches!(self.content, PanelContent::Leaf { .. })
    }

    /// Tabs hosted by this node; always empty for splits.
    #[must_use]
    pub fn tabs(&self) -> &[TabId] {
        match &self.content {
            PanelContent::Leaf { tabs, .. } => tabs,
            PanelContent::Split { .. } => &[],
        }
    }

    /// Selected tab of a non-empty leaf.
    #[must_use]
    pub fn selected_tab(&self) -> Option<TabId> {
        match &self.content {
            PanelContent::Leaf { tabs, selected } => tabs.get(*selected).copied(),
            PanelContent::Split { .. } => None,
        }
    }

    #[must_use]
    pub fn children(&self) -> Option<(PanelId, PanelId)> {
        match self.content {
            PanelContent::Split { first, second } => Some((first, second)),
            PanelContent::Leaf { .. } => None,
        }
    }
}

/// One structural edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PanelOperation {
    /// Create a tab of `kind` in `leaf` and select it.
    OpenTab { kind: TabKind, leaf: PanelId },
    /// Append `tab` to `target`, removing it from its current leaf.
    MoveTab { tab: TabId, target: PanelId },
    /// Make `tab` the selected tab of `leaf`.
    SelectTab { leaf: PanelId, tab: TabId },
    /// Split `leaf` and put `tab` alone on the `region` side.
    Split {
        leaf: PanelId,
        tab: TabId,
        region: PanelRegion,
    },
    /// Collapse the parent of `leaf` into one node.
    Merge { leaf: PanelId },
    /// Collapse the common parent of two siblings.
    MergePanels { first: PanelId, second: PanelId },
    /// Set the ratio of `split`, clamped into the configured range.
    SetSplitRatio { split: PanelId, ratio: f32 },
    /// Merge an empty non-root leaf away.
    PruneEmpty { leaf: PanelId },
}

impl PanelOperation {
    #[must_use]
    pub const fn kind(&self) -> PanelOperationKind {
        match self {
            Self::OpenTab { .. } => PanelOperationKind::OpenTab,
            Self::MoveTab { .. } => PanelOperationKind::MoveTab,
            Self::SelectTab { .. } => PanelOperationKind::SelectTab,
            Self::Split { .. } => PanelOperationKind::Split,
            Self::Merge { .. } => PanelOperationKind::Merge,
            Self::MergePanels { .. } => PanelOperationKind::MergePanels,
            Self::SetSplitRatio { .. } => PanelOperationKind::SetSplitRatio,
            Self::PruneEmpty { .. } => PanelOperationKind::PruneEmpty,
        }
    }

    /// Panels named directly by the operation.
    #[must_use]
    pub fn referenced_panels(&self) -> Vec<PanelId> {
        match self {
            Self::OpenTab { leaf, .. }
            | Self::SelectTab { leaf, .. }
            | Self::Split { leaf, .. }
            | Self::Merge { leaf }
            | Self::PruneEmpty { leaf } => vec![*leaf],
            Self::MoveTab { target, .. } => vec![*target],
            Self::MergePanels { first, second } => vec![*first, *second],
            Self::SetSplitRatio { split, .. } => vec![*split],
        }
    }
}

/// Operation discriminator used in outcomes and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelOperationKind {
    OpenTab,
    MoveTab,
    SelectTab,
    Split,
    Merge,
    MergePanels,
    SetSplitRatio,
    PruneEmpty,
}

impl PanelOperationKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OpenTab => "open_tab",
            Self::MoveTab => "move_tab",
            Self::SelectTab => "select_tab",
            Self::Split => "split",
            Self::Merge => "merge",
            Self::MergePanels => "merge_panels",
            Self::SetSplitRatio => "set_split_ratio",
            Self::PruneEmpty => "prune_empty",
        }
    }
}

/// Successful operation result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelOperationOutcome {
    pub operation_id: u64,
    pub kind: PanelOperationKind,
    /// Surviving panels whose content or geometry changed.
    pub touched_panels: Vec<PanelId>,
    /// Panels destroyed by the operation.
    pub removed_panels: Vec<PanelId>,
    /// Leaf that now holds the content of a removed or split panel.
    pub survivor: Option<PanelId>,
    /// Tab created by [`PanelOperation::OpenTab`].
    pub created_tab: Option<TabId>,
    pub before_hash: u64,
    pub after_hash: u64,
}

impl PanelOperationOutcome {
    #[must_use]
    pub fn changed(&self) -> bool {
        self.before_hash != self.after_hash
    }
}

/// Operation failure with the state hash it was attempted against.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelOperationError {
    pub operation_id: u64,
    pub kind: PanelOperationKind,
    pub touched_panels: Vec<PanelId>,
    pub before_hash: u64,
    pub reason: PanelOperationFailure,
}

impl fmt::Display for PanelOperationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "panel operation {} ({}) failed: {}",
            self.operation_id,
            self.kind.as_str(),
            self.reason
        )
    }
}

impl std::error::Error for PanelOperationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.reason)
    }
}

/// Structured reasons for operation failure.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelOperationFailure {
    MissingPanel { panel: PanelId },
    MissingTab { tab: TabId },
    NodeNotLeaf { panel: PanelId },
    NodeNotSplit { panel: PanelId },
    TabNotDocked { tab: TabId, panel: PanelId },
    CenterRegion { panel: PanelId },
    NothingToSplit { panel: PanelId },
    CannotMergeRoot { panel: PanelId },
    BothChildrenSplit { panel: PanelId },
    NotSiblings { first: PanelId, second: PanelId },
    PanelNotEmpty { panel: PanelId, tab_count: usize },
    IdOverflow(PanelModelError),
    Validation(PanelModelError),
}

impl fmt::Display for PanelOperationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingPanel { panel } => write!(f, "{panel} not found"),
            Self::MissingTab { tab } => write!(f, "{tab} not found"),
            Self::NodeNotLeaf { panel } => write!(f, "{panel} is not a leaf"),
            Self::NodeNotSplit { panel } => write!(f, "{panel} is not a split"),
            Self::TabNotDocked { tab, panel } => write!(f, "{tab} is not docked in {panel}"),
            Self::CenterRegion { panel } => {
                write!(f, "cannot split {panel} on its center region")
            }
            Self::NothingToSplit { panel } => {
                write!(f, "{panel} would have no tabs left after the split")
            }
            Self::CannotMergeRoot { panel } => write!(f, "{panel} is the root and has no parent"),
            Self::BothChildrenSplit { panel } => {
                write!(f, "both children of {panel} are splits")
            }
            Self::NotSiblings { first, second } => {
                write!(f, "{first} and {second} are not siblings")
            }
            Self::PanelNotEmpty { panel, tab_count } => {
                write!(f, "{panel} still hosts {tab_count} tabs")
            }
            Self::IdOverflow(err) => write!(f, "id allocation failed: {err}"),
            Self::Validation(err) => write!(f, "invariant violated: {err}"),
        }
    }
}

impl std::error::Error for PanelOperationFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::IdOverflow(err) | Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

/// Invariant violations found by [`PanelTree::validate`].
#[derive(Debug, Clone, PartialEq)]
pub enum PanelModelError {
    ZeroPanelId,
    ZeroTabId,
    PanelIdOverflow {
        current: PanelId,
    },
    TabIdOverflow {
        current: TabId,
    },
    MissingRoot {
        root: PanelId,
    },
    RootHasParent {
        root: PanelId,
        parent: PanelId,
    },
    MissingChild {
        parent: PanelId,
        child: PanelId,
    },
    DuplicateSplitChildren {
        parent: PanelId,
        child: PanelId,
    },
    ParentMismatch {
        node: PanelId,
        expected: PanelId,
        actual: Option<PanelId>,
    },
    CycleDetected {
        node: PanelId,
    },
    UnreachableNode {
        node: PanelId,
    },
    RatioOutOfRange {
        panel: PanelId,
        ratio: f32,
    },
    SelectionOutOfRange {
        panel: PanelId,
        selected: usize,
        tab_count: usize,
    },
    MissingTab {
        panel: PanelId,
        tab: TabId,
    },
    DuplicateTab {
        tab: TabId,
    },
    TabOwnerMismatch {
        tab: TabId,
        listed_in: PanelId,
        recorded: PanelId,
    },
    OrphanTab {
        tab: TabId,
    },
    NextPanelIdNotGreater {
        next: PanelId,
        max: PanelId,
    },
    NextTabIdNotGreater {
        next: TabId,
        max: TabId,
    },
}

impl fmt::Display for PanelModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroPanelId => write!(f, "panel id 0 is reserved"),
            Self::ZeroTabId => write!(f, "tab id 0 is reserved"),
            Self::PanelIdOverflow { current } => write!(f, "panel id overflow after {current}"),
            Self::TabIdOverflow { current } => write!(f, "tab id overflow after {current}"),
            Self::MissingRoot { root } => write!(f, "root {root} not found"),
            Self::RootHasParent { root, parent } => {
                write!(f, "root {root} has parent {parent}")
            }
            Self::MissingChild { parent, child } => {
                write!(f, "split {parent} references missing child {child}")
            }
            Self::DuplicateSplitChildren { parent, child } => {
                write!(f, "split {parent} lists {child} twice")
            }
            Self::ParentMismatch {
                node,
                expected,
                actual,
            } => write!(
                f,
                "{node} should have parent {expected}, found {actual:?}"
            ),
            Self::CycleDetected { node } => write!(f, "cycle detected at {node}"),
            Self::UnreachableNode { node } => write!(f, "{node} is unreachable from the root"),
            Self::RatioOutOfRange { panel, ratio } => {
                write!(f, "split {panel} has ratio {ratio} outside the allowed range")
            }
            Self::SelectionOutOfRange {
                panel,
                selected,
                tab_count,
            } => write!(
                f,
                "{panel} selects index {selected} but hosts {tab_count} tabs"
            ),
            Self::MissingTab { panel, tab } => write!(f, "{panel} lists unknown {tab}"),
            Self::DuplicateTab { tab } => write!(f, "{tab} is listed more than once"),
            Self::TabOwnerMismatch {
                tab,
                listed_in,
                recorded,
            } => write!(f, "{tab} is listed in {listed_in} but records {recorded}"),
            Self::OrphanTab { tab } => write!(f, "{tab} is not listed by any leaf"),
            Self::NextPanelIdNotGreater { next, max } => {
                write!(f, "next panel id {next} is not greater than {max}")
            }
            Self::NextTabIdNotGreater { next, max } => {
                write!(f, "next tab id {next} is not greater than {max}")
            }
        }
    }
}

impl std::error::Error for PanelModelError {}

#[derive(Debug, Default)]
struct OperationEffects {
    touched: BTreeSet<PanelId>,
    removed: BTreeSet<PanelId>,
    survivor: Option<PanelId>,
    created_tab: Option<TabId>,
}

/// Mutable binary split tree of tabbed panels.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelTree {
    config: DockConfig,
    root: PanelId,
    next_panel: PanelId,
    next_tab: TabId,
    nodes: BTreeMap<PanelId, PanelNode>,
    tabs: BTreeMap<TabId, TabRecord>,
}

impl Default for PanelTree {
    fn default() -> Self {
        Self::new(DockConfig::default())
    }
}

impl PanelTree {
    /// A tree holding one empty root leaf.
    #[must_use]
    pub fn new(config: DockConfig) -> Self {
        let root = PanelId::MIN;
        let mut nodes = BTreeMap::new();
        nodes.insert(root, PanelNode::leaf(root, None, Vec::new(), 0));
        Self {
            config,
            root,
            next_panel: PanelId(root.0 + 1),
            next_tab: TabId::MIN,
            nodes,
            tabs: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &DockConfig {
        &self.config
    }

    #[must_use]
    pub const fn root(&self) -> PanelId {
        self.root
    }

    #[must_use]
    pub fn node(&self, id: PanelId) -> Option<&PanelNode> {
        self.nodes.get(&id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &PanelNode> {
        self.nodes.values()
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn tab(&self, id: TabId) -> Option<&TabRecord> {
        self.tabs.get(&id)
    }

    pub fn tabs(&self) -> impl Iterator<Item = &TabRecord> {
        self.tabs.values()
    }

    #[must_use]
    pub fn tab_count(&self) -> usize {
        self.tabs.len()
    }

    #[must_use]
    pub fn is_leaf(&self, id: PanelId) -> bool {
        self.nodes.get(&id).is_some_and(PanelNode::is_leaf)
    }

    /// All nodes of the subtree at `from` in depth-first pre-order.
    #[must_use]
    pub fn depth_first(&self, from: PanelId) -> Vec<PanelId> {
        let mut out = Vec::new();
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            out.push(id);
            if let Some((first, second)) = node.children() {
                stack.push(second);
                stack.push(first);
            }
        }
        out
    }

    /// Leaves in depth-first order.
    #[must_use]
    pub fn leaves(&self) -> Vec<PanelId> {
        self.depth_first(self.root)
            .into_iter()
            .filter(|id| self.is_leaf(*id))
            .collect()
    }

    /// First leaf of the subtree at `from` in depth-first order.
    #[must_use]
    pub fn first_leaf(&self, from: PanelId) -> Option<PanelId> {
        let mut current = from;
        loop {
            match self.nodes.get(&current)?.content {
                PanelContent::Leaf { .. } => return Some(current),
                PanelContent::Split { first, .. } => current = first,
            }
        }
    }

    /// The other child of this node's parent.
    #[must_use]
    pub fn sibling(&self, id: PanelId) -> Option<PanelId> {
        let parent = self.nodes.get(&id)?.parent?;
        let (first, second) = self.nodes.get(&parent)?.children()?;
        if first == id { Some(second) } else { Some(first) }
    }

    /// Leaf currently hosting `tab`.
    #[must_use]
    pub fn panel_of(&self, tab: TabId) -> Option<PanelId> {
        self.tabs.get(&tab).map(TabRecord::panel)
    }

    /// First tab of `kind` in tree order.
    #[must_use]
    pub fn find_tab(&self, kind: &TabKind) -> Option<TabId> {
        self.leaves().into_iter().find_map(|leaf| {
            self.nodes.get(&leaf)?.tabs().iter().copied().find(|tab| {
                self.tabs
                    .get(tab)
                    .is_some_and(|record| record.kind() == kind)
            })
        })
    }

    /// Apply one operation atomically.
    pub fn apply_operation(
        &mut self,
        operation_id: u64,
        operation: PanelOperation,
    ) -> Result<PanelOperationOutcome, PanelOperationError> {
        let kind = operation.kind();
        let before_hash = self.state_hash();
        let mut working = self.clone();
        let mut effects = OperationEffects::default();
        effects.touched.extend(operation.referenced_panels());

        let result = working
            .apply_operation_inner(operation, &mut effects)
            .and_then(|()| working.validate().map_err(PanelOperationFailure::Validation));
        if let Err(reason) = result {
            return Err(PanelOperationError {
                operation_id,
                kind,
                touched_panels: effects.touched.into_iter().collect(),
                before_hash,
                reason,
            });
        }

        let after_hash = working.state_hash();
        *self = working;

        let removed = effects.removed;
        let touched = effects
            .touched
            .into_iter()
            .filter(|id| !removed.contains(id))
            .collect();
        tracing::trace!(
            target: LOG_TARGET,
            operation_id,
            op = kind.as_str(),
            before_hash,
            after_hash,
            "applied panel operation"
        );

        Ok(PanelOperationOutcome {
            operation_id,
            kind,
            touched_panels: touched,
            removed_panels: removed.into_iter().collect(),
            survivor: effects.survivor,
            created_tab: effects.created_tab,
            before_hash,
            after_hash,
        })
    }

    fn apply_operation_inner(
        &mut self,
        operation: PanelOperation,
        effects: &mut OperationEffects,
    ) -> Result<(), PanelOperationFailure> {
        match operation {
            PanelOperation::OpenTab { kind, leaf } => self.open_tab(kind, leaf, effects),
            PanelOperation::MoveTab { tab, target } => self.move_tab(tab, target, effects),
            PanelOperation::SelectTab { leaf, tab } => self.select_tab(leaf, tab),
            PanelOperation::Split { leaf, tab, region } => self.split(leaf, tab, region, effects),
            PanelOperation::Merge { leaf } => {
                let parent = self
                    .node_ref(leaf)?
                    .parent
                    .ok_or(PanelOperationFailure::CannotMergeRoot { panel: leaf })?;
                self.merge_children(parent, effects)
            }
            PanelOperation::MergePanels { first, second } => {
                let first_parent = self.node_ref(first)?.parent;
                let second_parent = self.node_ref(second)?.parent;
                match (first_parent, second_parent) {
                    (Some(a), Some(b)) if a == b && first != second => {
                        self.merge_children(a, effects)
                    }
                    _ => Err(PanelOperationFailure::NotSiblings { first, second }),
                }
            }
            PanelOperation::SetSplitRatio { split, ratio } => {
                self.set_ratio(split, ratio)?;
                effects.touched.extend(self.children_of(split).map(|(a, b)| [a, b])?);
                Ok(())
            }
            PanelOperation::PruneEmpty { leaf } => {
                let tab_count = self.leaf_tabs(leaf)?.len();
                if tab_count > 0 {
                    return Err(PanelOperationFailure::PanelNotEmpty {
                        panel: leaf,
                        tab_count,
                    });
                }
                let parent = self
                    .node_ref(leaf)?
                    .parent
                    .ok_or(PanelOperationFailure::CannotMergeRoot { panel: leaf })?;
                self.merge_children(parent, effects)
            }
        }
    }

    fn open_tab(
        &mut self,
        kind: TabKind,
        leaf: PanelId,
        effects: &mut OperationEffects,
    ) -> Result<(), PanelOperationFailure> {
        self.leaf_tabs(leaf)?;
        let tab = self
            .allocate_tab()
            .map_err(PanelOperationFailure::IdOverflow)?;
        self.tabs.insert(tab, TabRecord::new(tab, kind, leaf));
        let (tabs, selected) = self.leaf_parts_mut(leaf)?;
        tabs.push(tab);
        *selected = tabs.len() - 1;
        effects.created_tab = Some(tab);
        Ok(())
    }

    fn move_tab(
        &mut self,
        tab: TabId,
        target: PanelId,
        effects: &mut OperationEffects,
    ) -> Result<(), PanelOperationFailure> {
        self.leaf_tabs(target)?;
        let source = self.tab_panel(tab)?;
        if source == target {
            return Ok(());
        }
        self.detach_tab(tab)?;
        self.attach_tab(tab, target)?;
        effects.touched.insert(source);
        Ok(())
    }

    fn select_tab(&mut self, leaf: PanelId, tab: TabId) -> Result<(), PanelOperationFailure> {
        let (tabs, selected) = self.leaf_parts_mut(leaf)?;
        let index = tabs
            .iter()
            .position(|candidate| *candidate == tab)
            .ok_or(PanelOperationFailure::TabNotDocked { tab, panel: leaf })?;
        *selected = index;
        Ok(())
    }

    fn split(
        &mut self,
        leaf: PanelId,
        tab: TabId,
        region: PanelRegion,
        effects: &mut OperationEffects,
    ) -> Result<(), PanelOperationFailure> {
        let Some(orientation) = region.orientation() else {
            return Err(PanelOperationFailure::CenterRegion { panel: leaf });
        };
        let leaf_tab_count = self.leaf_tabs(leaf)?.len();
        let source = self.tab_panel(tab)?;

        // Dragging the only tab out of the sibling would leave an empty leaf
        // next to the new split; collapse the pair and split one level up.
        let parent = self.node_ref(leaf)?.parent;
        if let Some(parent) = parent {
            let sibling_source = source != leaf && self.sibling(leaf) == Some(source);
            if sibling_source && self.leaf_tabs(source)?.len() == 1 {
                if leaf_tab_count == 0 {
                    return Err(PanelOperationFailure::NothingToSplit { panel: leaf });
                }
                self.merge_children(parent, effects)?;
                return self.split_leaf(parent, tab, region, orientation, effects);
            }
        }

        self.split_leaf(leaf, tab, region, orientation, effects)
    }

    fn split_leaf(
        &mut self,
        leaf: PanelId,
        tab: TabId,
        region: PanelRegion,
        orientation: SplitOrientation,
        effects: &mut OperationEffects,
    ) -> Result<(), PanelOperationFailure> {
        let source = self.tab_panel(tab)?;
        let remaining = self
            .leaf_tabs(leaf)?
            .iter()
            .filter(|candidate| **candidate != tab)
            .count();
        if remaining == 0 {
            return Err(PanelOperationFailure::NothingToSplit { panel: leaf });
        }

        self.detach_tab(tab)?;
        effects.touched.insert(source);

        let old_id = self
            .allocate_panel()
            .map_err(PanelOperationFailure::IdOverflow)?;
        let new_id = self
            .allocate_panel()
            .map_err(PanelOperationFailure::IdOverflow)?;
        let insert = self.config.split_insert_ratio;
        let (first, second, ratio) = if region.incoming_first() {
            (new_id, old_id, insert)
        } else {
            (old_id, new_id, 1.0 - insert)
        };

        let node = self.node_mut(leaf)?;
        let (old_tabs, old_selected) = match &mut node.content {
            PanelContent::Leaf { tabs, selected } => (std::mem::take(tabs), *selected),
            PanelContent::Split { .. } => {
                return Err(PanelOperationFailure::NodeNotLeaf { panel: leaf });
            }
        };
        node.content = PanelContent::Split { first, second };
        node.orientation = orientation;

        for moved in &old_tabs {
            self.tab_mut(*moved)?.set_panel(old_id);
        }
        self.tab_mut(tab)?.set_panel(new_id);
        self.nodes.insert(
            old_id,
            PanelNode::leaf(old_id, Some(leaf), old_tabs, old_selected),
        );
        self.nodes
            .insert(new_id, PanelNode::leaf(new_id, Some(leaf), vec![tab], 0));
        self.set_ratio(leaf, ratio)?;

        effects.touched.extend([leaf, old_id, new_id]);
        effects.survivor = Some(new_id);
        Ok(())
    }

    fn merge_children(
        &mut self,
        parent: PanelId,
        effects: &mut OperationEffects,
    ) -> Result<(), PanelOperationFailure> {
        let (first, second) = self.children_of(parent)?;
        match (self.is_leaf(first), self.is_leaf(second)) {
            (true, true) => {
                let (mut tabs, first_selected) = self.take_leaf(first)?;
                let (second_tabs, second_selected) = self.take_leaf(second)?;
                let selected = if tabs.is_empty() {
                    if second_tabs.is_empty() { 0 } else { second_selected }
                } else {
                    first_selected
                };
                tabs.extend(second_tabs);
                for tab in &tabs {
                    self.tab_mut(*tab)?.set_panel(parent);
                }
                self.node_mut(parent)?.content = PanelContent::Leaf { tabs, selected };

                effects.removed.extend([first, second]);
                effects.touched.insert(parent);
                effects.survivor = Some(parent);
                Ok(())
            }
            (true, false) | (false, true) => {
                let (leaf_id, split_id) = if self.is_leaf(first) {
                    (first, second)
                } else {
                    (second, first)
                };
                let (absorbed, absorbed_selected) = self.take_leaf(leaf_id)?;
                let split = self
                    .nodes
                    .remove(&split_id)
                    .ok_or(PanelOperationFailure::MissingPanel { panel: split_id })?;
                let (grand_first, grand_second) = split
                    .children()
                    .ok_or(PanelOperationFailure::NodeNotSplit { panel: split_id })?;

                let node = self.node_mut(parent)?;
                node.content = PanelContent::Split {
                    first: grand_first,
                    second: grand_second,
                };
                node.orientation = split.orientation;
                for grandchild in [grand_first, grand_second] {
                    self.node_mut(grandchild)?.parent = Some(parent);
                }
                self.set_ratio(parent, split.ratio)?;

                let destination = self
                    .first_leaf(parent)
                    .ok_or(PanelOperationFailure::MissingPanel { panel: parent })?;
                for tab in &absorbed {
                    self.tab_mut(*tab)?.set_panel(destination);
                }
                let (tabs, selected) = self.leaf_parts_mut(destination)?;
                if tabs.is_empty() && !absorbed.is_empty() {
                    *selected = absorbed_selected;
                }
                tabs.extend(absorbed);

                effects.removed.extend([leaf_id, split_id]);
                effects
                    .touched
                    .extend([parent, grand_first, grand_second, destination]);
                effects.survivor = Some(destination);
                Ok(())
            }
            (false, false) => Err(PanelOperationFailure::BothChildrenSplit { panel: parent }),
        }
    }

    /// Clamp and store a split ratio, then push it into the children's flex
    /// weights along the split axis.
    fn set_ratio(&mut self, split: PanelId, ratio: f32) -> Result<(), PanelOperationFailure> {
        self.children_of(split)?;
        let ratio = self.config.clamp_ratio(ratio);
        self.node_mut(split)?.ratio = ratio;
        self.propagate_flex(split);
        Ok(())
    }

    fn propagate_flex(&mut self, split: PanelId) {
        let Some(node) = self.nodes.get(&split) else {
            return;
        };
        let Some((first, second)) = node.children() else {
            return;
        };
        let (orientation, ratio) = (node.orientation, node.ratio);
        for (child, share) in [(first, ratio), (second, 1.0 - ratio)] {
            if let Some(child) = self.nodes.get_mut(&child) {
                match orientation {
                    SplitOrientation::Horizontal => child.flex.height = share * 100.0,
                    SplitOrientation::Vertical => child.flex.width = share * 100.0,
                }
            }
        }
    }

    fn detach_tab(&mut self, tab: TabId) -> Result<PanelId, PanelOperationFailure> {
        let source = self.tab_panel(tab)?;
        let (tabs, selected) = self.leaf_parts_mut(source)?;
        let index = tabs
            .iter()
            .position(|candidate| *candidate == tab)
            .ok_or(PanelOperationFailure::TabNotDocked { tab, panel: source })?;
        tabs.remove(index);
        if tabs.is_empty() {
            *selected = 0;
        } else if index < *selected {
            *selected -= 1;
        } else if *selected >= tabs.len() {
            *selected = tabs.len() - 1;
        }
        Ok(source)
    }

    fn attach_tab(&mut self, tab: TabId, leaf: PanelId) -> Result<(), PanelOperationFailure> {
        let (tabs, selected) = self.leaf_parts_mut(leaf)?;
        tabs.push(tab);
        if tabs.len() == 1 {
            *selected = 0;
        }
        self.tab_mut(tab)?.set_panel(leaf);
        Ok(())
    }

    fn take_leaf(&mut self, id: PanelId) -> Result<(Vec<TabId>, usize), PanelOperationFailure> {
        let node = self
            .nodes
            .remove(&id)
            .ok_or(PanelOperationFailure::MissingPanel { panel: id })?;
        match node.content {
            PanelContent::Leaf { tabs, selected } => Ok((tabs, selected)),
            PanelContent::Split { .. } => Err(PanelOperationFailure::NodeNotLeaf { panel: id }),
        }
    }

    fn node_ref(&self, id: PanelId) -> Result<&PanelNode, PanelOperationFailure> {
        self.nodes
            .get(&id)
            .ok_or(PanelOperationFailure::MissingPanel { panel: id })
    }

    fn node_mut(&mut self, id: PanelId) -> Result<&mut PanelNode, PanelOperationFailure> {
        self.nodes
            .get_mut(&id)
            .ok_or(PanelOperationFailure::MissingPanel { panel: id })
    }

    fn tab_mut(&mut self, tab: TabId) -> Result<&mut TabRecord, PanelOperationFailure> {
        self.tabs
            .get_mut(&tab)
            .ok_or(PanelOperationFailure::MissingTab { tab })
    }

    fn tab_panel(&self, tab: TabId) -> Result<PanelId, PanelOperationFailure> {
        self.panel_of(tab)
            .ok_or(PanelOperationFailure::MissingTab { tab })
    }

    fn leaf_tabs(&self, id: PanelId) -> Result<&[TabId], PanelOperationFailure> {
        let node = self.node_ref(id)?;
        match &node.content {
            PanelContent::Leaf { tabs, .. } => Ok(tabs),
            PanelContent::Split { .. } => Err(PanelOperationFailure::NodeNotLeaf { panel: id }),
        }
    }

    fn leaf_parts_mut(
        &mut self,
        id: PanelId,
    ) -> Result<(&mut Vec<TabId>, &mut usize), PanelOperationFailure> {
        let node = self.node_mut(id)?;
        match &mut node.content {
            PanelContent::Leaf { tabs, selected } => Ok((tabs, selected)),
            PanelContent::Split { .. } => Err(PanelOperationFailure::NodeNotLeaf { panel: id }),
        }
    }

    fn children_of(&self, id: PanelId) -> Result<(PanelId, PanelId), PanelOperationFailure> {
        self.node_ref(id)?
            .children()
            .ok_or(PanelOperationFailure::NodeNotSplit { panel: id })
    }

    fn allocate_panel(&mut self) -> Result<PanelId, PanelModelError> {
        let current = self.next_panel;
        self.next_panel = current.checked_next()?;
        Ok(current)
    }

    fn allocate_tab(&mut self) -> Result<TabId, PanelModelError> {
        let current = self.next_tab;
        self.next_tab = current.checked_next()?;
        Ok(current)
    }

    /// Check every structural invariant.
    pub fn validate(&self) -> Result<(), PanelModelError> {
        let root = self
            .nodes
            .get(&self.root)
            .ok_or(PanelModelError::MissingRoot { root: self.root })?;
        if let Some(parent) = root.parent {
            return Err(PanelModelError::RootHasParent {
                root: self.root,
                parent,
            });
        }
        if let Some((&max, _)) = self.nodes.last_key_value() {
            if self.next_panel <= max {
                return Err(PanelModelError::NextPanelIdNotGreater {
                    next: self.next_panel,
                    max,
                });
            }
        }
        if let Some((&max, _)) = self.tabs.last_key_value() {
            if self.next_tab <= max {
                return Err(PanelModelError::NextTabIdNotGreater {
                    next: self.next_tab,
                    max,
                });
            }
        }

        let mut visited = BTreeSet::new();
        let mut listed = BTreeSet::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                return Err(PanelModelError::CycleDetected { node: id });
            }
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            match &node.content {
                PanelContent::Leaf { tabs, selected } => {
                    let in_range = if tabs.is_empty() {
                        *selected == 0
                    } else {
                        *selected < tabs.len()
                    };
                    if !in_range {
                        return Err(PanelModelError::SelectionOutOfRange {
                            panel: id,
                            selected: *selected,
                            tab_count: tabs.len(),
                        });
                    }
                    for tab in tabs {
                        let record = self
                            .tabs
                            .get(tab)
                            .ok_or(PanelModelError::MissingTab { panel: id, tab: *tab })?;
                        if !listed.insert(*tab) {
                            return Err(PanelModelError::DuplicateTab { tab: *tab });
                        }
                        if record.panel() != id {
                            return Err(PanelModelError::TabOwnerMismatch {
                                tab: *tab,
                                listed_in: id,
                                recorded: record.panel(),
                            });
                        }
                    }
                }
                PanelContent::Split { first, second } => {
                    if first == second {
                        return Err(PanelModelError::DuplicateSplitChildren {
                            parent: id,
                            child: *first,
                        });
                    }
                    let (low, high) = self.config.ratio_bounds();
                    let in_range = node.ratio.is_finite() && node.ratio >= low && node.ratio <= high;
                    if !in_range {
                        return Err(PanelModelError::RatioOutOfRange {
                            panel: id,
                            ratio: node.ratio,
                        });
                    }
                    for child in [*first, *second] {
                        let child_node = self
                            .nodes
                            .get(&child)
                            .ok_or(PanelModelError::MissingChild { parent: id, child })?;
                        if child_node.parent != Some(id) {
                            return Err(PanelModelError::ParentMismatch {
                                node: child,
                                expected: id,
                                actual: child_node.parent,
                            });
                        }
                    }
                    stack.push(*second);
                    stack.push(*first);
                }
            }
        }

        if let Some(&node) = self.nodes.keys().find(|id| !visited.contains(*id)) {
            return Err(PanelModelError::UnreachableNode { node });
        }
        if let Some(&tab) = self.tabs.keys().find(|id| !listed.contains(*id)) {
            return Err(PanelModelError::OrphanTab { tab });
        }
        Ok(())
    }

    /// Deterministic FNV-1a hash over the full tree state.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
        const PRIME: u64 = 0x0000_0001_0000_01b3;

        fn mix(hash: &mut u64, byte: u8) {
            *hash ^= u64::from(byte);
            *hash = hash.wrapping_mul(PRIME);
        }

        fn mix_bytes(hash: &mut u64, bytes: &[u8]) {
            for byte in bytes {
                mix(hash, *byte);
            }
        }

        fn mix_u64(hash: &mut u64, value: u64) {
            mix_bytes(hash, &value.to_le_bytes());
        }

        fn mix_f32(hash: &mut u64, value: f32) {
            mix_bytes(hash, &value.to_bits().to_le_bytes());
        }

        let mut hash = OFFSET_BASIS;
        mix_u64(&mut hash, self.root.get());
        mix_u64(&mut hash, self.next_panel.get());
        mix_u64(&mut hash, self.next_tab.get());

        for node in self.nodes.values() {
            mix_u64(&mut hash, node.id.get());
            mix_u64(&mut hash, node.parent.map_or(0, PanelId::get));
            mix(&mut hash, node.orientation.stable_tag());
            mix_f32(&mut hash, node.ratio);
            mix_f32(&mut hash, node.flex.width);
            mix_f32(&mut hash, node.flex.height);
            match &node.content {
                PanelContent::Leaf { tabs, selected } => {
                    mix(&mut hash, 0);
                    mix_u64(&mut hash, *selected as u64);
                    mix_u64(&mut hash, tabs.len() as u64);
                    for tab in tabs {
                        mix_u64(&mut hash, tab.get());
                    }
                }
                PanelContent::Split { first, second } => {
                    mix(&mut hash, 1);
                    mix_u64(&mut hash, first.get());
                    mix_u64(&mut hash, second.get());
                }
            }
        }

        for record in self.tabs.values() {
            mix_u64(&mut hash, record.id().get());
            mix_u64(&mut hash, record.panel().get());
            mix_u64(&mut hash, record.kind().as_str().len() as u64);
            mix_bytes(&mut hash, record.kind().as_str().as_bytes());
        }

        hash
    }

    /// Export the tree as a portable [`LayoutTree`].
    #[must_use]
    pub fn to_layout_tree(&self) -> LayoutTree {
        self.export_node(self.root)
    }

    fn export_node(&self, id: PanelId) -> LayoutTree {
        let Some(node) = self.nodes.get(&id) else {
            return LayoutTree::default();
        };
        match node.content {
            PanelContent::Split { first, second } => LayoutTree::split(
                node.orientation,
                node.ratio,
                self.export_node(first),
                self.export_node(second),
            ),
            PanelContent::Leaf { ref tabs, .. } => LayoutTree {
                split_orientation: node.orientation,
                split_position: node.ratio,
                child_a: None,
                child_b: None,
                docked_tabs: tabs
                    .iter()
                    .filter_map(|tab| self.tabs.get(tab).map(|record| record.kind().clone()))
                    .collect(),
            },
        }
    }

    /// Build a tree from a [`LayoutTree`].
    ///
    /// The whole layout is validated before anything is created. Nodes are
    /// instantiated depth-first; `admit` is asked for every tab slot and may
    /// decline it, in which case the slot is skipped. Split ratios are
    /// clamped into the configured range.
    pub fn from_layout_tree(
        layout: &LayoutTree,
        config: DockConfig,
        mut admit: impl FnMut(TabId, &TabKind) -> bool,
    ) -> Result<Self, LayoutTreeError> {
        layout.validate()?;

        let mut tree = Self {
            config,
            root: PanelId::MIN,
            next_panel: PanelId::MIN,
            next_tab: TabId::MIN,
            nodes: BTreeMap::new(),
            tabs: BTreeMap::new(),
        };
        let root = tree.allocate_panel().map_err(LayoutTreeError::Rejected)?;
        tree.root = root;

        let mut splits = Vec::new();
        let mut stack = vec![(layout, root, None)];
        while let Some((source, id, parent)) = stack.pop() {
            let (content, ratio) = match source.children() {
                Some((a, b)) => {
                    let first = tree.allocate_panel().map_err(LayoutTreeError::Rejected)?;
                    let second = tree.allocate_panel().map_err(LayoutTreeError::Rejected)?;
                    stack.push((b, second, Some(id)));
                    stack.push((a, first, Some(id)));
                    splits.push(id);
                    (
                        PanelContent::Split { first, second },
                        tree.config.clamp_ratio(source.split_position),
                    )
                }
                None => {
                    let mut tabs = Vec::with_capacity(source.docked_tabs.len());
                    for kind in &source.docked_tabs {
                        let tab = tree.allocate_tab().map_err(LayoutTreeError::Rejected)?;
                        if admit(tab, kind) {
                            tree.tabs.insert(tab, TabRecord::new(tab, kind.clone(), id));
                            tabs.push(tab);
                        }
                    }
                    let ratio = if source.split_position.is_finite() {
                        source.split_position
                    } else {
                        0.5
                    };
                    (PanelContent::Leaf { tabs, selected: 0 }, ratio)
                }
            };
            tree.nodes.insert(
                id,
                PanelNode {
                    id,
                    parent,
                    orientation: source.split_orientation,
                    ratio,
                    flex: FlexWeight::default(),
                    content,
                },
            );
        }

        for split in splits {
            tree.propagate_flex(split);
        }
        tree.validate().map_err(LayoutTreeError::Rejected)?;
        Ok(tree)
    }
}
