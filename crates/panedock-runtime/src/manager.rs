#![forbid(unsafe_code)]

//! Window manager: the context object tying the panel tree, tab instances,
//! geometry, and pointer interaction together.
//!
//! # Drag lifecycle
//!
//! ```text
//! Idle -> Armed -> DraggingTab -> Idle   (drop or revert on Up)
//!    \------> Idle                       (Up before threshold, Cancel)
//! Idle -> Resizing -> Idle
//! ```
//!
//! Every state is left on `Up` or `Cancel`, whether or not the drop
//! succeeds, so a failed operation never strands a floating label.
//!
//! After every mutation the manager keeps the selected leaf valid, prunes
//! an emptied source leaf when [`DockConfig::collapse_empty_panels`] is set,
//! re-solves geometry, and re-syncs each label's host and each tab's
//! visibility.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use panedock_core::event::{PointerButton, PointerEvent, PointerEventKind};
use panedock_core::geometry::{Point, Rect};
use panedock_layout::{
    DockConfig, DropTarget, LayoutTree, LayoutTreeError, PanelId, PanelLayout, PanelModelError,
    PanelOperation, PanelOperationError, PanelOperationOutcome, PanelRegion, PanelTree, TabId,
    TabKind, divider_ratio,
};

use crate::label::TabInstance;
use crate::persist::{self, PersistError};
use crate::registry::TabRegistry;

const LOG_TARGET: &str = "panedock.manager";

/// Pointer interaction state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    /// Pressed on a label; the drag starts once the pointer travels
    /// `drag_threshold`.
    Armed {
        tab: TabId,
        origin: Point,
        offset: Point,
    },
    /// A label is floating under the pointer.
    DraggingTab { tab: TabId, source: PanelId },
    /// Dragging the divider of `split`.
    Resizing { split: PanelId },
}

/// Why a pointer event changed nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerNoopReason {
    NonPrimaryButton,
    NothingUnderPointer,
    IdleWithoutActiveDrag,
    ThresholdNotReached,
}

/// Result of one pointer event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEffect {
    Noop { reason: PointerNoopReason },
    /// A leaf was selected without touching a label.
    LeafSelected { leaf: PanelId },
    /// A label was pressed; its tab is selected and a drag is armed.
    Armed { tab: TabId },
    /// Button released on a label before the drag threshold.
    Released { tab: TabId },
    DragStarted { tab: TabId },
    DragUpdated { tab: TabId, position: Point },
    Dropped { tab: TabId, target: DropTarget },
    /// Released outside every drop target, or onto one the tree rejected;
    /// the tab stays where it was.
    Reverted { tab: TabId },
    ResizeStarted { split: PanelId },
    Resized { split: PanelId, ratio: f32 },
    ResizeEnded { split: PanelId },
    Canceled,
}

/// Window-manager errors.
#[derive(Debug)]
pub enum DockError {
    /// The request is outside what the manager supports.
    Unsupported(&'static str),
    /// The tree rejected the operation; nothing was changed.
    Operation(PanelOperationError),
    UnknownTab(TabId),
    Layout(LayoutTreeError),
    Model(PanelModelError),
    Persist(PersistError),
}

impl fmt::Display for DockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupported(what) => write!(f, "unsupported: {what}"),
            Self::Operation(err) => write!(f, "{err}"),
            Self::UnknownTab(tab) => write!(f, "unknown tab {tab}"),
            Self::Layout(err) => write!(f, "{err}"),
            Self::Model(err) => write!(f, "{err}"),
            Self::Persist(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for DockError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Unsupported(_) | Self::UnknownTab(_) => None,
            Self::Operation(err) => Some(err),
            Self::Layout(err) => Some(err),
            Self::Model(err) => Some(err),
            Self::Persist(err) => Some(err),
        }
    }
}

impl From<PanelOperationError> for DockError {
    fn from(err: PanelOperationError) -> Self {
        Self::Operation(err)
    }
}

impl From<LayoutTreeError> for DockError {
    fn from(err: LayoutTreeError) -> Self {
        Self::Layout(err)
    }
}

impl From<PanelModelError> for DockError {
    fn from(err: PanelModelError) -> Self {
        Self::Model(err)
    }
}

impl From<PersistError> for DockError {
    fn from(err: PersistError) -> Self {
        Self::Persist(err)
    }
}

/// Docking window manager.
pub struct WindowManager {
    registry: TabRegistry,
    tree: PanelTree,
    instances: BTreeMap<TabId, TabInstance>,
    selected_leaf: Option<PanelId>,
    area: Rect,
    layout: PanelLayout,
    drag: DragState,
    next_operation_id: u64,
}

impl WindowManager {
    /// A manager holding one empty root leaf filling `area`.
    pub fn new(registry: TabRegistry, config: DockConfig, area: Rect) -> Result<Self, DockError> {
        let tree = PanelTree::new(config);
        let layout = tree.solve_layout(area)?;
        Ok(Self {
            registry,
            selected_leaf: Some(tree.root()),
            tree,
            instances: BTreeMap::new(),
            area,
            layout,
            drag: DragState::Idle,
            next_operation_id: 1,
        })
    }

    #[must_use]
    pub fn config(&self) -> &DockConfig {
        self.tree.config()
    }

    #[must_use]
    pub fn registry(&self) -> &TabRegistry {
        &self.registry
    }

    #[must_use]
    pub fn tree(&self) -> &PanelTree {
        &self.tree
    }

    #[must_use]
    pub fn layout(&self) -> &PanelLayout {
        &self.layout
    }

    #[must_use]
    pub fn area(&self) -> Rect {
        self.area
    }

    #[must_use]
    pub fn selected_leaf(&self) -> Option<PanelId> {
        self.selected_leaf
    }

    /// Selected tab of the selected leaf.
    #[must_use]
    pub fn selected_tab(&self) -> Option<TabId> {
        self.tree.node(self.selected_leaf?)?.selected_tab()
    }

    #[must_use]
    pub fn drag_state(&self) -> DragState {
        self.drag
    }

    #[must_use]
    pub fn instance(&self, tab: TabId) -> Option<&TabInstance> {
        self.instances.get(&tab)
    }

    pub fn instance_mut(&mut self, tab: TabId) -> Option<&mut TabInstance> {
        self.instances.get_mut(&tab)
    }

    pub fn instances(&self) -> impl Iterator<Item = (TabId, &TabInstance)> {
        self.instances.iter().map(|(tab, instance)| (*tab, instance))
    }

    /// Export the current arrangement.
    #[must_use]
    pub fn layout_tree(&self) -> LayoutTree {
        self.tree.to_layout_tree()
    }

    /// Replace the whole arrangement with `layout`.
    ///
    /// Tab slots whose kind is unknown, or whose factory fails, are skipped.
    /// On error the current arrangement is left untouched.
    pub fn set_layout(&mut self, layout: &LayoutTree) -> Result<(), DockError> {
        let registry = &self.registry;
        let mut instances = BTreeMap::new();
        let tree = PanelTree::from_layout_tree(layout, self.tree.config().clone(), |tab, kind| {
            let Some(instance) = registry.instantiate(kind) else {
                return false;
            };
            if instance.label.bind(tab).is_err() {
                return false;
            }
            instances.insert(tab, instance);
            true
        })?;
        let layout = tree.solve_layout(self.area)?;

        for instance in self.instances.values_mut() {
            instance.set_visible(false);
        }
        self.tree = tree;
        self.instances = instances;
        self.layout = layout;
        self.selected_leaf = self.tree.first_leaf(self.tree.root());
        self.drag = DragState::Idle;
        for instance in self.instances.values_mut() {
            instance.content.on_create();
        }
        self.sync_instances();
        tracing::debug!(
            target: LOG_TARGET,
            panels = self.tree.node_count(),
            tabs = self.tree.tab_count(),
            "layout replaced"
        );
        Ok(())
    }

    /// Load a layout file. On failure the current arrangement is kept.
    pub fn load_layout(&mut self, path: impl AsRef<Path>) -> Result<(), DockError> {
        let path = path.as_ref();
        let result = persist::read_layout(path)
            .map_err(DockError::from)
            .and_then(|layout| self.set_layout(&layout));
        if let Err(err) = &result {
            tracing::warn!(
                target: LOG_TARGET,
                path = %path.display(),
                error = %err,
                "failed to load layout; keeping current layout"
            );
        }
        result
    }

    /// Save the current arrangement.
    pub fn save_layout(&self, path: impl AsRef<Path>) -> Result<(), DockError> {
        persist::write_layout(path, &self.layout_tree())?;
        Ok(())
    }

    /// Return the first tab of `kind` in tree order, selecting it, or open a
    /// new one in the selected leaf.
    ///
    /// Returns `None` when the kind is unknown, its factory fails, or no
    /// leaf is selected.
    pub fn get_or_create_tab(&mut self, kind: impl Into<TabKind>) -> Option<TabId> {
        let kind = kind.into();
        if let Some(tab) = self.tree.find_tab(&kind) {
            return self.select_tab(tab).ok().map(|_| tab);
        }

        let leaf = self.selected_leaf.filter(|leaf| self.tree.is_leaf(*leaf))?;
        let mut instance = self.registry.instantiate(&kind)?;
        let outcome = self
            .apply(PanelOperation::OpenTab {
                kind: kind.clone(),
                leaf,
            })
            .ok()?;
        let tab = outcome.created_tab?;
        if let Err(err) = instance.label.bind(tab) {
            tracing::warn!(target: LOG_TARGET, error = %err, "label binding failed");
            return None;
        }
        instance.content.on_create();
        self.instances.insert(tab, instance);
        self.finish(outcome, None).ok()?;
        Some(tab)
    }

    /// Make `tab` the selected tab of its leaf and select that leaf.
    pub fn select_tab(&mut self, tab: TabId) -> Result<PanelOperationOutcome, DockError> {
        let leaf = self.tree.panel_of(tab).ok_or(DockError::UnknownTab(tab))?;
        let outcome = self.apply(PanelOperation::SelectTab { leaf, tab })?;
        self.selected_leaf = Some(leaf);
        self.finish(outcome, None)
    }

    /// Move `tab` into `leaf`'s tab bar.
    pub fn move_tab(
        &mut self,
        tab: TabId,
        leaf: PanelId,
    ) -> Result<PanelOperationOutcome, DockError> {
        let source = self.tree.panel_of(tab).ok_or(DockError::UnknownTab(tab))?;
        let outcome = self.apply(PanelOperation::MoveTab { tab, target: leaf })?;
        self.finish(outcome, Some(source))
    }

    /// Split `leaf`, placing `tab` alone on the `region` side.
    pub fn split_panel(
        &mut self,
        leaf: PanelId,
        tab: TabId,
        region: PanelRegion,
    ) -> Result<PanelOperationOutcome, DockError> {
        let source = self.tree.panel_of(tab).ok_or(DockError::UnknownTab(tab))?;
        let outcome = self.apply(PanelOperation::Split { leaf, tab, region })?;
        self.finish(outcome, Some(source))
    }

    /// Merge two sibling panels into their parent.
    pub fn merge_panels(
        &mut self,
        first: PanelId,
        second: PanelId,
    ) -> Result<PanelOperationOutcome, DockError> {
        let outcome = self.apply(PanelOperation::MergePanels { first, second })?;
        self.finish(outcome, None)
    }

    pub fn set_split_ratio(
        &mut self,
        split: PanelId,
        ratio: f32,
    ) -> Result<PanelOperationOutcome, DockError> {
        let outcome = self.apply(PanelOperation::SetSplitRatio { split, ratio })?;
        self.finish(outcome, None)
    }

    /// Tear a tab out into a floating window. Not supported.
    pub fn detach_tab(&mut self, tab: TabId) -> Result<(), DockError> {
        if self.tree.tab(tab).is_none() {
            return Err(DockError::UnknownTab(tab));
        }
        Err(DockError::Unsupported("floating tab windows"))
    }

    /// Re-solve geometry for a new viewport.
    pub fn resize(&mut self, area: Rect) -> Result<(), DockError> {
        self.layout = self.tree.solve_layout(area)?;
        self.area = area;
        Ok(())
    }

    /// Route one pointer event.
    ///
    /// Gestures the tree cannot honour resolve to [`PointerEffect::Noop`] or
    /// [`PointerEffect::Reverted`] and leave the layout unchanged. An `Err`
    /// means geometry could not be re-solved after a committed change.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> Result<PointerEffect, DockError> {
        let position = event.position;
        match event.kind {
            PointerEventKind::Down(PointerButton::Primary) => self.pointer_down(position),
            PointerEventKind::Move => self.pointer_move(position),
            PointerEventKind::Up(PointerButton::Primary) => self.pointer_up(position),
            PointerEventKind::Cancel => {
                self.clear_drag();
                Ok(PointerEffect::Canceled)
            }
            PointerEventKind::Down(_) | PointerEventKind::Up(_) => Ok(PointerEffect::Noop {
                reason: PointerNoopReason::NonPrimaryButton,
            }),
        }
    }

    fn pointer_down(&mut self, position: Point) -> Result<PointerEffect, DockError> {
        self.clear_drag();

        if let Some(tab) = self.layout.label_at(position) {
            let label = self.layout.label(tab).unwrap_or_default();
            self.select_tab(tab)?;
            self.drag = DragState::Armed {
                tab,
                origin: position,
                offset: Point::new(label.x, label.y).delta(position),
            };
            return Ok(PointerEffect::Armed { tab });
        }
        if let Some(split) = self.layout.divider_at(position).map(|divider| divider.split) {
            self.drag = DragState::Resizing { split };
            return Ok(PointerEffect::ResizeStarted { split });
        }
        if let Some(leaf) = self.layout.leaf_at(position) {
            self.selected_leaf = Some(leaf);
            return Ok(PointerEffect::LeafSelected { leaf });
        }
        Ok(PointerEffect::Noop {
            reason: PointerNoopReason::NothingUnderPointer,
        })
    }

    fn pointer_move(&mut self, position: Point) -> Result<PointerEffect, DockError> {
        match self.drag {
            DragState::Idle => Ok(PointerEffect::Noop {
                reason: PointerNoopReason::IdleWithoutActiveDrag,
            }),
            DragState::Armed {
                tab,
                origin,
                offset,
            } => {
                if position.delta(origin).manhattan() < self.config().drag_threshold {
                    return Ok(PointerEffect::Noop {
                        reason: PointerNoopReason::ThresholdNotReached,
                    });
                }
                let source = self.tree.panel_of(tab).ok_or(DockError::UnknownTab(tab))?;
                if let Some(instance) = self.instances.get_mut(&tab) {
                    instance.label.begin_drag(position, offset);
                }
                self.drag = DragState::DraggingTab { tab, source };
                tracing::trace!(target: LOG_TARGET, %tab, %source, "tab drag started");
                Ok(PointerEffect::DragStarted { tab })
            }
            DragState::DraggingTab { tab, .. } => {
                if let Some(instance) = self.instances.get_mut(&tab) {
                    instance.label.drag_to(position);
                }
                tracing::trace!(
                    target: LOG_TARGET,
                    %tab,
                    x = position.x,
                    y = position.y,
                    "tab drag updated"
                );
                Ok(PointerEffect::DragUpdated { tab, position })
            }
            DragState::Resizing { split } => {
                let Some(divider) = self.layout.divider(split) else {
                    self.drag = DragState::Idle;
                    return Ok(PointerEffect::Noop {
                        reason: PointerNoopReason::IdleWithoutActiveDrag,
                    });
                };
                let requested =
                    divider_ratio(divider.orientation, divider.container.normalize(position));
                self.set_split_ratio(split, requested)?;
                let ratio = self.tree.node(split).map_or(requested, |node| node.ratio);
                tracing::trace!(target: LOG_TARGET, %split, ratio, "divider dragged");
                Ok(PointerEffect::Resized { split, ratio })
            }
        }
    }

    fn pointer_up(&mut self, position: Point) -> Result<PointerEffect, DockError> {
        let state = self.drag;
        self.clear_drag();
        match state {
            DragState::Idle => Ok(PointerEffect::Noop {
                reason: PointerNoopReason::IdleWithoutActiveDrag,
            }),
            DragState::Armed { tab, .. } => Ok(PointerEffect::Released { tab }),
            DragState::Resizing { split } => Ok(PointerEffect::ResizeEnded { split }),
            DragState::DraggingTab { tab, source } => {
                let margin = self.config().region_margin;
                let Some(target) = self.layout.drop_target_at(position, margin) else {
                    tracing::trace!(target: LOG_TARGET, %tab, %source, "drop outside targets; reverted");
                    return Ok(PointerEffect::Reverted { tab });
                };
                match self.drop_tab(tab, target) {
                    Ok(()) => Ok(PointerEffect::Dropped { tab, target }),
                    Err(DockError::Operation(_)) => {
                        tracing::trace!(target: LOG_TARGET, %tab, %source, "drop rejected; reverted");
                        Ok(PointerEffect::Reverted { tab })
                    }
                    Err(err) => Err(err),
                }
            }
        }
    }

    fn drop_tab(&mut self, tab: TabId, target: DropTarget) -> Result<(), DockError> {
        match target {
            DropTarget::TabBar { panel } => {
                self.move_tab(tab, panel)?;
            }
            DropTarget::Viewport { panel, region } => {
                let others = self.tree.node(panel).map_or(0, |node| {
                    node.tabs().iter().filter(|docked| **docked != tab).count()
                });
                if region == PanelRegion::Center || others == 0 {
                    self.move_tab(tab, panel)?;
                } else {
                    self.split_panel(panel, tab, region)?;
                }
            }
        }
        self.select_tab(tab)?;
        Ok(())
    }

    fn clear_drag(&mut self) {
        let tab = match self.drag {
            DragState::Armed { tab, .. } | DragState::DraggingTab { tab, .. } => Some(tab),
            DragState::Idle | DragState::Resizing { .. } => None,
        };
        if let Some(instance) = tab.and_then(|tab| self.instances.get_mut(&tab)) {
            instance.label.end_drag();
        }
        self.drag = DragState::Idle;
    }

    fn apply(&mut self, operation: PanelOperation) -> Result<PanelOperationOutcome, DockError> {
        let operation_id = self.next_operation_id;
        self.next_operation_id = self.next_operation_id.wrapping_add(1);
        self.tree
            .apply_operation(operation_id, operation)
            .map_err(|err| {
                tracing::debug!(
                    target: LOG_TARGET,
                    operation_id,
                    op = err.kind.as_str(),
                    reason = %err.reason,
                    "panel operation rejected"
                );
                DockError::Operation(err)
            })
    }

    fn finish(
        &mut self,
        mut outcome: PanelOperationOutcome,
        source: Option<PanelId>,
    ) -> Result<PanelOperationOutcome, DockError> {
        if let Some(source) = source.filter(|source| self.is_prunable(*source)) {
            let pruned = self.apply(PanelOperation::PruneEmpty { leaf: source })?;
            outcome.removed_panels.extend(pruned.removed_panels);
            outcome
                .touched_panels
                .retain(|panel| self.tree.node(*panel).is_some());
            outcome.after_hash = pruned.after_hash;
            if outcome.survivor.is_none_or(|survivor| !self.tree.is_leaf(survivor)) {
                outcome.survivor = pruned.survivor;
            }
        }

        if !self.selected_leaf.is_some_and(|leaf| self.tree.is_leaf(leaf)) {
            self.selected_leaf = outcome
                .survivor
                .filter(|survivor| self.tree.is_leaf(*survivor))
                .or_else(|| self.tree.first_leaf(self.tree.root()));
        }

        self.layout = self.tree.solve_layout(self.area)?;
        self.sync_instances();
        Ok(outcome)
    }

    fn is_prunable(&self, leaf: PanelId) -> bool {
        self.tree.config().collapse_empty_panels
            && leaf != self.tree.root()
            && self
                .tree
                .node(leaf)
                .is_some_and(|node| node.is_leaf() && node.tabs().is_empty())
    }

    fn sync_instances(&mut self) {
        let tree = &self.tree;
        let placement = |tab: TabId| {
            let host = tree.panel_of(tab);
            let visible = host
                .and_then(|leaf| tree.node(leaf))
                .and_then(|node| node.selected_tab())
                == Some(tab);
            (host, visible)
        };
        for (tab, instance) in &mut self.instances {
            let (host, visible) = placement(*tab);
            instance.label.set_host(host);
            if !visible {
                instance.set_visible(false);
            }
        }
        for (tab, instance) in &mut self.instances {
            if placement(*tab).1 {
                instance.set_visible(true);
            }
        }
    }
}

impl fmt::Debug for WindowManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindowManager")
            .field("tree", &self.tree)
            .field("selected_leaf", &self.selected_leaf)
            .field("area", &self.area)
            .field("drag", &self.drag)
            .field("instances", &self.instances.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{TabContent, TabCreateError, TabRegistration};
    use panedock_layout::SplitOrientation;

    struct Blank;

    impl TabContent for Blank {}

    fn blank() -> Result<Box<dyn TabContent>, TabCreateError> {
        Ok(Box::new(Blank))
    }

    const TABLE: &[TabRegistration] = &[
        TabRegistration {
            kind: "scene",
            display_name: "Scene",
            icon: None,
            factory: blank,
        },
        TabRegistration {
            kind: "console",
            display_name: "Console",
            icon: None,
            factory: blank,
        },
        TabRegistration {
            kind: "game",
            display_name: "Game",
            icon: None,
            factory: blank,
        },
    ];

    fn manager() -> WindowManager {
        WindowManager::new(
            TabRegistry::from_table(TABLE),
            DockConfig::default(),
            Rect::from_size(800.0, 600.0),
        )
        .expect("manager")
    }

    fn center(rect: Rect) -> Point {
        Point::new(rect.x + rect.width / 2.0, rect.y + rect.height / 2.0)
    }

    #[test]
    fn get_or_create_tab_is_idempotent() {
        let mut wm = manager();
        let scene = wm.get_or_create_tab("scene").expect("scene");
        let console = wm.get_or_create_tab("console").expect("console");
        assert_eq!(wm.selected_tab(), Some(console));

        assert_eq!(wm.get_or_create_tab("Scene"), Some(scene));
        assert_eq!(wm.selected_tab(), Some(scene));
        assert_eq!(wm.tree().tab_count(), 2);
        assert!(wm.get_or_create_tab("inspector").is_none());
    }

    #[test]
    fn label_binding_and_visibility_follow_the_tree() {
        let mut wm = manager();
        let scene = wm.get_or_create_tab("scene").expect("scene");
        let console = wm.get_or_create_tab("console").expect("console");
        let root = wm.tree().root();

        let scene_instance = wm.instance(scene).expect("instance");
        assert_eq!(scene_instance.label.tab(), Some(scene));
        assert_eq!(scene_instance.label.host(), Some(root));
        assert!(!scene_instance.is_visible());
        assert!(wm.instance(console).expect("instance").is_visible());
    }

    #[test]
    fn split_then_merge_restores_single_leaf() {
        let mut wm = manager();
        wm.get_or_create_tab("scene").expect("scene");
        let console = wm.get_or_create_tab("console").expect("console");
        let root = wm.tree().root();

        let outcome = wm
            .split_panel(root, console, PanelRegion::Bottom)
            .expect("split");
        let new_leaf = outcome.survivor.expect("new leaf");
        assert_eq!(wm.tree().panel_of(console), Some(new_leaf));
        assert_eq!(wm.selected_leaf(), Some(new_leaf));
        assert_eq!(wm.layout().dividers().count(), 1);
        assert_eq!(
            wm.instance(console).and_then(|instance| instance.label.host()),
            Some(new_leaf)
        );

        let (first, second) = wm.tree().node(root).and_then(|node| node.children()).expect("split");
        wm.merge_panels(first, second).expect("merge");
        assert!(wm.tree().is_leaf(root));
        assert_eq!(wm.selected_leaf(), Some(root));
        assert_eq!(wm.layout().dividers().count(), 0);
    }

    #[test]
    fn moving_last_tab_prunes_emptied_leaf() {
        let mut wm = manager();
        wm.get_or_create_tab("scene").expect("scene");
        let console = wm.get_or_create_tab("console").expect("console");
        let root = wm.tree().root();
        let new_leaf = wm
            .split_panel(root, console, PanelRegion::Right)
            .expect("split")
            .survivor
            .expect("new leaf");
        let (first, _) = wm.tree().node(root).and_then(|node| node.children()).expect("split");

        let outcome = wm.move_tab(console, first).expect("move");
        assert!(outcome.removed_panels.contains(&new_leaf));
        assert!(wm.tree().is_leaf(root));
        assert_eq!(wm.tree().node(root).map(|node| node.tabs().len()), Some(2));
        assert_eq!(wm.selected_leaf(), Some(root));
    }

    #[test]
    fn rejected_operation_leaves_state_untouched() {
        let mut wm = manager();
        wm.get_or_create_tab("scene").expect("scene");
        let before = wm.layout_tree();
        let root = wm.tree().root();
        let err = wm.merge_panels(root, root).expect_err("root has no sibling");
        assert!(matches!(err, DockError::Operation(_)));
        assert_eq!(wm.layout_tree(), before);
    }

    #[test]
    fn detach_is_unsupported() {
        let mut wm = manager();
        let scene = wm.get_or_create_tab("scene").expect("scene");
        assert!(matches!(
            wm.detach_tab(scene),
            Err(DockError::Unsupported(_))
        ));
    }

    #[test]
    fn rejected_drop_reverts_instead_of_failing() {
        let mut wm = manager();
        wm.get_or_create_tab("scene").expect("scene");
        let game = wm.get_or_create_tab("game").expect("game");
        let console = wm.get_or_create_tab("console").expect("console");
        let root = wm.tree().root();

        let start = center(wm.layout().label(console).expect("label"));
        let viewport = wm.layout().viewport(root).expect("viewport");
        wm.handle_pointer(PointerEvent::down(start.x, start.y)).expect("down");
        assert_eq!(
            wm.handle_pointer(PointerEvent::moved(start.x + 10.0, start.y + 10.0))
                .expect("move"),
            PointerEffect::DragStarted { tab: console }
        );

        // Split behind the manager's back so the solved layout still shows
        // `root` as a leaf and the drop targets a split node.
        wm.tree
            .apply_operation(u64::MAX, PanelOperation::Split {
                leaf: root,
                tab: game,
                region: PanelRegion::Left,
            })
            .expect("split");
        let before = wm.layout_tree();
        let host = wm.tree().panel_of(console);

        let drop = center(viewport);
        let effect = wm.handle_pointer(PointerEvent::up(drop.x, drop.y)).expect("up");
        assert_eq!(effect, PointerEffect::Reverted { tab: console });
        assert_eq!(wm.layout_tree(), before);
        assert_eq!(wm.tree().panel_of(console), host);
        assert!(!wm.instance(console).expect("instance").label.is_dragging());
    }

    #[test]
    fn dragging_label_to_right_edge_splits_vertically() {
        let mut wm = manager();
        let scene = wm.get_or_create_tab("scene").expect("scene");
        let console = wm.get_or_create_tab("console").expect("console");
        let game = wm.get_or_create_tab("game").expect("game");
        let root = wm.tree().root();

        let start = center(wm.layout().label(console).expect("label"));
        assert_eq!(
            wm.handle_pointer(PointerEvent::down(start.x, start.y)).expect("down"),
            PointerEffect::Armed { tab: console }
        );
        assert_eq!(
            wm.handle_pointer(PointerEvent::moved(start.x + 1.0, start.y)).expect("move"),
            PointerEffect::Noop {
                reason: PointerNoopReason::ThresholdNotReached
            }
        );
        assert_eq!(
            wm.handle_pointer(PointerEvent::moved(start.x + 10.0, start.y + 10.0))
                .expect("move"),
            PointerEffect::DragStarted { tab: console }
        );
        assert!(wm.instance(console).expect("instance").label.is_dragging());

        let viewport = wm.layout().viewport(root).expect("viewport");
        let drop = Point::new(
            viewport.x + viewport.width * 0.95,
            viewport.y + viewport.height * 0.5,
        );
        wm.handle_pointer(PointerEvent::moved(drop.x, drop.y)).expect("move");
        let effect = wm.handle_pointer(PointerEvent::up(drop.x, drop.y)).expect("up");
        assert_eq!(
            effect,
            PointerEffect::Dropped {
                tab: console,
                target: DropTarget::Viewport {
                    panel: root,
                    region: PanelRegion::Right
                }
            }
        );
        assert_eq!(wm.drag_state(), DragState::Idle);
        assert!(!wm.instance(console).expect("instance").label.is_dragging());

        let exported = wm.layout_tree();
        assert_eq!(exported.split_orientation, SplitOrientation::Vertical);
        assert!((exported.split_position - 0.7).abs() < 1e-6);
        let (a, b) = exported.children().expect("split");
        let kinds = |tree: &LayoutTree| -> Vec<String> {
            tree.tab_kinds()
                .into_iter()
                .map(|kind| kind.as_str().to_string())
                .collect()
        };
        assert_eq!(kinds(a), ["scene", "game"]);
        assert_eq!(kinds(b), ["console"]);
        assert_eq!(wm.selected_tab(), Some(console));
        assert!(wm.tree().panel_of(scene) == wm.tree().panel_of(game));
    }

    #[test]
    fn drop_outside_targets_reverts() {
        let mut wm = manager();
        wm.get_or_create_tab("scene").expect("scene");
        let console = wm.get_or_create_tab("console").expect("console");
        let before = wm.layout_tree();

        let start = center(wm.layout().label(console).expect("label"));
        wm.handle_pointer(PointerEvent::down(start.x, start.y)).expect("down");
        wm.handle_pointer(PointerEvent::moved(start.x + 20.0, start.y)).expect("move");
        assert_eq!(
            wm.handle_pointer(PointerEvent::up(-50.0, -50.0)).expect("up"),
            PointerEffect::Reverted { tab: console }
        );
        assert_eq!(wm.layout_tree(), before);
        assert_eq!(wm.drag_state(), DragState::Idle);
        assert!(!wm.instance(console).expect("instance").label.is_dragging());
    }

    #[test]
    fn cancel_clears_drag() {
        let mut wm = manager();
        let scene = wm.get_or_create_tab("scene").expect("scene");
        let start = center(wm.layout().label(scene).expect("label"));
        wm.handle_pointer(PointerEvent::down(start.x, start.y)).expect("down");
        wm.handle_pointer(PointerEvent::moved(start.x + 30.0, start.y + 30.0))
            .expect("move");
        assert_eq!(
            wm.handle_pointer(PointerEvent::cancel(0.0, 0.0)).expect("cancel"),
            PointerEffect::Canceled
        );
        assert_eq!(wm.drag_state(), DragState::Idle);
        assert!(!wm.instance(scene).expect("instance").label.is_dragging());
    }

    #[test]
    fn dragging_divider_updates_ratio() {
        let mut wm = manager();
        wm.get_or_create_tab("scene").expect("scene");
        let console = wm.get_or_create_tab("console").expect("console");
        let root = wm.tree().root();
        wm.split_panel(root, console, PanelRegion::Left).expect("split");

        let divider = *wm.layout().divider(root).expect("divider");
        let grab = center(divider.rect);
        assert_eq!(
            wm.handle_pointer(PointerEvent::down(grab.x, grab.y)).expect("down"),
            PointerEffect::ResizeStarted { split: root }
        );
        let target = Point::new(divider.container.x + divider.container.width * 0.5, grab.y);
        let effect = wm
            .handle_pointer(PointerEvent::moved(target.x, target.y))
            .expect("move");
        let PointerEffect::Resized { split, ratio } = effect else {
            panic!("expected resize, got {effect:?}");
        };
        assert_eq!(split, root);
        assert!((ratio - 0.5).abs() < 1e-4);
        assert_eq!(
            wm.handle_pointer(PointerEvent::up(target.x, target.y)).expect("up"),
            PointerEffect::ResizeEnded { split: root }
        );

        // Past the clamp range.
        wm.set_split_ratio(root, 1.5).expect("ratio");
        assert_eq!(wm.tree().node(root).map(|node| node.ratio), Some(0.9));
    }

    #[test]
    fn resize_re_solves_geometry() {
        let mut wm = manager();
        let root = wm.tree().root();
        let area = Rect::new(10.0, 20.0, 300.0, 200.0);
        wm.resize(area).expect("resize");
        assert_eq!(wm.area(), area);
        assert_eq!(wm.layout().panel(root), Some(area));
    }

    #[test]
    fn secondary_button_is_ignored() {
        let mut wm = manager();
        let effect = wm
            .handle_pointer(PointerEvent::new(
                PointerEventKind::Down(PointerButton::Secondary),
                Point::new(10.0, 10.0),
            ))
            .expect("down");
        assert_eq!(
            effect,
            PointerEffect::Noop {
                reason: PointerNoopReason::NonPrimaryButton
            }
        );
    }
}
