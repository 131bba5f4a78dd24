#![forbid(unsafe_code)]

//! Panel split tree, layout-tree schema, and flexible grid solver.
//!
//! # Role in panedock
//! `panedock-layout` is the pure model layer. It owns the binary split
//! [`PanelTree`] and every structural operation on it, the persistable
//! [`LayoutTree`] schema, and the geometry solver that turns the tree into
//! rectangles. It performs no I/O beyond loading [`DockConfig`] and knows
//! nothing about tab content.
//!
//! # Example
//! ```
//! use panedock_core::geometry::Rect;
//! use panedock_layout::{DockConfig, PanelOperation, PanelRegion, PanelTree, TabKind};
//!
//! let mut tree = PanelTree::new(DockConfig::default());
//! let root = tree.root();
//! let open = |tree: &mut PanelTree, name: &str| {
//!     tree.apply_operation(0, PanelOperation::OpenTab { kind: TabKind::new(name), leaf: root })
//!         .ok()
//!         .and_then(|outcome| outcome.created_tab)
//! };
//! let scene = open(&mut tree, "scene");
//! let console = open(&mut tree, "console").expect("open console");
//! assert!(scene.is_some());
//!
//! tree.apply_operation(1, PanelOperation::Split {
//!     leaf: root,
//!     tab: console,
//!     region: PanelRegion::Bottom,
//! })
//! .expect("split");
//!
//! let layout = tree.solve_layout(Rect::from_size(800.0, 600.0)).expect("solve");
//! assert_eq!(layout.dividers().count(), 1);
//! ```

pub mod config;
pub mod grid;
pub mod panel;
pub mod panel_layout;
pub mod region;
pub mod tab;
pub mod tree;

pub use config::{ConfigError, DockConfig};
pub use grid::{FitType, FlexWeight, FlexibleGrid, GridArrangement};
pub use panel::{
    PanelContent, PanelId, PanelModelError, PanelNode, PanelOperation, PanelOperationError,
    PanelOperationFailure, PanelOperationKind, PanelOperationOutcome, PanelTree,
};
pub use panel_layout::{Divider, DropTarget, PanelLayout};
pub use region::{PanelRegion, divider_ratio};
pub use tab::{TabId, TabKind, TabRecord};
pub use tree::{LayoutTree, LayoutTreeError, SplitOrientation};
