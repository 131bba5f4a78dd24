#![forbid(unsafe_code)]

//! Portable layout tree.
//!
//! [`LayoutTree`] is the persisted form of a panel tree: a recursive record
//! with camelCase field names on the wire.
//!
//! ```json
//! {
//!   "splitOrientation": "Vertical",
//!   "splitPosition": 0.3,
//!   "childA": { "splitOrientation": "Horizontal", "splitPosition": 0.5, "dockedTabs": ["hierarchy"] },
//!   "childB": { "splitOrientation": "Horizontal", "splitPosition": 0.5, "dockedTabs": ["scene", "game"] },
//!   "dockedTabs": []
//! }
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::grid::FitType;
use crate::panel::PanelModelError;
use crate::tab::TabKind;

/// Axis along which a split arranges its two children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SplitOrientation {
    /// Children stacked top and bottom; weighted by height.
    #[default]
    Horizontal,
    /// Children side by side; weighted by width.
    Vertical,
}

impl SplitOrientation {
    /// Grid fit that lays out a two-child split along this orientation.
    #[must_use]
    pub const fn grid_fit(self) -> FitType {
        match self {
            Self::Horizontal => FitType::MaxRows(2),
            Self::Vertical => FitType::MaxColumns(2),
        }
    }

    #[must_use]
    pub const fn stable_tag(self) -> u8 {
        match self {
            Self::Horizontal => 0,
            Self::Vertical => 1,
        }
    }
}

fn default_split_position() -> f32 {
    0.5
}

/// Serializable split-tree description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutTree {
    #[serde(default)]
    pub split_orientation: SplitOrientation,
    #[serde(default = "default_split_position")]
    pub split_position: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_a: Option<Box<LayoutTree>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_b: Option<Box<LayoutTree>>,
    #[serde(default)]
    pub docked_tabs: Vec<TabKind>,
}

impl Default for LayoutTree {
    fn default() -> Self {
        Self::leaf(Vec::<TabKind>::new())
    }
}

impl LayoutTree {
    /// Leaf holding `tabs` in order.
    #[must_use]
    pub fn leaf<K: Into<TabKind>>(tabs: impl IntoIterator<Item = K>) -> Self {
        Self {
            split_orientation: SplitOrientation::default(),
            split_position: default_split_position(),
            child_a: None,
            child_b: None,
            docked_tabs: tabs.into_iter().map(Into::into).collect(),
        }
    }

    /// Split node over two subtrees.
    #[must_use]
    pub fn split(
        orientation: SplitOrientation,
        position: f32,
        child_a: LayoutTree,
        child_b: LayoutTree,
    ) -> Self {
        Self {
            split_orientation: orientation,
            split_position: position,
            child_a: Some(Box::new(child_a)),
            child_b: Some(Box::new(child_b)),
            docked_tabs: Vec::new(),
        }
    }

    /// True when both children are absent.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.child_a.is_none() && self.child_b.is_none()
    }

    /// Both children, when this node is a well-formed split.
    #[must_use]
    pub fn children(&self) -> Option<(&LayoutTree, &LayoutTree)> {
        match (&self.child_a, &self.child_b) {
            (Some(a), Some(b)) => Some((a, b)),
            _ => None,
        }
    }

    /// Number of leaves in this subtree.
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        match self.children() {
            Some((a, b)) => a.leaf_count() + b.leaf_count(),
            None => 1,
        }
    }

    /// Tab kinds in depth-first order.
    #[must_use]
    pub fn tab_kinds(&self) -> Vec<&TabKind> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            out.extend(node.docked_tabs.iter());
            if let Some((a, b)) = node.children() {
                stack.push(b);
                stack.push(a);
            }
        }
        out
    }

    /// Check the structural rules of the whole tree.
    ///
    /// A node must have zero or two children, and a split must not carry
    /// tabs. Errors name the offending node by its path from the root
    /// (`root`, `root.a`, `root.a.b`, ...).
    pub fn validate(&self) -> Result<(), LayoutTreeError> {
        let mut stack = vec![(self, String::from("root"))];
        while let Some((node, path)) = stack.pop() {
            match (&node.child_a, &node.child_b) {
                (None, None) => {}
                (Some(a), Some(b)) => {
                    if !node.docked_tabs.is_empty() {
                        return Err(LayoutTreeError::SplitWithTabs {
                            path,
                            tab_count: node.docked_tabs.len(),
                        });
                    }
                    stack.push((b, format!("{path}.b")));
                    stack.push((a, format!("{path}.a")));
                }
                _ => return Err(LayoutTreeError::HalfSplit { path }),
            }
        }
        Ok(())
    }

    /// Structural equality with float tolerance on split positions.
    #[must_use]
    pub fn approx_eq(&self, other: &LayoutTree, tolerance: f32) -> bool {
        if self.split_orientation != other.split_orientation
            || (self.split_position - other.split_position).abs() > tolerance
            || self.docked_tabs != other.docked_tabs
        {
            return false;
        }
        match (self.children(), other.children()) {
            (None, None) => self.is_leaf() && other.is_leaf(),
            (Some((a, b)), Some((c, d))) => a.approx_eq(c, tolerance) && b.approx_eq(d, tolerance),
            _ => false,
        }
    }
}

/// Problems turning a [`LayoutTree`] into a panel tree.
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutTreeError {
    /// Exactly one of `childA` / `childB` is present.
    HalfSplit { path: String },
    /// A node with two children also lists docked tabs.
    SplitWithTabs { path: String, tab_count: usize },
    /// The instantiated tree failed validation.
    Rejected(PanelModelError),
}

impl fmt::Display for LayoutTreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HalfSplit { path } => {
                write!(f, "layout node {path} has exactly one child")
            }
            Self::SplitWithTabs { path, tab_count } => write!(
                f,
                "layout node {path} has two children and {tab_count} docked tabs"
            ),
            Self::Rejected(err) => write!(f, "imported layout is inconsistent: {err}"),
        }
    }
}

impl std::error::Error for LayoutTreeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Rejected(err) => Some(err),
            _ => None,
        }
    }
}
