#![forbid(unsafe_code)]

//! Tab labels and live tab instances.

use std::cell::OnceCell;
use std::fmt;

use panedock_core::geometry::Point;
use panedock_layout::{PanelId, TabId, TabKind};

use crate::registry::{IconAsset, TabContent};

/// Floating state of a label while it is being dragged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelDrag {
    /// Label origin minus the pointer position at drag start.
    pub offset: Point,
    /// Current label origin.
    pub position: Point,
}

/// Clickable, draggable label of one tab.
#[derive(Debug, Clone)]
pub struct TabLabel {
    tab: OnceCell<TabId>,
    kind: TabKind,
    display_name: String,
    icon: Option<IconAsset>,
    host: Option<PanelId>,
    drag: Option<LabelDrag>,
}

impl TabLabel {
    #[must_use]
    pub fn new(kind: TabKind, display_name: impl Into<String>, icon: Option<IconAsset>) -> Self {
        Self {
            tab: OnceCell::new(),
            kind,
            display_name: display_name.into(),
            icon,
            host: None,
            drag: None,
        }
    }

    /// Bind the label to its tab. A label can be bound only once.
    pub fn bind(&self, tab: TabId) -> Result<(), TabLabelError> {
        self.tab.set(tab).map_err(|requested| TabLabelError::AlreadyBound {
            bound: self.tab.get().copied().unwrap_or(requested),
            requested,
        })
    }

    #[must_use]
    pub fn tab(&self) -> Option<TabId> {
        self.tab.get().copied()
    }

    #[must_use]
    pub fn kind(&self) -> &TabKind {
        &self.kind
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    #[must_use]
    pub fn icon(&self) -> Option<&IconAsset> {
        self.icon.as_ref()
    }

    /// Leaf whose tab bar currently shows this label.
    #[must_use]
    pub fn host(&self) -> Option<PanelId> {
        self.host
    }

    pub(crate) fn set_host(&mut self, host: Option<PanelId>) {
        self.host = host;
    }

    /// Detach the label from layout and make it follow the pointer.
    pub fn begin_drag(&mut self, pointer: Point, offset: Point) {
        self.drag = Some(LabelDrag {
            offset,
            position: pointer.offset(offset),
        });
    }

    pub fn drag_to(&mut self, pointer: Point) {
        if let Some(drag) = self.drag.as_mut() {
            drag.position = pointer.offset(drag.offset);
        }
    }

    /// Return the label to its tab bar.
    pub fn end_drag(&mut self) {
        self.drag = None;
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    #[must_use]
    pub fn drag(&self) -> Option<LabelDrag> {
        self.drag
    }

    /// Floating labels are positioned by the drag, not by the tab bar.
    #[must_use]
    pub fn ignores_layout(&self) -> bool {
        self.drag.is_some()
    }

    /// A floating label lets hit tests through so drop targets underneath
    /// can be found.
    #[must_use]
    pub fn blocks_raycasts(&self) -> bool {
        self.drag.is_none()
    }
}

/// Label binding errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabLabelError {
    AlreadyBound { bound: TabId, requested: TabId },
}

impl fmt::Display for TabLabelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyBound { bound, requested } => {
                write!(f, "label already bound to {bound}, cannot bind {requested}")
            }
        }
    }
}

impl std::error::Error for TabLabelError {}

/// Content and label of one live tab.
pub struct TabInstance {
    pub content: Box<dyn TabContent>,
    pub label: TabLabel,
    visible: bool,
}

impl TabInstance {
    #[must_use]
    pub fn new(content: Box<dyn TabContent>, label: TabLabel) -> Self {
        Self {
            content,
            label,
            visible: false,
        }
    }

    /// Whether the tab is currently the selected tab of its leaf.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Update visibility, firing `on_show` / `on_hide` on change.
    pub(crate) fn set_visible(&mut self, visible: bool) {
        if visible == self.visible {
            return;
        }
        self.visible = visible;
        if visible {
            self.content.on_show();
        } else {
            self.content.on_hide();
        }
    }
}

impl fmt::Debug for TabInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TabInstance")
            .field("label", &self.label)
            .field("visible", &self.visible)
            .finish_non_exhaustive()
    }
}
