#![forbid(unsafe_code)]

//! Geometry for a [`PanelTree`].
//!
//! Each split lays its two children out with a [`FlexibleGrid`]: two rows
//! for `Horizontal`, two columns for `Vertical`, separated by a gap of
//! `divider_thickness` that doubles as the divider's hit area. Every leaf is
//! cut into a tab bar strip and a content viewport; labels share the bar
//! evenly.

use std::collections::BTreeMap;

use panedock_core::geometry::{Point, Rect};
use rustc_hash::FxHashMap;

use crate::grid::{FlexWeight, FlexibleGrid};
use crate::panel::{PanelContent, PanelId, PanelModelError, PanelTree};
use crate::region::PanelRegion;
use crate::tab::TabId;
use crate::tree::SplitOrientation;

/// Where a dragged tab would land.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropTarget {
    /// Over a leaf's tab bar: dock into that leaf.
    TabBar { panel: PanelId },
    /// Over a leaf's viewport, in `region`.
    Viewport { panel: PanelId, region: PanelRegion },
}

impl DropTarget {
    #[must_use]
    pub const fn panel(self) -> PanelId {
        match self {
            Self::TabBar { panel } | Self::Viewport { panel, .. } => panel,
        }
    }
}

/// A draggable divider between two split children.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Divider {
    pub split: PanelId,
    pub orientation: SplitOrientation,
    /// Gap between the two children.
    pub rect: Rect,
    /// Full rect of the split node; drag positions are normalized to it.
    pub container: Rect,
}

/// Solved geometry of every panel, tab bar, label and divider.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PanelLayout {
    pub area: Rect,
    panels: BTreeMap<PanelId, Rect>,
    tab_bars: BTreeMap<PanelId, Rect>,
    viewports: BTreeMap<PanelId, Rect>,
    labels: FxHashMap<TabId, Rect>,
    dividers: BTreeMap<PanelId, Divider>,
}

impl PanelLayout {
    /// Outer rect of any panel.
    #[must_use]
    pub fn panel(&self, id: PanelId) -> Option<Rect> {
        self.panels.get(&id).copied()
    }

    /// Tab label strip of a leaf.
    #[must_use]
    pub fn tab_bar(&self, id: PanelId) -> Option<Rect> {
        self.tab_bars.get(&id).copied()
    }

    /// Content viewport of a leaf.
    #[must_use]
    pub fn viewport(&self, id: PanelId) -> Option<Rect> {
        self.viewports.get(&id).copied()
    }

    #[must_use]
    pub fn label(&self, tab: TabId) -> Option<Rect> {
        self.labels.get(&tab).copied()
    }

    #[must_use]
    pub fn divider(&self, split: PanelId) -> Option<&Divider> {
        self.dividers.get(&split)
    }

    pub fn dividers(&self) -> impl Iterator<Item = &Divider> {
        self.dividers.values()
    }

    /// Leaf whose rect contains `point`.
    #[must_use]
    pub fn leaf_at(&self, point: Point) -> Option<PanelId> {
        self.tab_bars
            .keys()
            .copied()
            .find(|id| self.panels.get(id).is_some_and(|rect| rect.contains(point)))
    }

    /// Split whose divider contains `point`.
    #[must_use]
    pub fn divider_at(&self, point: Point) -> Option<&Divider> {
        self.dividers
            .values()
            .find(|divider| divider.rect.contains(point))
    }

    /// Tab whose label contains `point`.
    #[must_use]
    pub fn label_at(&self, point: Point) -> Option<TabId> {
        self.labels
            .iter()
            .find(|(_, rect)| rect.contains(point))
            .map(|(tab, _)| *tab)
    }

    /// Drop target under `point`, classifying viewport hits with `margin`.
    #[must_use]
    pub fn drop_target_at(&self, point: Point, margin: f32) -> Option<DropTarget> {
        if let Some((&panel, _)) = self.tab_bars.iter().find(|(_, bar)| bar.contains(point)) {
            return Some(DropTarget::TabBar { panel });
        }
        self.viewports
            .iter()
            .find(|(_, viewport)| viewport.contains(point))
            .map(|(&panel, viewport)| DropTarget::Viewport {
                panel,
                region: PanelRegion::classify(viewport.normalize(point), margin),
            })
    }
}

impl PanelTree {
    /// Solve geometry for the whole tree inside `area`.
    pub fn solve_layout(&self, area: Rect) -> Result<PanelLayout, PanelModelError> {
        let config = self.config();
        let mut layout = PanelLayout {
            area,
            ..PanelLayout::default()
        };

        let mut stack = vec![(self.root(), area, None)];
        while let Some((id, rect, parent)) = stack.pop() {
            let node = self.node(id).ok_or(match parent {
                Some(parent) => PanelModelError::MissingChild { parent, child: id },
                None => PanelModelError::MissingRoot { root: id },
            })?;
            layout.panels.insert(id, rect);

            match &node.content {
                PanelContent::Leaf { tabs, .. } => {
                    let (bar, viewport) = rect.split_top(config.tab_bar_height);
                    layout.tab_bars.insert(id, bar);
                    layout.viewports.insert(id, viewport);
                    let labels =
                        FlexibleGrid::rows(1).arrange(bar, &vec![FlexWeight::default(); tabs.len()]);
                    for (tab, label) in tabs.iter().zip(labels.rects) {
                        layout.labels.insert(*tab, label);
                    }
                }
                PanelContent::Split { first, second } => {
                    let weights = [first, second].map(|child| {
                        self.node(*child)
                            .map_or_else(FlexWeight::default, |child| child.flex)
                    });
                    let thickness = config.divider_thickness;
                    let cells = FlexibleGrid::new()
                        .fit(node.orientation.grid_fit())
                        .spacing(thickness, thickness)
                        .padding(config.panel_padding)
                        .arrange(rect, &weights);
                    let [first_rect, second_rect] = match cells.rects.as_slice() {
                        [a, b] => [*a, *b],
                        _ => [rect, Rect::new(rect.right(), rect.bottom(), 0.0, 0.0)],
                    };
                    let gap = match node.orientation {
                        SplitOrientation::Vertical => Rect::new(
                            first_rect.right(),
                            first_rect.y,
                            second_rect.x - first_rect.right(),
                            first_rect.height,
                        ),
                        SplitOrientation::Horizontal => Rect::new(
                            first_rect.x,
                            first_rect.bottom(),
                            first_rect.width,
                            second_rect.y - first_rect.bottom(),
                        ),
                    };
                    layout.dividers.insert(
                        id,
                        Divider {
                            split: id,
                            orientation: node.orientation,
                            rect: gap,
                            container: rect,
                        },
                    );
                    stack.push((*second, second_rect, Some(id)));
                    stack.push((*first, first_rect, Some(id)));
                }
            }
        }

        Ok(layout)
    }
}
