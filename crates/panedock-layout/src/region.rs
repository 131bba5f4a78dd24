#![forbid(unsafe_code)]

//! Drop-region classification and divider drag mapping.

use panedock_core::geometry::Point;
use serde::{Deserialize, Serialize};

use crate::tree::SplitOrientation;

/// Part of a leaf viewport a dragged tab is released over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelRegion {
    Center,
    Left,
    Top,
    Right,
    Bottom,
}

impl PanelRegion {
    /// Classify a point normalized to the viewport (`y` grows downward).
    ///
    /// Vertical edge zones win over horizontal ones, so corners resolve to
    /// `Left` or `Right`.
    #[must_use]
    pub fn classify(normalized: Point, margin: f32) -> Self {
        let Point { x, y } = normalized;
        if x < margin {
            Self::Left
        } else if x > 1.0 - margin {
            Self::Right
        } else if y < margin {
            Self::Top
        } else if y > 1.0 - margin {
            Self::Bottom
        } else {
            Self::Center
        }
    }

    /// Orientation of the split a drop in this region creates.
    #[must_use]
    pub const fn orientation(self) -> Option<SplitOrientation> {
        match self {
            Self::Center => None,
            Self::Top | Self::Bottom => Some(SplitOrientation::Horizontal),
            Self::Left | Self::Right => Some(SplitOrientation::Vertical),
        }
    }

    /// Whether the incoming tab becomes the first child of the new split.
    #[must_use]
    pub const fn incoming_first(self) -> bool {
        matches!(self, Self::Left | Self::Top)
    }

    /// Edge region on `orientation` that puts the incoming tab first or
    /// second.
    #[must_use]
    pub const fn edge(orientation: SplitOrientation, incoming_first: bool) -> Self {
        match (orientation, incoming_first) {
            (SplitOrientation::Horizontal, true) => Self::Top,
            (SplitOrientation::Horizontal, false) => Self::Bottom,
            (SplitOrientation::Vertical, true) => Self::Left,
            (SplitOrientation::Vertical, false) => Self::Right,
        }
    }
}

/// Raw split ratio for a divider dragged to `normalized` within the split's
/// rect.
///
/// Vertical splits follow `x`. Horizontal splits follow the distance from
/// the top edge, which equals `1 - y` when `y` is measured upward from the
/// bottom. The result is unclamped.
#[must_use]
pub fn divider_ratio(orientation: SplitOrientation, normalized: Point) -> f32 {
    match orientation {
        SplitOrientation::Vertical => normalized.x,
        SplitOrientation::Horizontal => normalized.y,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_edges_and_center() {
        assert_eq!(
            PanelRegion::classify(Point::new(0.1, 0.5), 0.3),
            PanelRegion::Left
        );
        assert_eq!(
            PanelRegion::classify(Point::new(0.5, 0.5), 0.3),
            PanelRegion::Center
        );
        assert_eq!(
            PanelRegion::classify(Point::new(0.9, 0.5), 0.3),
            PanelRegion::Right
        );
        assert_eq!(
            PanelRegion::classify(Point::new(0.5, 0.1), 0.3),
            PanelRegion::Top
        );
        assert_eq!(
            PanelRegion::classify(Point::new(0.5, 0.95), 0.3),
            PanelRegion::Bottom
        );
    }

    #[test]
    fn corners_resolve_to_vertical_edges() {
        assert_eq!(
            PanelRegion::classify(Point::new(0.05, 0.05), 0.25),
            PanelRegion::Left
        );
        assert_eq!(
            PanelRegion::classify(Point::new(0.95, 0.95), 0.25),
            PanelRegion::Right
        );
    }

    #[test]
    fn zero_margin_is_always_center_inside() {
        assert_eq!(
            PanelRegion::classify(Point::new(0.0, 0.0), 0.0),
            PanelRegion::Center
        );
    }

    #[test]
    fn region_orientation_mapping() {
        assert_eq!(PanelRegion::Center.orientation(), None);
        assert_eq!(
            PanelRegion::Top.orientation(),
            Some(SplitOrientation::Horizontal)
        );
        assert_eq!(
            PanelRegion::Right.orientation(),
            Some(SplitOrientation::Vertical)
        );
        assert!(PanelRegion::Left.incoming_first());
        assert!(!PanelRegion::Bottom.incoming_first());
        for region in [
            PanelRegion::Left,
            PanelRegion::Top,
            PanelRegion::Right,
            PanelRegion::Bottom,
        ] {
            let orientation = region.orientation().expect("edge region");
            assert_eq!(
                PanelRegion::edge(orientation, region.incoming_first()),
                region
            );
        }
    }

    #[test]
    fn divider_ratio_follows_drag_axis() {
        let point = Point::new(0.25, 0.8);
        assert_eq!(divider_ratio(SplitOrientation::Vertical, point), 0.25);
        assert_eq!(divider_ratio(SplitOrientation::Horizontal, point), 0.8);
    }
}
