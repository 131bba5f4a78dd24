#![forbid(unsafe_code)]

//! Flexible grid solver.
//!
//! [`FlexibleGrid`] places `N` weighted items into rows or columns of a
//! container. Items flow into "lines" (rows for row-major, columns for
//! column-major). Along a line every item receives a share of the line's
//! extent proportional to its [`FlexWeight`] on that axis; across lines the
//! container is divided evenly.
//!
//! | fit | grid | flow | flexible axis |
//! |---|---|---|---|
//! | `None` | `ceil(sqrt N)` columns | row-major | width |
//! | `MaxColumns(c)` | `c` columns, `ceil(N / c)` rows | row-major | width |
//! | `MaxRows(r)` | `r` rows, `ceil(N / r)` columns | column-major | height |
//!
//! The solver is a pure function: the same inputs always produce the same
//! rectangles.

use panedock_core::geometry::{Rect, Sides, Size};
use serde::{Deserialize, Serialize};

/// Flexible weight pair contributed by one item.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlexWeight {
    pub width: f32,
    pub height: f32,
}

impl FlexWeight {
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Equal weight on both axes.
    #[must_use]
    pub const fn uniform(weight: f32) -> Self {
        Self::new(weight, weight)
    }
}

impl Default for FlexWeight {
    fn default() -> Self {
        Self::uniform(1.0)
    }
}

/// How the grid dimensions are derived from the item count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitType {
    /// Square-ish grid: `columns = ceil(sqrt(n))`, `rows = ceil(n / columns)`,
    /// so five items fill 3 columns by 2 rows rather than a 3x3 grid.
    #[default]
    None,
    /// Fixed column count; rows grow with the item count.
    MaxColumns(usize),
    /// Fixed row count; columns grow with the item count.
    MaxRows(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    /// Lines are rows; items flex along x.
    RowMajor,
    /// Lines are columns; items flex along y.
    ColumnMajor,
}

/// Result of one [`FlexibleGrid::arrange`] pass.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GridArrangement {
    pub columns: usize,
    pub rows: usize,
    /// One rectangle per input item, in input order.
    pub rects: Vec<Rect>,
}

impl GridArrangement {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }
}

/// A flexible grid container.
#[derive(Debug, Clone, PartialEq)]
pub struct FlexibleGrid {
    fit: FitType,
    spacing_x: f32,
    spacing_y: f32,
    padding: Sides,
    free_aspect: bool,
    aspect_ratio: Size,
}

impl Default for FlexibleGrid {
    fn default() -> Self {
        Self {
            fit: FitType::None,
            spacing_x: 0.0,
            spacing_y: 0.0,
            padding: Sides::default(),
            free_aspect: true,
            aspect_ratio: Size::new(1.0, 1.0),
        }
    }
}

impl FlexibleGrid {
    /// Create a square-ish grid with no spacing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fixed column count, row-major flow.
    #[must_use]
    pub fn columns(columns: usize) -> Self {
        Self::default().fit(FitType::MaxColumns(columns))
    }

    /// Fixed row count, column-major flow.
    #[must_use]
    pub fn rows(rows: usize) -> Self {
        Self::default().fit(FitType::MaxRows(rows))
    }

    /// Set the fit type.
    #[must_use]
    pub fn fit(mut self, fit: FitType) -> Self {
        self.fit = fit;
        self
    }

    /// Set spacing between adjacent items (x) and lines (y).
    #[must_use]
    pub fn spacing(mut self, x: f32, y: f32) -> Self {
        self.spacing_x = x.max(0.0);
        self.spacing_y = y.max(0.0);
        self
    }

    /// Set the padding inset from the container.
    #[must_use]
    pub fn padding(mut self, padding: Sides) -> Self {
        self.padding = padding;
        self
    }

    /// Constrain every cell to `aspect_ratio` (width:height).
    #[must_use]
    pub fn fixed_aspect(mut self, aspect_ratio: Size) -> Self {
        self.free_aspect = false;
        self.aspect_ratio = aspect_ratio;
        self
    }

    /// Let cells take any aspect ratio (the default).
    #[must_use]
    pub fn free_aspect(mut self) -> Self {
        self.free_aspect = true;
        self
    }

    /// Grid dimensions `(columns, rows)` for `count` items.
    #[must_use]
    pub fn dimensions(&self, count: usize) -> (usize, usize) {
        if count == 0 {
            return (0, 0);
        }
        let (columns, rows, _) = self.resolve(count);
        (columns, rows)
    }

    fn resolve(&self, count: usize) -> (usize, usize, Flow) {
        match self.fit {
            FitType::None => {
                let columns = ceil_sqrt(count);
                (columns, count.div_ceil(columns), Flow::RowMajor)
            }
            FitType::MaxColumns(columns) => {
                let columns = columns.max(1);
                (columns, count.div_ceil(columns), Flow::RowMajor)
            }
            FitType::MaxRows(rows) => {
                let rows = rows.max(1);
                (count.div_ceil(rows), rows, Flow::ColumnMajor)
            }
        }
    }

    /// Place `weights.len()` items inside `container`.
    #[must_use]
    pub fn arrange(&self, container: Rect, weights: &[FlexWeight]) -> GridArrangement {
        let count = weights.len();
        if count == 0 {
            return GridArrangement::default();
        }

        let (columns, rows, flow) = self.resolve(count);
        let (lines, per_line) = match flow {
            Flow::RowMajor => (rows, columns),
            Flow::ColumnMajor => (columns, rows),
        };

        let inner = container.inner(self.padding);
        let (main_spacing, cross_spacing) = match flow {
            Flow::RowMajor => (self.spacing_x, self.spacing_y),
            Flow::ColumnMajor => (self.spacing_y, self.spacing_x),
        };
        let (main_extent, cross_extent, main_origin, cross_origin) = match flow {
            Flow::RowMajor => (inner.width, inner.height, inner.x, inner.y),
            Flow::ColumnMajor => (inner.height, inner.width, inner.y, inner.x),
        };

        let cross_spacing = fit_spacing(cross_spacing, cross_extent, lines);
        let line_thickness =
            ((cross_extent - cross_spacing * (lines - 1) as f32) / lines as f32).max(0.0);

        let mut rects = Vec::with_capacity(count);
        for line in 0..lines {
            let start = line * per_line;
            if start >= count {
                break;
            }
            let present = per_line.min(count - start);
            let line_weights = &weights[start..start + present];

            let weight_of = |weight: &FlexWeight| match flow {
                Flow::RowMajor => weight.width.max(0.0),
                Flow::ColumnMajor => weight.height.max(0.0),
            };
            let weight_sum: f32 = line_weights.iter().map(weight_of).sum();
            let main_spacing = fit_spacing(main_spacing, main_extent, present);
            let available = (main_extent - main_spacing * (present - 1) as f32).max(0.0);
            let line_offset = cross_origin + line as f32 * (line_thickness + cross_spacing);

            let mut cursor = main_origin;
            for weight in line_weights {
                let share = if weight_sum > 0.0 {
                    weight_of(weight) / weight_sum
                } else {
                    1.0 / present as f32
                };
                let along = available * share;

                let (mut width, mut height) = match flow {
                    Flow::RowMajor => (along, line_thickness),
                    Flow::ColumnMajor => (line_thickness, along),
                };
                if !self.free_aspect {
                    (width, height) = constrain_aspect(width, height, self.aspect_ratio);
                }

                let rect = match flow {
                    Flow::RowMajor => Rect::new(cursor, line_offset, width, height),
                    Flow::ColumnMajor => Rect::new(line_offset, cursor, width, height),
                };
                rects.push(rect);

                cursor += match flow {
                    Flow::RowMajor => width,
                    Flow::ColumnMajor => height,
                } + main_spacing;
            }
        }

        GridArrangement {
            columns,
            rows,
            rects,
        }
    }
}

/// Shrink whichever side is relatively larger so `width:height` matches
/// `aspect`. The tighter side is kept.
fn constrain_aspect(width: f32, height: f32, aspect: Size) -> (f32, f32) {
    if aspect.width <= 0.0 || aspect.height <= 0.0 {
        return (width, height);
    }
    if height / aspect.height > width / aspect.width {
        (width, width * aspect.height / aspect.width)
    } else {
        (height * aspect.width / aspect.height, height)
    }
}

/// Spacing between `count` items, shrunk so the gaps alone never overflow
/// `extent`.
fn fit_spacing(spacing: f32, extent: f32, count: usize) -> f32 {
    if count < 2 {
        return spacing;
    }
    spacing.min(extent.max(0.0) / (count - 1) as f32)
}

fn ceil_sqrt(count: usize) -> usize {
    let mut root = (count as f64).sqrt() as usize;
    while root * root < count {
        root += 1;
    }
    root.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const EPS: f32 = 1e-3;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < EPS
    }

    fn assert_rect(actual: Rect, expected: Rect) {
        assert!(
            approx(actual.x, expected.x)
                && approx(actual.y, expected.y)
                && approx(actual.width, expected.width)
                && approx(actual.height, expected.height),
            "expected {expected:?}, got {actual:?}"
        );
    }

    #[test]
    fn empty_input_is_noop() {
        let grid = FlexibleGrid::columns(0);
        let arrangement = grid.arrange(Rect::from_size(100.0, 100.0), &[]);
        assert!(arrangement.is_empty());
        assert_eq!(grid.dimensions(0), (0, 0));
    }

    #[test]
    fn four_equal_items_in_two_columns_tile_container() {
        let arrangement = FlexibleGrid::columns(2)
            .arrange(Rect::from_size(200.0, 100.0), &[FlexWeight::default(); 4]);
        assert_eq!((arrangement.columns, arrangement.rows), (2, 2));
        assert_rect(arrangement.rects[0], Rect::new(0.0, 0.0, 100.0, 50.0));
        assert_rect(arrangement.rects[1], Rect::new(100.0, 0.0, 100.0, 50.0));
        assert_rect(arrangement.rects[2], Rect::new(0.0, 50.0, 100.0, 50.0));
        assert_rect(arrangement.rects[3], Rect::new(100.0, 50.0, 100.0, 50.0));
    }

    #[test]
    fn weights_split_line_proportionally() {
        let arrangement = FlexibleGrid::columns(2).arrange(
            Rect::from_size(100.0, 40.0),
            &[FlexWeight::new(30.0, 1.0), FlexWeight::new(70.0, 1.0)],
        );
        assert_rect(arrangement.rects[0], Rect::new(0.0, 0.0, 30.0, 40.0));
        assert_rect(arrangement.rects[1], Rect::new(30.0, 0.0, 70.0, 40.0));
    }

    #[test]
    fn max_rows_flexes_along_height() {
        let arrangement = FlexibleGrid::rows(2).arrange(
            Rect::from_size(80.0, 100.0),
            &[FlexWeight::new(1.0, 25.0), FlexWeight::new(1.0, 75.0)],
        );
        assert_eq!((arrangement.columns, arrangement.rows), (1, 2));
        assert_rect(arrangement.rects[0], Rect::new(0.0, 0.0, 80.0, 25.0));
        assert_rect(arrangement.rects[1], Rect::new(0.0, 25.0, 80.0, 75.0));
    }

    #[test]
    fn incomplete_last_row_uses_only_present_weights() {
        let arrangement = FlexibleGrid::columns(2)
            .arrange(Rect::from_size(100.0, 100.0), &[FlexWeight::default(); 3]);
        assert_rect(arrangement.rects[2], Rect::new(0.0, 50.0, 100.0, 50.0));
    }

    #[test]
    fn none_fit_builds_square_grid() {
        let grid = FlexibleGrid::new();
        assert_eq!(grid.dimensions(1), (1, 1));
        assert_eq!(grid.dimensions(4), (2, 2));
        assert_eq!(grid.dimensions(5), (3, 2));
        assert_eq!(grid.dimensions(9), (3, 3));
        assert_eq!(grid.dimensions(10), (4, 3));
    }

    #[test]
    fn zero_fixed_count_is_treated_as_one() {
        assert_eq!(FlexibleGrid::columns(0).dimensions(3), (1, 3));
        assert_eq!(FlexibleGrid::rows(0).dimensions(3), (3, 1));
    }

    #[test]
    fn spacing_and_padding_are_respected() {
        let arrangement = FlexibleGrid::columns(2)
            .spacing(10.0, 6.0)
            .padding(Sides::all(5.0))
            .arrange(Rect::from_size(120.0, 66.0), &[FlexWeight::default(); 4]);
        // inner = 110 x 56; columns (110 - 10) / 2 = 50; rows (56 - 6) / 2 = 25
        assert_rect(arrangement.rects[0], Rect::new(5.0, 5.0, 50.0, 25.0));
        assert_rect(arrangement.rects[1], Rect::new(65.0, 5.0, 50.0, 25.0));
        assert_rect(arrangement.rects[2], Rect::new(5.0, 36.0, 50.0, 25.0));
        assert_rect(arrangement.rects[3], Rect::new(65.0, 36.0, 50.0, 25.0));
    }

    #[test]
    fn oversized_spacing_is_shrunk_to_fit() {
        let arrangement = FlexibleGrid::columns(2)
            .spacing(10.0, 0.0)
            .arrange(Rect::from_size(4.0, 10.0), &[FlexWeight::default(); 2]);
        assert_rect(arrangement.rects[0], Rect::new(0.0, 0.0, 0.0, 10.0));
        assert_rect(arrangement.rects[1], Rect::new(4.0, 0.0, 0.0, 10.0));
    }

    #[test]
    fn zero_weight_line_divides_evenly() {
        let arrangement = FlexibleGrid::columns(2)
            .arrange(Rect::from_size(100.0, 10.0), &[FlexWeight::uniform(0.0); 2]);
        assert_rect(arrangement.rects[0], Rect::new(0.0, 0.0, 50.0, 10.0));
        assert_rect(arrangement.rects[1], Rect::new(50.0, 0.0, 50.0, 10.0));
    }

    #[test]
    fn fixed_aspect_shrinks_relatively_larger_side() {
        // Cell would be 100 x 50; with 1:1 the width shrinks to 50.
        let arrangement = FlexibleGrid::columns(1)
            .fixed_aspect(Size::new(1.0, 1.0))
            .arrange(Rect::from_size(100.0, 50.0), &[FlexWeight::default()]);
        assert_rect(arrangement.rects[0], Rect::new(0.0, 0.0, 50.0, 50.0));

        // Cell would be 40 x 100; with 2:1 the height shrinks to 20.
        let arrangement = FlexibleGrid::columns(1)
            .fixed_aspect(Size::new(2.0, 1.0))
            .arrange(Rect::from_size(40.0, 100.0), &[FlexWeight::default()]);
        assert_rect(arrangement.rects[0], Rect::new(0.0, 0.0, 40.0, 20.0));
    }

    #[test]
    fn fixed_aspect_accumulates_shrunk_sizes() {
        let arrangement = FlexibleGrid::columns(2)
            .fixed_aspect(Size::new(1.0, 1.0))
            .arrange(Rect::from_size(200.0, 50.0), &[FlexWeight::default(); 2]);
        assert_rect(arrangement.rects[0], Rect::new(0.0, 0.0, 50.0, 50.0));
        assert_rect(arrangement.rects[1], Rect::new(50.0, 0.0, 50.0, 50.0));
    }

    fn fit_strategy() -> impl Strategy<Value = FitType> {
        prop_oneof![
            Just(FitType::None),
            (1usize..6).prop_map(FitType::MaxColumns),
            (1usize..6).prop_map(FitType::MaxRows),
        ]
    }

    proptest! {
        #[test]
        fn free_aspect_cells_tile_the_container(
            fit in fit_strategy(),
            weights in prop::collection::vec((0.1f32..50.0, 0.1f32..50.0), 1..24),
            width in 10.0f32..800.0,
            height in 10.0f32..800.0,
        ) {
            let weights: Vec<FlexWeight> = weights
                .into_iter()
                .map(|(w, h)| FlexWeight::new(w, h))
                .collect();
            let container = Rect::from_size(width, height);
            let arrangement = FlexibleGrid::new().fit(fit).arrange(container, &weights);
            prop_assert_eq!(arrangement.rects.len(), weights.len());

            let mut covered = 0.0f32;
            for (i, rect) in arrangement.rects.iter().enumerate() {
                prop_assert!(rect.x >= -EPS && rect.y >= -EPS);
                prop_assert!(rect.right() <= width + 0.05 && rect.bottom() <= height + 0.05);
                covered += rect.area();
                for other in &arrangement.rects[i + 1..] {
                    let overlap = rect.intersection_opt(other).map_or(0.0, |r| r.area());
                    prop_assert!(overlap < 0.05, "{:?} overlaps {:?}", rect, other);
                }
            }

            // Every line holds at least one item and spans the container.
            let expected = width * height;
            prop_assert!((covered - expected).abs() <= expected * 1e-3);
        }

        #[test]
        fn arrangement_is_deterministic(
            fit in fit_strategy(),
            count in 0usize..20,
        ) {
            let grid = FlexibleGrid::new().fit(fit).spacing(2.0, 3.0).padding(Sides::all(1.0));
            let weights = vec![FlexWeight::new(2.0, 3.0); count];
            let container = Rect::new(5.0, 7.0, 300.0, 200.0);
            prop_assert_eq!(grid.arrange(container, &weights), grid.arrange(container, &weights));
        }
    }
}
