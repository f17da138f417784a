//! Grid-to-pixel coordinate scaling.
//!
//! The dataset lives on an abstract grid where adjacent stations are one unit
//! apart. [`MapScale::fit`] maps that grid into a margin-reduced viewport
//! while preserving the dataset's aspect ratio, flipping the y axis so grid
//! "up" renders up.

use crate::model::Line;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margin {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Default for Margin {
    fn default() -> Self {
        Self {
            top: 80.0,
            right: 80.0,
            bottom: 20.0,
            left: 80.0,
        }
    }
}

/// Two-point linear scale, the only kind the grid needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    domain: (f32, f32),
    range: (f32, f32),
}

impl LinearScale {
    pub fn new(domain: (f32, f32), range: (f32, f32)) -> Self {
        Self { domain, range }
    }

    pub fn scale(&self, value: f32) -> f32 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        if d1 == d0 {
            return r0;
        }
        r0 + (value - d0) * (r1 - r0) / (d1 - d0)
    }
}

/// Dataset bounding box in grid units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f32,
    pub max_x: f32,
    pub min_y: f32,
    pub max_y: f32,
}

impl Bounds {
    /// Bounding box over every node of every line, expanded by one grid unit
    /// on each side.
    pub fn of_lines(lines: &[Line]) -> Self {
        let mut min_x = f32::INFINITY;
        let mut max_x = f32::NEG_INFINITY;
        let mut min_y = f32::INFINITY;
        let mut max_y = f32::NEG_INFINITY;
        for line in lines {
            for node in &line.nodes {
                min_x = min_x.min(node.coords.0);
                max_x = max_x.max(node.coords.0);
                min_y = min_y.min(node.coords.1);
                max_y = max_y.max(node.coords.1);
            }
        }
        if min_x > max_x {
            // Empty dataset: degenerate unit box around the origin.
            return Self {
                min_x: -1.0,
                max_x: 1.0,
                min_y: -1.0,
                max_y: 1.0,
            };
        }
        Self {
            min_x: min_x - 1.0,
            max_x: max_x + 1.0,
            min_y: min_y - 1.0,
            max_y: max_y + 1.0,
        }
    }
}

/// The pair of axis scales plus the derived per-unit pixel length and the
/// line stroke width. Pure function of (bounds, viewport, margins); rebuild
/// it whenever the viewport changes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapScale {
    pub x: LinearScale,
    pub y: LinearScale,
    pub unit_length: f32,
    pub line_width: f32,
}

impl MapScale {
    pub fn fit(
        bounds: &Bounds,
        width: f32,
        height: f32,
        margin: &Margin,
        line_width_multiplier: f32,
    ) -> Self {
        let available_width = width - margin.left - margin.right;
        let available_height = height - margin.top - margin.bottom;

        let desired_aspect = (bounds.max_x - bounds.min_x) / (bounds.max_y - bounds.min_y);
        let actual_aspect = available_width / available_height;
        let ratio_ratio = actual_aspect / desired_aspect;

        // The constraining axis gets the full available range; the other is
        // shrunk so one grid unit spans the same pixel distance on both axes.
        let (x_range, y_range) = if desired_aspect > actual_aspect {
            (available_width, available_height * ratio_ratio)
        } else {
            (available_width / ratio_ratio, available_height)
        };

        let x = LinearScale::new(
            (bounds.min_x, bounds.max_x),
            (margin.left, margin.left + x_range),
        );
        // The y range is inverted: larger grid y renders higher on screen.
        let y = LinearScale::new(
            (bounds.min_y, bounds.max_y),
            (margin.top + y_range, margin.top),
        );

        // A degenerate single-row or single-column dataset collapses one
        // axis; take the unit step from whichever axis still has extent.
        let x_step = (x.scale(1.0) - x.scale(0.0)).abs();
        let unit_length = if x_step != 0.0 {
            x_step
        } else {
            (y.scale(1.0) - y.scale(0.0)).abs()
        };

        Self {
            x,
            y,
            unit_length,
            line_width: line_width_multiplier * unit_length,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Line, Node};

    fn line_with_coords(coords: &[(f32, f32)]) -> Line {
        Line {
            name: "T1".to_string(),
            label: None,
            color: "#000000".to_string(),
            dashed: false,
            shift: (0.0, 0.0),
            nodes: coords
                .iter()
                .map(|&c| Node {
                    coords: c,
                    station: None,
                    dir: None,
                })
                .collect(),
            stations: Vec::new(),
        }
    }

    #[test]
    fn bounds_expand_by_one_unit() {
        let lines = vec![line_with_coords(&[(0.0, 0.0), (4.0, 2.0)])];
        let bounds = Bounds::of_lines(&lines);
        assert_eq!(bounds.min_x, -1.0);
        assert_eq!(bounds.max_x, 5.0);
        assert_eq!(bounds.min_y, -1.0);
        assert_eq!(bounds.max_y, 3.0);
    }

    #[test]
    fn fit_preserves_aspect_ratio() {
        let lines = vec![line_with_coords(&[(0.0, 0.0), (9.0, 4.0)])];
        let bounds = Bounds::of_lines(&lines);
        let scale = MapScale::fit(&bounds, 760.0, 640.0, &Margin::default(), 0.7);

        // One grid unit must span the same pixel distance on both axes.
        let x_unit = (scale.x.scale(1.0) - scale.x.scale(0.0)).abs();
        let y_unit = (scale.y.scale(1.0) - scale.y.scale(0.0)).abs();
        assert!((x_unit - y_unit).abs() < 1e-3);
        assert!((scale.unit_length - x_unit).abs() < 1e-3);
        assert_eq!(scale.line_width, 0.7 * scale.unit_length);
    }

    #[test]
    fn y_axis_is_inverted() {
        let lines = vec![line_with_coords(&[(0.0, 0.0), (4.0, 4.0)])];
        let bounds = Bounds::of_lines(&lines);
        let scale = MapScale::fit(&bounds, 760.0, 640.0, &Margin::default(), 0.7);
        assert!(scale.y.scale(4.0) < scale.y.scale(0.0));
    }

    #[test]
    fn fit_is_pure() {
        let lines = vec![line_with_coords(&[(0.0, 0.0), (7.0, 3.0)])];
        let bounds = Bounds::of_lines(&lines);
        let a = MapScale::fit(&bounds, 1200.0, 900.0, &Margin::default(), 0.7);
        let b = MapScale::fit(&bounds, 1200.0, 900.0, &Margin::default(), 0.7);
        assert_eq!(a, b);
    }

    #[test]
    fn single_row_dataset_takes_unit_length_from_y() {
        // All nodes on one row: the x domain still has extent (bounds are
        // expanded), but a width-zero viewport collapses the x range.
        let lines = vec![line_with_coords(&[(0.0, 0.0), (0.0, 5.0)])];
        let bounds = Bounds::of_lines(&lines);
        let margin = Margin {
            top: 0.0,
            right: 0.0,
            bottom: 0.0,
            left: 0.0,
        };
        let scale = MapScale::fit(&bounds, 640.0, 640.0, &margin, 0.7);
        assert!(scale.unit_length > 0.0);
    }
}
