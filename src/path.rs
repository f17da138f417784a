//! Path geometry generator.
//!
//! Turns one line's ordered grid nodes into a single continuous vector path
//! in pixel space. Segment shape is chosen from the rounded integer grid
//! delta between consecutive nodes: orthogonal runs and long 45° diagonals
//! are straight, a unit diagonal is a quarter-circle quadratic turn, and a
//! (1,2)/(2,1) "knee" is a degenerate cubic S-curve joining two parallel
//! orthogonal runs. Any other delta is a malformed dataset.

use crate::model::{Compass, Node};
use crate::scale::MapScale;
use thiserror::Error;

pub type Point = (f32, f32);

const SQRT2: f32 = std::f32::consts::SQRT_2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    MoveTo(Point),
    LineTo(Point),
    QuadTo { ctrl: Point, to: Point },
    CubicTo { ctrl1: Point, ctrl2: Point, to: Point },
}

impl PathCommand {
    pub fn end_point(&self) -> Point {
        match *self {
            PathCommand::MoveTo(p) | PathCommand::LineTo(p) => p,
            PathCommand::QuadTo { to, .. } | PathCommand::CubicTo { to, .. } => to,
        }
    }
}

/// Serialize a command list as an SVG path `d` attribute.
pub fn path_to_svg(commands: &[PathCommand]) -> String {
    let mut d = String::new();
    for command in commands {
        match *command {
            PathCommand::MoveTo((x, y)) => {
                d.push_str(&format!("M{x},{y}"));
            }
            PathCommand::LineTo((x, y)) => {
                d.push_str(&format!("L{x},{y}"));
            }
            PathCommand::QuadTo {
                ctrl: (cx, cy),
                to: (x, y),
            } => {
                d.push_str(&format!("Q{cx},{cy},{x},{y}"));
            }
            PathCommand::CubicTo {
                ctrl1: (c1x, c1y),
                ctrl2: (c2x, c2y),
                to: (x, y),
            } => {
                d.push_str(&format!("C{c1x},{c1y},{c2x},{c2y},{x},{y}"));
            }
        }
    }
    d
}

/// What the previous segment was, threaded through the fold so a knee can
/// start tangent to whatever preceded it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Orthogonal,
    Diagonal,
}

/// Valid grid adjacencies between consecutive nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaClass {
    Orthogonal,
    LongDiagonal,
    UnitDiagonal,
    Knee,
}

/// Classify the rounded grid delta between two consecutive nodes, or `None`
/// for a delta this grid model has no rendering for.
pub fn classify_delta(dx: i32, dy: i32) -> Option<DeltaClass> {
    if dx == 0 && dy == 0 {
        return None;
    }
    if dx == 0 || dy == 0 {
        return Some(DeltaClass::Orthogonal);
    }
    let (ax, ay) = (dx.abs(), dy.abs());
    if ax == ay && ax > 1 {
        return Some(DeltaClass::LongDiagonal);
    }
    if ax == 1 && ay == 1 {
        return Some(DeltaClass::UnitDiagonal);
    }
    if (ax == 1 && ay == 2) || (ax == 2 && ay == 1) {
        return Some(DeltaClass::Knee);
    }
    None
}

#[derive(Debug, Error, PartialEq)]
pub enum GeometryError {
    #[error("line {line} needs at least two nodes to form a path")]
    TooFewNodes { line: String },
    #[error("line {line}: nodes {index} -> {} span an invalid grid delta ({dx},{dy})", index + 1)]
    InvalidDelta {
        line: String,
        index: usize,
        dx: i32,
        dy: i32,
    },
    #[error("line {line}: node {index} ends a unit diagonal but declares no direction")]
    MissingDirection { line: String, index: usize },
    #[error("line {line}: node {index} declares direction {dir:?}, expected one of N/S/E/W")]
    InvalidTurnDirection {
        line: String,
        index: usize,
        dir: Compass,
    },
}

/// Load-time geometry check: every consecutive pair must classify, and every
/// unit-diagonal turn node must declare a usable compass direction. Datasets
/// that fail here never reach rendering.
pub fn validate_nodes(line_name: &str, nodes: &[Node]) -> Result<(), GeometryError> {
    if nodes.len() < 2 {
        return Err(GeometryError::TooFewNodes {
            line: line_name.to_string(),
        });
    }
    for index in 1..nodes.len() {
        let (dx, dy) = grid_delta(&nodes[index - 1], &nodes[index]);
        let class = classify_delta(dx, dy).ok_or_else(|| GeometryError::InvalidDelta {
            line: line_name.to_string(),
            index: index - 1,
            dx,
            dy,
        })?;
        if class == DeltaClass::UnitDiagonal {
            match nodes[index].dir {
                None => {
                    return Err(GeometryError::MissingDirection {
                        line: line_name.to_string(),
                        index,
                    });
                }
                Some(Compass::N | Compass::S | Compass::E | Compass::W) => {}
                Some(dir) => {
                    return Err(GeometryError::InvalidTurnDirection {
                        line: line_name.to_string(),
                        index,
                        dir,
                    });
                }
            }
        }
    }
    Ok(())
}

fn grid_delta(from: &Node, to: &Node) -> (i32, i32) {
    (
        (from.coords.0 - to.coords.0).round() as i32,
        (from.coords.1 - to.coords.1).round() as i32,
    )
}

/// Half-line-width nudge keeping path endpoints clear of the station marker.
/// `factor` is +1 at the path start, -1 at the end; the result is in grid
/// units, applied before scaling.
fn endpoint_correction(
    dx: i32,
    dy: i32,
    factor: f32,
    line_width: f32,
    tick_ratio: f32,
    unit_length: f32,
) -> (f32, f32) {
    let base = line_width / (2.0 * tick_ratio * unit_length);
    if dx == 0 || dy == 0 {
        if dx > 0 {
            (factor * base, 0.0)
        } else if dx < 0 {
            (-factor * base, 0.0)
        } else if dy > 0 {
            (0.0, factor * base)
        } else {
            (0.0, -factor * base)
        }
    } else {
        // Diagonal endpoints split the nudge evenly between both axes.
        let diag = base / SQRT2;
        (
            factor * diag * if dx > 0 { 1.0 } else { -1.0 },
            factor * diag * if dy > 0 { 1.0 } else { -1.0 },
        )
    }
}

/// Quarter-circle control point for a unit-diagonal turn. The turn node's
/// declared compass direction disambiguates the two possible arcs: an
/// east/west exit keeps the control point level with the start, a
/// north/south exit keeps it plumb with the start.
fn quarter_turn_ctrl(
    dir: Compass,
    start: Point,
    end: Point,
    line: &str,
    index: usize,
) -> Result<Point, GeometryError> {
    match dir {
        Compass::E | Compass::W => Ok((end.0, start.1)),
        Compass::N | Compass::S => Ok((start.0, end.1)),
        other => Err(GeometryError::InvalidTurnDirection {
            line: line.to_string(),
            index,
            dir: other,
        }),
    }
}

/// Knee control point: the S-curve starts tangent to the previous section.
/// After an orthogonal run the control hugs the start point's long axis;
/// after a diagonal it hugs the end point's.
fn knee_ctrl(dx: i32, last_section: SectionKind, start: Point, end: Point) -> Point {
    let mid_x = start.0 + (end.0 - start.0) / 2.0;
    let mid_y = start.1 + (end.1 - start.1) / 2.0;
    if dx.abs() == 1 {
        match last_section {
            SectionKind::Orthogonal => (start.0, mid_y),
            SectionKind::Diagonal => (end.0, mid_y),
        }
    } else {
        match last_section {
            SectionKind::Orthogonal => (mid_x, start.1),
            SectionKind::Diagonal => (mid_x, end.1),
        }
    }
}

/// Generate the pixel-space path for one line.
///
/// `shift` is the line's sub-grid displacement separating parallel line
/// bundles; it is expressed in line widths, so widening the lines widens the
/// visual separation proportionally. The traversal state lives entirely in
/// this call, so independent lines can be generated concurrently.
pub fn line_path(
    line_name: &str,
    nodes: &[Node],
    shift: (f32, f32),
    scale: &MapScale,
    tick_ratio: f32,
) -> Result<Vec<PathCommand>, GeometryError> {
    if nodes.len() < 2 {
        return Err(GeometryError::TooFewNodes {
            line: line_name.to_string(),
        });
    }

    let unit_length = scale.unit_length;
    let line_width = scale.line_width;
    let shift = (
        shift.0 * line_width / unit_length,
        shift.1 * line_width / unit_length,
    );
    let project = |coords: (f32, f32), correction: (f32, f32)| -> Point {
        (
            scale.x.scale(coords.0 + shift.0 + correction.0),
            scale.y.scale(coords.1 + shift.1 + correction.1),
        )
    };

    let mut commands = Vec::with_capacity(nodes.len());

    let (dx0, dy0) = grid_delta(&nodes[0], &nodes[1]);
    let start_correction =
        endpoint_correction(dx0, dy0, 1.0, line_width, tick_ratio, unit_length);
    commands.push(PathCommand::MoveTo(project(
        nodes[0].coords,
        start_correction,
    )));

    let mut last_section = SectionKind::Diagonal;

    for index in 1..nodes.len() {
        let curr = &nodes[index - 1];
        let next = &nodes[index];
        let (dx, dy) = grid_delta(curr, next);

        let end_correction = if index == nodes.len() - 1 {
            endpoint_correction(dx, dy, -1.0, line_width, tick_ratio, unit_length)
        } else {
            (0.0, 0.0)
        };

        let start = project(curr.coords, (0.0, 0.0));
        let end = project(next.coords, end_correction);

        let class = classify_delta(dx, dy).ok_or_else(|| GeometryError::InvalidDelta {
            line: line_name.to_string(),
            index: index - 1,
            dx,
            dy,
        })?;

        match class {
            DeltaClass::Orthogonal => {
                last_section = SectionKind::Orthogonal;
                commands.push(PathCommand::LineTo(end));
            }
            DeltaClass::LongDiagonal => {
                last_section = SectionKind::Diagonal;
                commands.push(PathCommand::LineTo(end));
            }
            DeltaClass::UnitDiagonal => {
                let dir = next.dir.ok_or_else(|| GeometryError::MissingDirection {
                    line: line_name.to_string(),
                    index,
                })?;
                let ctrl = quarter_turn_ctrl(dir, start, end, line_name, index)?;
                commands.push(PathCommand::QuadTo { ctrl, to: end });
            }
            DeltaClass::Knee => {
                let ctrl = knee_ctrl(dx, last_section, start, end);
                commands.push(PathCommand::CubicTo {
                    ctrl1: ctrl,
                    ctrl2: ctrl,
                    to: end,
                });
            }
        }
    }

    Ok(commands)
}
