//! Validated, immutable grid model.
//!
//! [`GridModel::build`] turns a raw [`MapDocument`](crate::dataset::MapDocument)
//! into the model the rest of the crate works with, in two phases: first the
//! lines and their nodes are parsed, then station values are merged from
//! every node referencing them. Conflicting observations (a station placed
//! at two different grid points) and geometry-invalid adjacencies abort the
//! build; there is no partially-valid model.

use crate::dataset::{GeoPosition, LineSpec, MapDocument, NodeSpec};
use crate::path::{self, GeometryError};
use std::collections::BTreeMap;
use thiserror::Error;

/// The eight compass points used for turn directions and label anchors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compass {
    N,
    Ne,
    E,
    Se,
    S,
    Sw,
    W,
    Nw,
}

impl Compass {
    pub fn from_token(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "n" => Some(Self::N),
            "ne" => Some(Self::Ne),
            "e" => Some(Self::E),
            "se" => Some(Self::Se),
            "s" => Some(Self::S),
            "sw" => Some(Self::Sw),
            "w" => Some(Self::W),
            "nw" => Some(Self::Nw),
            _ => None,
        }
    }
}

/// How a station renders: `Single` is a circle, the long forms are rounded
/// rectangles whose height multipliers live in the map config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StationSymbol {
    #[default]
    Single,
    Double,
    Long,
}

impl StationSymbol {
    fn from_token(token: Option<&str>) -> Self {
        match token {
            None | Some("single") => Self::Single,
            Some("double") => Self::Double,
            Some(_) => Self::Long,
        }
    }

    pub fn is_single(self) -> bool {
        self == Self::Single
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub coords: (f32, f32),
    /// Raw station name, absent for bend-only waypoints.
    pub station: Option<String>,
    pub dir: Option<Compass>,
}

impl Node {
    fn from_spec(spec: &NodeSpec, line: &str, index: usize) -> Result<Self, ModelError> {
        let dir = match spec.dir.as_deref() {
            Some(token) => Some(Compass::from_token(token).ok_or_else(|| {
                ModelError::BadDirection {
                    line: line.to_string(),
                    index,
                    value: token.to_string(),
                }
            })?),
            None => None,
        };
        Ok(Self {
            coords: (spec.coords[0], spec.coords[1]),
            station: spec.name.clone(),
            dir,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelPlacement {
    pub pos: Compass,
    pub shift: (f32, f32),
    pub angle: f32,
    pub bold: bool,
}

/// Immutable station value merged from every node referencing it. The
/// visited/highlight flag deliberately lives in the render state, not here.
#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    /// Raw registry key, possibly digit-suffixed; a rendering identity only.
    /// Topology comparisons go through [`crate::topology::normalize_name`].
    pub name: String,
    pub label: String,
    pub coords: (f32, f32),
    pub marker_shift: (f32, f32),
    pub label_placement: Option<LabelPlacement>,
    pub symbol: StationSymbol,
    pub inactive: bool,
    pub closed: bool,
    pub hidden: bool,
    pub position: Option<GeoPosition>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub name: String,
    pub label: Option<String>,
    pub color: String,
    pub dashed: bool,
    pub shift: (f32, f32),
    pub nodes: Vec<Node>,
    /// Raw station names in path order; waypoints excluded.
    pub stations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Caption {
    pub text: String,
    pub coords: (f32, f32),
    pub angle: f32,
}

/// Decorative boundary polyline drawn with the same geometry generator.
#[derive(Debug, Clone, PartialEq)]
pub struct Boundary {
    pub shift: (f32, f32),
    pub nodes: Vec<Node>,
    pub caption: Option<Caption>,
}

#[derive(Debug, Clone)]
pub struct GridModel {
    pub lines: Vec<Line>,
    pub stations: BTreeMap<String, Station>,
    pub boundary: Option<Boundary>,
}

#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("line {line}: node {index} references unknown station {station:?}")]
    UnknownStation {
        line: String,
        index: usize,
        station: String,
    },
    #[error(
        "station {station:?} placed at ({x1},{y1}) by line {line}, but an earlier line placed it at ({x0},{y0})"
    )]
    CoordinateMismatch {
        station: String,
        line: String,
        x0: f32,
        y0: f32,
        x1: f32,
        y1: f32,
    },
    #[error("line {line}: node {index} has unrecognized direction {value:?}")]
    BadDirection {
        line: String,
        index: usize,
        value: String,
    },
    #[error("line {line}: node {index} has unrecognized label position {value:?}")]
    BadLabelPos {
        line: String,
        index: usize,
        value: String,
    },
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

impl GridModel {
    pub fn build(doc: &MapDocument) -> Result<Self, ModelError> {
        let mut lines = Vec::with_capacity(doc.lines.len());
        let mut stations: BTreeMap<String, Station> = BTreeMap::new();

        for spec in &doc.lines {
            let line = build_line(spec)?;
            path::validate_nodes(&line.name, &line.nodes)?;
            merge_stations(doc, spec, &line, &mut stations)?;
            lines.push(line);
        }

        let boundary = match &doc.boundary {
            Some(spec) => {
                let nodes = spec
                    .nodes
                    .iter()
                    .enumerate()
                    .map(|(index, node)| Node::from_spec(node, "boundary", index))
                    .collect::<Result<Vec<_>, _>>()?;
                path::validate_nodes("boundary", &nodes)?;
                Some(Boundary {
                    shift: (spec.shift_coords[0], spec.shift_coords[1]),
                    nodes,
                    caption: spec.caption.as_ref().map(|c| Caption {
                        text: c.text.clone(),
                        coords: (c.x, c.y),
                        angle: c.angle,
                    }),
                })
            }
            None => None,
        };

        Ok(Self {
            lines,
            stations,
            boundary,
        })
    }

    pub fn line(&self, name: &str) -> Option<&Line> {
        self.lines.iter().find(|line| line.name == name)
    }

    /// Case-insensitive line lookup, for matching external route responses.
    pub fn line_ignore_case(&self, name: &str) -> Option<&Line> {
        self.lines
            .iter()
            .find(|line| line.name.eq_ignore_ascii_case(name))
    }
}

fn build_line(spec: &LineSpec) -> Result<Line, ModelError> {
    let mut nodes = Vec::with_capacity(spec.nodes.len());
    let mut station_names = Vec::new();
    for (index, node_spec) in spec.nodes.iter().enumerate() {
        let node = Node::from_spec(node_spec, &spec.name, index)?;
        if let Some(name) = &node.station {
            station_names.push(name.clone());
        }
        nodes.push(node);
    }
    Ok(Line {
        name: spec.name.clone(),
        label: spec.label.clone(),
        color: spec.color.clone(),
        dashed: spec.dashed,
        shift: (spec.shift_coords[0], spec.shift_coords[1]),
        nodes,
        stations: station_names,
    })
}

/// Second build phase: fold every station-referencing node into the station
/// registry. First observation wins for placement metadata, which makes the
/// merge order-independent per station and idempotent across lines; the grid
/// position itself must agree everywhere.
fn merge_stations(
    doc: &MapDocument,
    spec: &LineSpec,
    line: &Line,
    stations: &mut BTreeMap<String, Station>,
) -> Result<(), ModelError> {
    for (index, node_spec) in spec.nodes.iter().enumerate() {
        let Some(name) = &node_spec.name else {
            continue;
        };
        let registered =
            doc.stations
                .get(name)
                .ok_or_else(|| ModelError::UnknownStation {
                    line: line.name.clone(),
                    index,
                    station: name.clone(),
                })?;

        let coords = (node_spec.coords[0], node_spec.coords[1]);
        let marker_shift = node_spec
            .shift_coords
            .map(|s| (s[0], s[1]))
            .unwrap_or(line.shift);
        let label_placement = match node_spec.label_pos.as_deref() {
            Some(token) => {
                let pos = Compass::from_token(token).ok_or_else(|| ModelError::BadLabelPos {
                    line: line.name.clone(),
                    index,
                    value: token.to_string(),
                })?;
                let shift = node_spec
                    .label_shift_coords
                    .or(node_spec.shift_coords)
                    .map(|s| (s[0], s[1]))
                    .unwrap_or(line.shift);
                Some(LabelPlacement {
                    pos,
                    shift,
                    angle: node_spec.label_angle.unwrap_or(0.0),
                    bold: node_spec.label_bold,
                })
            }
            None => None,
        };

        match stations.get_mut(name) {
            None => {
                stations.insert(
                    name.clone(),
                    Station {
                        name: name.clone(),
                        label: registered.label.clone(),
                        coords,
                        marker_shift,
                        label_placement,
                        symbol: StationSymbol::from_token(node_spec.station_symbol.as_deref()),
                        inactive: node_spec.inactive,
                        closed: registered.closed,
                        hidden: node_spec.hide,
                        position: registered.position,
                    },
                );
            }
            Some(existing) => {
                if existing.coords != coords {
                    return Err(ModelError::CoordinateMismatch {
                        station: name.clone(),
                        line: line.name.clone(),
                        x0: existing.coords.0,
                        y0: existing.coords.1,
                        x1: coords.0,
                        y1: coords.1,
                    });
                }
                if existing.label_placement.is_none() {
                    existing.label_placement = label_placement;
                }
                // A hidden first reference yields placement to a visible one.
                if existing.hidden && !node_spec.hide {
                    existing.hidden = false;
                    existing.marker_shift = marker_shift;
                }
                existing.inactive = existing.inactive || node_spec.inactive;
            }
        }
    }
    Ok(())
}
