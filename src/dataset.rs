//! Serde types for the external dataset document.
//!
//! The document is the raw, untrusted input: `lines` carries ordered node
//! sequences, `stations` is a registry keyed by raw (possibly digit-suffixed)
//! station name. Validation and cross-referencing happen in [`crate::model`].

use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Deserialize)]
pub struct MapDocument {
    pub lines: Vec<LineSpec>,
    pub stations: BTreeMap<String, StationSpec>,
    /// Optional decorative boundary polyline (the original Berlin dataset
    /// calls this `wall`).
    #[serde(default, alias = "wall")]
    pub boundary: Option<BoundarySpec>,
}

impl MapDocument {
    pub fn from_json(input: &str) -> serde_json::Result<Self> {
        serde_json::from_str(input)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineSpec {
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    pub color: String,
    #[serde(default)]
    pub dashed: bool,
    #[serde(default)]
    pub shift_coords: [f32; 2],
    pub nodes: Vec<NodeSpec>,
}

/// One point on a line's path. A node with a `name` references a station in
/// the registry; a node without one is a bend-only waypoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSpec {
    pub coords: [f32; 2],
    #[serde(default)]
    pub name: Option<String>,
    /// Compass direction of travel leaving this node. Consulted when the
    /// node sits on a unit-diagonal turn, where the curve shape is ambiguous.
    #[serde(default)]
    pub dir: Option<String>,
    #[serde(default)]
    pub label_pos: Option<String>,
    #[serde(default)]
    pub shift_coords: Option<[f32; 2]>,
    #[serde(default)]
    pub label_shift_coords: Option<[f32; 2]>,
    #[serde(default)]
    pub label_angle: Option<f32>,
    #[serde(default)]
    pub label_bold: bool,
    #[serde(default)]
    pub inactive: bool,
    #[serde(default)]
    pub hide: bool,
    #[serde(default)]
    pub station_symbol: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StationSpec {
    pub label: String,
    #[serde(default)]
    pub position: Option<GeoPosition>,
    #[serde(default)]
    pub closed: bool,
}

/// Real-world coordinates carried through for external consumers (links,
/// tooltips). Not used by the grid geometry.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct GeoPosition {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundarySpec {
    #[serde(default)]
    pub shift_coords: [f32; 2],
    pub nodes: Vec<NodeSpec>,
    #[serde(default)]
    pub caption: Option<BoundaryCaption>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundaryCaption {
    pub text: String,
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub angle: f32,
}
