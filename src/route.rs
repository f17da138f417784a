//! Route highlighting: slicing externally-computed route steps out of the
//! line geometry and classifying the stations they touch.
//!
//! The route itself comes from an external routing service; this module only
//! validates it against the grid model and turns each step into a synthetic
//! single-use line that goes through the ordinary path generator, so
//! highlighted segments curve exactly like the base map underneath them.

use crate::model::{GridModel, Node};
use crate::topology::normalize_name;
use serde::Deserialize;
use std::collections::BTreeSet;
use thiserror::Error;

/// Sentinel name for synthetic highlight lines.
pub const HIGHLIGHT_LINE_NAME: &str = "__highlight";

/// Wire format of the external routing backend.
#[derive(Debug, Clone, Deserialize)]
pub struct RouteResponse {
    pub routes: Vec<RoutePlan>,
}

impl RouteResponse {
    pub fn from_json(input: &str) -> serde_json::Result<Self> {
        serde_json::from_str(input)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoutePlan {
    pub steps: Vec<RouteStep>,
}

/// One leg of a route: ride `line` from `from` to `to`. Station names are
/// raw, line-specific; the line name is matched case-insensitively.
#[derive(Debug, Clone, Deserialize)]
pub struct RouteStep {
    pub line: String,
    pub from: String,
    pub to: String,
}

/// Recoverable: a bad route leaves the rendered base map untouched.
#[derive(Debug, Error, PartialEq)]
pub enum RouteError {
    #[error("route has no steps")]
    EmptyRoute,
    #[error("no line named {line:?} on this map")]
    UnknownLine { line: String },
    #[error("no station {station:?} on line {line}")]
    StationNotOnLine { station: String, line: String },
    #[error("step on line {line} starts and ends at station {station:?}")]
    DegenerateStep { station: String, line: String },
}

/// A traversed sub-run of one line.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteSegment {
    /// The parent line's display name (for interchange listings).
    pub source_line: String,
    pub color: String,
    pub shift: (f32, f32),
    /// Traversed nodes in travel order.
    pub nodes: Vec<Node>,
    /// True when the step rides the line against its stored node order.
    pub reversed: bool,
}

impl RouteSegment {
    /// Nodes in the parent line's stored order, the orientation the path
    /// generator understands: quarter turns read their compass direction off
    /// the forward-side node and knees off the preceding section, so segment
    /// geometry is always laid out forwards and drawn as the same stroke in
    /// either direction. `nodes` keeps travel order for station listings.
    pub fn path_nodes(&self) -> Vec<Node> {
        let mut nodes = self.nodes.clone();
        if self.reversed {
            nodes.reverse();
        }
        nodes
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StationRole {
    Start,
    End,
    Via,
}

/// Role of every station touched by the whole route, keyed by normalized
/// name: one start, one end, everything else via.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationRoles {
    pub first: String,
    pub last: String,
    pub via: BTreeSet<String>,
}

impl StationRoles {
    fn from_steps(steps: &[RouteStep]) -> Self {
        let first = normalize_name(&steps[0].from);
        let last = normalize_name(&steps[steps.len() - 1].to);
        let mut via = BTreeSet::new();
        if steps.len() > 1 {
            // Hand-off stations next to the endpoints, plus both ends of
            // every interior step.
            via.insert(normalize_name(&steps[0].to));
            via.insert(normalize_name(&steps[steps.len() - 1].from));
            for step in &steps[1..steps.len() - 1] {
                via.insert(normalize_name(&step.from));
                via.insert(normalize_name(&step.to));
            }
        }
        Self { first, last, via }
    }

    /// Role for a raw station name, or `None` when the route does not touch
    /// it. Start and end take precedence over via membership.
    pub fn role_of(&self, raw_name: &str) -> Option<StationRole> {
        let normalized = normalize_name(raw_name);
        if normalized == self.first {
            Some(StationRole::Start)
        } else if normalized == self.last {
            Some(StationRole::End)
        } else if self.via.contains(&normalized) {
            Some(StationRole::Via)
        } else {
            None
        }
    }
}

/// A validated, renderable route highlight.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteHighlight {
    pub segments: Vec<RouteSegment>,
    pub roles: StationRoles,
}

impl RouteHighlight {
    /// Raw names of every station the highlight touches, in travel order.
    pub fn touched_stations(&self) -> Vec<&str> {
        let mut names = Vec::new();
        for segment in &self.segments {
            for node in &segment.nodes {
                if let Some(name) = &node.station {
                    if !names.contains(&name.as_str()) {
                        names.push(name.as_str());
                    }
                }
            }
        }
        names
    }
}

fn station_matches(node: &Node, target: &str) -> bool {
    node.station
        .as_deref()
        .is_some_and(|name| normalize_name(name) == normalize_name(target))
}

/// Validate the steps against the model and slice out the traversed node
/// runs. A step riding a line against its stored node order yields the
/// reversed slice, so the segment is always in travel order.
pub fn extract_route(model: &GridModel, steps: &[RouteStep]) -> Result<RouteHighlight, RouteError> {
    if steps.is_empty() {
        return Err(RouteError::EmptyRoute);
    }

    let mut segments = Vec::with_capacity(steps.len());
    for step in steps {
        let line = model
            .line_ignore_case(&step.line)
            .ok_or_else(|| RouteError::UnknownLine {
                line: step.line.clone(),
            })?;
        // The backend promises from/to are on the line; verify anyway.
        let from_index = line
            .nodes
            .iter()
            .position(|n| station_matches(n, &step.from))
            .ok_or_else(|| RouteError::StationNotOnLine {
                station: step.from.clone(),
                line: line.name.clone(),
            })?;
        let to_index = line
            .nodes
            .iter()
            .position(|n| station_matches(n, &step.to))
            .ok_or_else(|| RouteError::StationNotOnLine {
                station: step.to.clone(),
                line: line.name.clone(),
            })?;

        if from_index == to_index {
            return Err(RouteError::DegenerateStep {
                station: step.from.clone(),
                line: line.name.clone(),
            });
        }

        let reversed = from_index > to_index;
        let nodes: Vec<Node> = if reversed {
            let mut nodes = line.nodes[to_index..=from_index].to_vec();
            nodes.reverse();
            nodes
        } else {
            line.nodes[from_index..=to_index].to_vec()
        };

        segments.push(RouteSegment {
            source_line: line.name.clone(),
            color: line.color.clone(),
            shift: line.shift,
            nodes,
            reversed,
        });
    }

    Ok(RouteHighlight {
        segments,
        roles: StationRoles::from_steps(steps),
    })
}
