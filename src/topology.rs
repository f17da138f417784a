//! Network topology: station-name normalization, the line/station index, and
//! cyclic next/previous navigation.
//!
//! Station identity is subtle: the dataset keys stations by raw name, and a
//! raw name may carry a numeric disambiguator ("Hauptplatz 2") so one
//! physical station can own several renderings. [`normalize_name`] strips
//! the digits and is the only identity used for topology comparison;
//! [`class_from_name`] additionally strips parentheses and spaces and is a
//! grouping token for visual elements only, never an identity.

use crate::model::GridModel;
use once_cell::sync::Lazy;
use regex::Regex;

static DIGITS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]").unwrap());
static CLASS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[()0-9 ]").unwrap());

/// Canonical station identity: raw name with digits stripped and surrounding
/// whitespace trimmed.
pub fn normalize_name(name: &str) -> String {
    DIGITS_RE.replace_all(name, "").trim().to_string()
}

/// CSS-class-safe token grouping every visual element of one station. Not an
/// identity; use [`normalize_name`] for comparisons.
pub fn class_from_name(name: &str) -> String {
    CLASS_RE.replace_all(name, "").to_string()
}

/// One line as the topology sees it: name plus normalized stations in path
/// order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopologyLine {
    pub name: String,
    pub stations: Vec<String>,
}

/// A station reference handed back by the navigator, carrying the line that
/// becomes active when moving to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeighborRef {
    pub station: String,
    pub line: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Neighbors {
    pub previous: NeighborRef,
    pub next: NeighborRef,
}

/// Canonical ordering of lines and their stations. Lines are sorted
/// lexicographically by name and dashed (decorative) lines are excluded, so
/// index 0 is the default line for any station.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    lines: Vec<TopologyLine>,
}

impl Topology {
    pub fn from_model(model: &GridModel) -> Self {
        Self::from_lines(
            model
                .lines
                .iter()
                .filter(|line| !line.dashed && !line.stations.is_empty())
                .map(|line| TopologyLine {
                    name: line.name.clone(),
                    stations: line.stations.iter().map(|s| normalize_name(s)).collect(),
                })
                .collect(),
        )
    }

    pub fn from_lines(mut lines: Vec<TopologyLine>) -> Self {
        lines.sort_by(|a, b| a.name.cmp(&b.name));
        Self { lines }
    }

    pub fn lines(&self) -> &[TopologyLine] {
        &self.lines
    }

    /// Names of every line serving the station, sorted lexicographically.
    /// The first entry is the station's canonical default line.
    pub fn station_lines(&self, name: &str) -> Vec<&str> {
        let normalized = normalize_name(name);
        self.lines
            .iter()
            .filter(|line| line.stations.contains(&normalized))
            .map(|line| line.name.as_str())
            .collect()
    }

    /// Cyclic previous/next for a station on its active line. Interior
    /// stations stay on the line; the first and last wrap to the adjacent
    /// line in the sorted ring, so repeated `next` steps traverse every
    /// (line, station) pair exactly once before coming around.
    ///
    /// # Panics
    ///
    /// Panics if `active_line` is not part of the topology or does not serve
    /// `station` — callers must only navigate from pairs the topology handed
    /// out, so either is a caller bug, not a data condition.
    pub fn neighbors(&self, station: &str, active_line: &str) -> Neighbors {
        let normalized = normalize_name(station);
        let line_index = self
            .lines
            .iter()
            .position(|line| line.name == active_line)
            .unwrap_or_else(|| panic!("line {active_line:?} is not part of the network"));
        let line = &self.lines[line_index];
        let index = line
            .stations
            .iter()
            .position(|s| *s == normalized)
            .unwrap_or_else(|| {
                panic!("station {station:?} is not served by line {active_line:?}")
            });

        let ring = self.lines.len();
        let prev_line = &self.lines[(line_index + ring - 1) % ring];
        let next_line = &self.lines[(line_index + 1) % ring];

        let previous = if index > 0 {
            NeighborRef {
                station: line.stations[index - 1].clone(),
                line: line.name.clone(),
            }
        } else {
            NeighborRef {
                station: prev_line
                    .stations
                    .last()
                    .expect("topology lines are never empty")
                    .clone(),
                line: prev_line.name.clone(),
            }
        };
        let next = if index + 1 < line.stations.len() {
            NeighborRef {
                station: line.stations[index + 1].clone(),
                line: line.name.clone(),
            }
        } else {
            NeighborRef {
                station: next_line
                    .stations
                    .first()
                    .expect("topology lines are never empty")
                    .clone(),
                line: next_line.name.clone(),
            }
        };

        Neighbors { previous, next }
    }
}
