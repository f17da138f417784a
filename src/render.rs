//! SVG assembly and the stateful map renderer.
//!
//! [`TubeMap`] owns the validated model plus the two pieces of mutable view
//! state (visited stations and an optional route highlight) and serializes
//! the whole scene back to front: background, boundary, base lines, route
//! segments, station markers, labels. Station markers repaint per role while
//! a route is shown, so they are emitted after the highlight paths.

use crate::config::Config;
#[cfg(feature = "png")]
use crate::config::MapConfig;
use crate::model::{Compass, GridModel, Station, StationSymbol};
use crate::path::{self, GeometryError};
use crate::route::{self, RouteError, RouteHighlight, RouteStep, StationRole, HIGHLIGHT_LINE_NAME};
use crate::scale::{Bounds, MapScale};
use crate::topology::class_from_name;
use anyhow::Result;
use std::collections::BTreeSet;
use std::path::Path;

const SQRT2: f32 = std::f32::consts::SQRT_2;

pub struct TubeMap {
    model: GridModel,
    config: Config,
    scale: MapScale,
    visited: BTreeSet<String>,
    route: Option<RouteHighlight>,
}

impl TubeMap {
    pub fn new(model: GridModel, config: Config) -> Self {
        let bounds = Bounds::of_lines(&model.lines);
        let scale = MapScale::fit(
            &bounds,
            config.map.width,
            config.map.height,
            &config.map.margin,
            config.map.line_width_multiplier,
        );
        Self {
            model,
            config,
            scale,
            visited: BTreeSet::new(),
            route: None,
        }
    }

    pub fn model(&self) -> &GridModel {
        &self.model
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn scale(&self) -> &MapScale {
        &self.scale
    }

    /// Refit the grid into a new viewport. Visited and route state survive a
    /// resize untouched.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.config.map.width = width;
        self.config.map.height = height;
        let bounds = Bounds::of_lines(&self.model.lines);
        self.scale = MapScale::fit(
            &bounds,
            width,
            height,
            &self.config.map.margin,
            self.config.map.line_width_multiplier,
        );
    }

    /// Flip one station's visited marker; returns the new state.
    pub fn toggle_visited(&mut self, station: &str) -> bool {
        if self.visited.remove(station) {
            false
        } else {
            self.visited.insert(station.to_string());
            true
        }
    }

    pub fn is_visited(&self, station: &str) -> bool {
        self.visited.contains(station)
    }

    /// Validate and install a route highlight. Any previous highlight is
    /// dropped first; a bad route leaves the map with no highlight at all
    /// rather than a partial one.
    pub fn draw_route(&mut self, steps: &[RouteStep]) -> Result<(), RouteError> {
        self.route = None;
        self.route = Some(route::extract_route(&self.model, steps)?);
        Ok(())
    }

    pub fn clear_route(&mut self) {
        self.route = None;
    }

    pub fn route(&self) -> Option<&RouteHighlight> {
        self.route.as_ref()
    }

    /// Serialize the current scene. Geometry was validated at model build
    /// time, so failures here indicate a bug rather than bad data; they are
    /// still propagated, not unwrapped.
    pub fn to_svg(&self) -> Result<String, GeometryError> {
        let map = &self.config.map;
        let theme = &self.config.theme;
        let width = map.width;
        let height = map.height;

        let mut svg = String::new();
        svg.push_str(&format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">",
        ));
        svg.push_str(&format!(
            "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
            theme.background
        ));

        if map.show_boundary {
            self.push_boundary(&mut svg)?;
        }

        self.push_lines(&mut svg)?;
        if let Some(route) = &self.route {
            self.push_route_segments(&mut svg, route)?;
        }
        self.push_stations(&mut svg);
        self.push_labels(&mut svg);

        svg.push_str("</svg>");
        Ok(svg)
    }

    fn push_boundary(&self, svg: &mut String) -> Result<(), GeometryError> {
        let Some(boundary) = &self.model.boundary else {
            return Ok(());
        };
        let map = &self.config.map;
        let theme = &self.config.theme;
        let line_width = self.scale.line_width;

        let commands = path::line_path(
            "boundary",
            &boundary.nodes,
            boundary.shift,
            &self.scale,
            map.line_width_tick_ratio,
        )?;
        svg.push_str(&format!(
            "<path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{:.2}\" opacity=\"{}\"/>",
            path::path_to_svg(&commands),
            theme.boundary_color,
            map.boundary_width_ratio * line_width,
            map.boundary_opacity
        ));

        if let Some(caption) = &boundary.caption {
            // Caption anchored north-east of its grid point, like a label.
            let offset = map.label_offset_ratio * line_width;
            let x = self.scale.x.scale(caption.coords.0) + offset / SQRT2;
            let y = self.scale.y.scale(caption.coords.1) - offset / SQRT2;
            svg.push_str(&format!(
                "<text x=\"{x:.2}\" y=\"{y:.2}\" text-anchor=\"start\" font-family=\"{}\" font-size=\"{:.2}\" fill=\"{}\" transform=\"rotate({},{x:.2},{y:.2})\">{}</text>",
                theme.font_family,
                map.label_font_ratio * line_width,
                theme.boundary_color,
                caption.angle,
                escape_xml(&caption.text)
            ));
        }
        Ok(())
    }

    fn push_lines(&self, svg: &mut String) -> Result<(), GeometryError> {
        let map = &self.config.map;
        let line_width = self.scale.line_width;
        let dimmed = self.route.is_some();

        for line in &self.model.lines {
            let commands = path::line_path(
                &line.name,
                &line.nodes,
                line.shift,
                &self.scale,
                map.line_width_tick_ratio,
            )?;
            let stroke = if dimmed {
                self.config.theme.dimmed_line_color.as_str()
            } else {
                line.color.as_str()
            };
            let dash = if line.dashed {
                // Gaps run one line width longer than the dashes.
                format!(
                    " stroke-dasharray=\"{:.2},{:.2}\"",
                    map.dash_ratio * line_width,
                    (map.dash_ratio + 1.0) * line_width
                )
            } else {
                String::new()
            };
            svg.push_str(&format!(
                "<path id=\"{}\" class=\"line\" d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{:.2}\" stroke-linecap=\"round\"{}/>",
                escape_xml(&line.name),
                path::path_to_svg(&commands),
                stroke,
                map.line_stroke_ratio * line_width,
                dash
            ));
        }
        Ok(())
    }

    fn push_route_segments(
        &self,
        svg: &mut String,
        route: &RouteHighlight,
    ) -> Result<(), GeometryError> {
        let map = &self.config.map;
        let line_width = self.scale.line_width;
        for segment in &route.segments {
            let nodes = segment.path_nodes();
            let commands = path::line_path(
                HIGHLIGHT_LINE_NAME,
                &nodes,
                segment.shift,
                &self.scale,
                map.line_width_tick_ratio,
            )?;
            svg.push_str(&format!(
                "<path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{:.2}\" stroke-linecap=\"round\"/>",
                path::path_to_svg(&commands),
                segment.color,
                map.line_stroke_ratio * line_width
            ));
        }
        Ok(())
    }

    /// Fill and stroke for one station marker: route roles trump the visited
    /// toggle, which trumps the base palette.
    fn station_paint(&self, station: &Station) -> (String, String) {
        let theme = &self.config.theme;
        if let Some(route) = &self.route {
            match route.roles.role_of(&station.name) {
                Some(StationRole::Start) => {
                    return (
                        theme.route_start_color.clone(),
                        theme.route_border_color.clone(),
                    );
                }
                Some(StationRole::End) => {
                    return (
                        theme.route_end_color.clone(),
                        theme.route_border_color.clone(),
                    );
                }
                Some(StationRole::Via) => {
                    return (
                        theme.route_via_color.clone(),
                        theme.route_border_color.clone(),
                    );
                }
                None => {}
            }
        }
        if self.visited.contains(&station.name) {
            (
                theme.visited_station_fill.clone(),
                theme.visited_station_stroke.clone(),
            )
        } else {
            (theme.station_fill.clone(), theme.station_stroke.clone())
        }
    }

    fn push_stations(&self, svg: &mut String) {
        let map = &self.config.map;
        let line_width = self.scale.line_width;
        // Marker shifts are expressed in line widths, same as path shifts.
        let shift_unit = line_width / self.scale.unit_length;
        let stroke_width = map.station_stroke_ratio * line_width;

        for station in self.model.stations.values() {
            if station.hidden {
                continue;
            }
            let (fill, stroke) = self.station_paint(station);
            match station.symbol {
                StationSymbol::Single => {
                    let cx = self
                        .scale
                        .x
                        .scale(station.coords.0 + station.marker_shift.0 * shift_unit);
                    let cy = self
                        .scale
                        .y
                        .scale(station.coords.1 + station.marker_shift.1 * shift_unit);
                    svg.push_str(&format!(
                        "<circle id=\"{}\" class=\"station {}\" cx=\"{cx:.2}\" cy=\"{cy:.2}\" r=\"{:.2}\" fill=\"{fill}\" stroke=\"{stroke}\" stroke-width=\"{stroke_width:.2}\"/>",
                        escape_xml(&station.name),
                        class_from_name(&station.name),
                        map.station_radius_ratio * line_width
                    ));
                }
                StationSymbol::Double | StationSymbol::Long => {
                    let multiplier = if station.symbol == StationSymbol::Double {
                        map.double_symbol_height
                    } else {
                        map.long_symbol_height
                    };
                    let x = self.scale.x.scale(
                        station.coords.0 + station.marker_shift.0 * shift_unit
                            - map.long_station_offset,
                    );
                    let y = self.scale.y.scale(
                        station.coords.1
                            + station.marker_shift.1 * shift_unit
                            + map.long_station_offset,
                    );
                    svg.push_str(&format!(
                        "<rect id=\"{}\" class=\"station {}\" x=\"{x:.2}\" y=\"{y:.2}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"{line_width:.2}\" ry=\"{line_width:.2}\" fill=\"{fill}\" stroke=\"{stroke}\" stroke-width=\"{stroke_width:.2}\"/>",
                        escape_xml(&station.name),
                        class_from_name(&station.name),
                        map.long_station_width_ratio * line_width,
                        multiplier * line_width
                    ));
                }
            }
        }
    }

    fn push_labels(&self, svg: &mut String) {
        let map = &self.config.map;
        let theme = &self.config.theme;
        let line_width = self.scale.line_width;
        let font_size = map.label_font_ratio * line_width;

        for station in self.model.stations.values() {
            if station.hidden {
                continue;
            }
            let Some(placement) = &station.label_placement else {
                continue;
            };
            let lines: Vec<&str> = station.label.split('\n').collect();
            let anchor = label_anchor(
                placement.pos,
                lines.len(),
                line_width,
                map.line_width_multiplier,
                map.label_offset_ratio,
            );

            // Label shifts are raw grid units, unlike marker shifts.
            let x = self.scale.x.scale(station.coords.0 + placement.shift.0) + anchor.dx;
            let y = self.scale.y.scale(station.coords.1 + placement.shift.1) - anchor.dy;
            let fill = if station.inactive {
                theme.inactive_label_color.as_str()
            } else {
                theme.label_color.as_str()
            };
            let weight = if placement.bold { 700 } else { 400 };
            let decoration = if station.closed {
                " text-decoration=\"line-through\""
            } else {
                ""
            };
            let rotate = if placement.angle != 0.0 {
                format!(" transform=\"rotate({},{x:.2},{y:.2})\"", placement.angle)
            } else {
                String::new()
            };

            svg.push_str(&format!(
                "<text class=\"label {}\" x=\"{x:.2}\" y=\"{y:.2}\" text-anchor=\"{}\" font-family=\"{}\" font-size=\"{font_size:.2}\" font-weight=\"{weight}\" fill=\"{fill}\"{decoration}{rotate}>",
                class_from_name(&station.name),
                anchor.text_anchor,
                theme.font_family
            ));
            for (index, text_line) in lines.iter().enumerate() {
                let dy = index as f32 * 1.1;
                svg.push_str(&format!(
                    "<tspan x=\"{x:.2}\" y=\"{y:.2}\" dy=\"{dy:.2}em\" dominant-baseline=\"{}\">{}</tspan>",
                    anchor.baseline,
                    escape_xml(text_line)
                ));
            }
            svg.push_str("</text>");
        }
    }
}

struct LabelAnchor {
    dx: f32,
    /// Upward pixel offset, subtracted from the scaled y.
    dy: f32,
    text_anchor: &'static str,
    baseline: &'static str,
}

/// Eight-way label placement. Multi-line labels grow away from the marker on
/// the north side, so the whole block clears it; the south offset is damped
/// by the line width multiplier to sit closer under wide-line maps.
fn label_anchor(
    pos: Compass,
    num_lines: usize,
    line_width: f32,
    multiplier: f32,
    offset_ratio: f32,
) -> LabelAnchor {
    let offset = offset_ratio * line_width;
    let n = num_lines as f32;
    let stacked = (line_width * (n - 1.0) + offset) / SQRT2;
    match pos {
        Compass::N => LabelAnchor {
            dx: 0.0,
            dy: 2.1 * line_width * (n - 0.5) + offset,
            text_anchor: "middle",
            baseline: "baseline",
        },
        Compass::Ne => LabelAnchor {
            dx: offset / SQRT2,
            dy: stacked,
            text_anchor: "start",
            baseline: "baseline",
        },
        Compass::E => LabelAnchor {
            dx: offset,
            dy: -2.0,
            text_anchor: "start",
            baseline: "baseline",
        },
        Compass::Se => LabelAnchor {
            dx: offset / SQRT2,
            dy: -offset / SQRT2,
            text_anchor: "start",
            baseline: "hanging",
        },
        Compass::S => LabelAnchor {
            dx: 0.0,
            dy: -multiplier * offset,
            text_anchor: "middle",
            baseline: "hanging",
        },
        Compass::Sw => LabelAnchor {
            dx: -offset / SQRT2,
            dy: -offset / SQRT2,
            text_anchor: "end",
            baseline: "hanging",
        },
        Compass::W => LabelAnchor {
            dx: -offset,
            dy: -2.0,
            text_anchor: "end",
            baseline: "baseline",
        },
        Compass::Nw => LabelAnchor {
            dx: -stacked,
            dy: stacked,
            text_anchor: "end",
            baseline: "baseline",
        },
    }
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path, map_cfg: &MapConfig) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.font_family = "Helvetica".to_string();
    opt.default_size = usvg::Size::from_wh(map_cfg.width, map_cfg.height)
        .unwrap_or(usvg::Size::from_wh(760.0, 640.0).unwrap());

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    Ok(())
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::MapDocument;
    use crate::route::RouteStep;

    fn map() -> TubeMap {
        let doc = MapDocument::from_json(
            r##"{
                "lines": [
                    {
                        "name": "U1",
                        "color": "#55a822",
                        "nodes": [
                            { "coords": [0, 0], "name": "Alpha", "labelPos": "N" },
                            { "coords": [2, 0] },
                            { "coords": [4, 0], "name": "Beta", "labelPos": "S", "stationSymbol": "double" }
                        ]
                    },
                    {
                        "name": "U2",
                        "color": "#ff3300",
                        "dashed": true,
                        "nodes": [
                            { "coords": [4, 3], "name": "Delta", "labelPos": "E" },
                            { "coords": [4, 0], "name": "Beta 2" }
                        ]
                    }
                ],
                "stations": {
                    "Alpha": { "label": "Alpha" },
                    "Beta": { "label": "Beta" },
                    "Beta 2": { "label": "Beta" },
                    "Delta": { "label": "Delta" }
                }
            }"##,
        )
        .expect("valid document");
        let model = GridModel::build(&doc).expect("valid model");
        TubeMap::new(model, Config::default())
    }

    /// One line covering every curve shape: orthogonal run, quarter turn
    /// exiting east, another run, a knee, then a long diagonal.
    fn curved_map() -> TubeMap {
        let doc = MapDocument::from_json(
            r##"{
                "lines": [
                    {
                        "name": "U3",
                        "color": "#019377",
                        "nodes": [
                            { "coords": [0, 0], "name": "West", "labelPos": "S" },
                            { "coords": [3, 0] },
                            { "coords": [4, 1], "dir": "E" },
                            { "coords": [6, 1], "name": "Mitte", "labelPos": "S" },
                            { "coords": [7, 3] },
                            { "coords": [9, 5], "name": "Ost", "labelPos": "N" }
                        ]
                    }
                ],
                "stations": {
                    "West": { "label": "West" },
                    "Mitte": { "label": "Mitte" },
                    "Ost": { "label": "Ost" }
                }
            }"##,
        )
        .expect("valid document");
        let model = GridModel::build(&doc).expect("valid model");
        TubeMap::new(model, Config::default())
    }

    /// `d` attribute of the one path stroked in U3's own color. With a route
    /// active the base line is dimmed, so this is the highlight segment.
    fn segment_path(svg: &str) -> String {
        let stroke = svg.find("stroke=\"#019377\"").expect("segment stroke");
        let before = &svg[..stroke];
        let d = before.rfind("d=\"").expect("d attribute") + 3;
        before[d..].split('"').next().expect("d terminator").to_string()
    }

    #[test]
    fn base_render_layers() {
        let map = map();
        let svg = map.to_svg().expect("renders");
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("stroke=\"#55a822\""));
        // Dashed line carries a dash/gap pair; the gap is the longer one.
        let dash = svg
            .split("stroke-dasharray=\"")
            .nth(1)
            .expect("dash array")
            .split('"')
            .next()
            .unwrap();
        let (dash_len, gap) = dash.split_once(',').expect("dash pair");
        assert!(dash_len.parse::<f32>().unwrap() < gap.parse::<f32>().unwrap());
        assert!(svg.contains("<circle id=\"Alpha\""));
        assert!(svg.contains("<rect id=\"Beta\""));
        assert!(svg.contains(">Alpha</tspan>"));
    }

    #[test]
    fn visited_toggle_flips_marker_paint() {
        let mut map = map();
        assert!(map.toggle_visited("Alpha"));
        let svg = map.to_svg().expect("renders");
        let alpha = svg.split("<circle id=\"Alpha\"").nth(1).expect("marker");
        assert!(alpha.starts_with(" class=\"station Alpha\""));
        assert!(alpha[..alpha.find("/>").unwrap()].contains("fill=\"#000000\""));

        assert!(!map.toggle_visited("Alpha"));
        let svg = map.to_svg().expect("renders");
        let alpha = svg.split("<circle id=\"Alpha\"").nth(1).expect("marker");
        assert!(alpha[..alpha.find("/>").unwrap()].contains("fill=\"#ffffff\""));
    }

    #[test]
    fn route_dims_base_lines_and_recolors_endpoints() {
        let mut map = map();
        map.draw_route(&[
            RouteStep {
                line: "U1".to_string(),
                from: "Alpha".to_string(),
                to: "Beta".to_string(),
            },
            RouteStep {
                line: "U2".to_string(),
                from: "Beta".to_string(),
                to: "Delta".to_string(),
            },
        ])
        .expect("valid route");

        let svg = map.to_svg().expect("renders");
        // Base lines fall back to the dimmed color; the highlight segment
        // keeps the line's own.
        assert!(svg.contains("stroke=\"#D9D9D9\""));
        assert!(svg.contains("stroke=\"#55a822\""));
        assert!(svg.contains("fill=\"#39FF14\""));
        assert!(svg.contains("fill=\"#FCE883\""));
        // Beta is the hand-off, so both its markers paint via.
        assert!(svg.contains("fill=\"#C0C0C0\""));
    }

    #[test]
    fn route_ridden_backwards_over_curves_draws_the_same_stroke() {
        let mut map = curved_map();
        map.draw_route(&[RouteStep {
            line: "U3".to_string(),
            from: "West".to_string(),
            to: "Ost".to_string(),
        }])
        .expect("forward route");
        let forward = map.to_svg().expect("renders");

        map.draw_route(&[RouteStep {
            line: "U3".to_string(),
            from: "Ost".to_string(),
            to: "West".to_string(),
        }])
        .expect("reverse route");
        let backward = map.to_svg().expect("renders");

        let d = segment_path(&forward);
        assert_eq!(d, segment_path(&backward));
        // The turn and the knee survive the highlight in both directions.
        assert!(d.contains('Q'));
        assert!(d.contains('C'));
        assert_eq!(
            map.route().expect("route set").touched_stations(),
            vec!["Ost", "Mitte", "West"]
        );
    }

    #[test]
    fn clearing_a_route_restores_the_base_snapshot() {
        let mut map = map();
        let before = map.to_svg().expect("renders");
        map.draw_route(&[RouteStep {
            line: "U1".to_string(),
            from: "Alpha".to_string(),
            to: "Beta".to_string(),
        }])
        .expect("valid route");
        assert_ne!(map.to_svg().expect("renders"), before);
        map.clear_route();
        assert_eq!(map.to_svg().expect("renders"), before);
    }

    #[test]
    fn failed_route_leaves_no_highlight() {
        let mut map = map();
        let err = map
            .draw_route(&[RouteStep {
                line: "U9".to_string(),
                from: "Alpha".to_string(),
                to: "Beta".to_string(),
            }])
            .unwrap_err();
        assert!(matches!(err, RouteError::UnknownLine { .. }));
        assert!(map.route().is_none());
    }

    #[test]
    fn resize_refits_the_scale() {
        let mut map = map();
        let before = map.scale().unit_length;
        map.resize(1520.0, 1280.0);
        assert!(map.scale().unit_length > before);
    }

    #[test]
    fn label_anchor_table() {
        let east = label_anchor(Compass::E, 1, 10.0, 0.7, 1.8);
        assert_eq!(east.text_anchor, "start");
        assert_eq!(east.dx, 18.0);

        let north = label_anchor(Compass::N, 2, 10.0, 0.7, 1.8);
        assert_eq!(north.text_anchor, "middle");
        // Two-line labels sit higher so the block clears the marker.
        assert!(north.dy > label_anchor(Compass::N, 1, 10.0, 0.7, 1.8).dy);

        let south = label_anchor(Compass::S, 1, 10.0, 0.7, 1.8);
        assert_eq!(south.baseline, "hanging");
        assert_eq!(south.dy, -0.7 * 18.0);
    }
}
