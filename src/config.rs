//! Map configuration and the optional JSON config file.
//!
//! Every tuning constant of the renderer lives in [`MapConfig`] with its
//! default from the reference artwork; a config file overrides fields one by
//! one, so partial files stay valid as new knobs appear.

use crate::scale::Margin;
use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapConfig {
    /// Viewport size in pixels.
    pub width: f32,
    pub height: f32,
    pub margin: Margin,
    /// Line stroke width as a fraction of one grid unit.
    pub line_width_multiplier: f32,
    /// Controls how far path endpoints extend past their terminal station.
    pub line_width_tick_ratio: f32,
    /// Painted stroke width relative to the nominal line width.
    pub line_stroke_ratio: f32,
    /// Dash length for dashed (out-of-service) lines, in line widths; the
    /// gap between dashes adds one more line width on top.
    pub dash_ratio: f32,
    pub station_radius_ratio: f32,
    pub station_stroke_ratio: f32,
    pub long_station_width_ratio: f32,
    /// Height multipliers for the long station symbols; the two observed
    /// artwork values, not a formula.
    pub double_symbol_height: f32,
    pub long_symbol_height: f32,
    /// Grid offset of a long station rect's corner from its anchor node.
    pub long_station_offset: f32,
    pub label_font_ratio: f32,
    pub label_offset_ratio: f32,
    pub boundary_width_ratio: f32,
    pub boundary_opacity: f32,
    pub show_boundary: bool,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            width: 760.0,
            height: 640.0,
            margin: Margin::default(),
            line_width_multiplier: 0.7,
            line_width_tick_ratio: 1.0,
            line_stroke_ratio: 1.4,
            dash_ratio: 2.7,
            station_radius_ratio: 1.37,
            station_stroke_ratio: 0.25,
            long_station_width_ratio: 2.4,
            double_symbol_height: 5.0,
            long_symbol_height: 8.0,
            long_station_offset: 0.8,
            label_font_ratio: 3.0,
            label_offset_ratio: 1.8,
            boundary_width_ratio: 0.4,
            boundary_opacity: 0.4,
            show_boundary: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub map: MapConfig,
    pub theme: Theme,
}

/// On-disk config file: everything optional, overriding the defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    map: Option<MapOverrides>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    background: Option<String>,
    label_color: Option<String>,
    inactive_label_color: Option<String>,
    station_fill: Option<String>,
    station_stroke: Option<String>,
    visited_station_fill: Option<String>,
    visited_station_stroke: Option<String>,
    dimmed_line_color: Option<String>,
    boundary_color: Option<String>,
    route_start_color: Option<String>,
    route_end_color: Option<String>,
    route_via_color: Option<String>,
    route_border_color: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MapOverrides {
    width: Option<f32>,
    height: Option<f32>,
    margin: Option<Margin>,
    line_width_multiplier: Option<f32>,
    line_width_tick_ratio: Option<f32>,
    line_stroke_ratio: Option<f32>,
    dash_ratio: Option<f32>,
    station_radius_ratio: Option<f32>,
    station_stroke_ratio: Option<f32>,
    long_station_width_ratio: Option<f32>,
    double_symbol_height: Option<f32>,
    long_symbol_height: Option<f32>,
    long_station_offset: Option<f32>,
    label_font_ratio: Option<f32>,
    label_offset_ratio: Option<f32>,
    boundary_width_ratio: Option<f32>,
    boundary_opacity: Option<f32>,
    show_boundary: Option<bool>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let Some(path) = path else {
        return Ok(config);
    };

    let contents = std::fs::read_to_string(path)?;
    let parsed: ConfigFile = serde_json::from_str(&contents)?;

    if let Some(theme_name) = parsed.theme.as_deref() {
        if theme_name == "dark" {
            config.theme = Theme::dark();
        } else if theme_name == "classic" || theme_name == "default" {
            config.theme = Theme::classic();
        }
    }

    if let Some(vars) = parsed.theme_variables {
        if let Some(v) = vars.font_family {
            config.theme.font_family = v;
        }
        if let Some(v) = vars.background {
            config.theme.background = v;
        }
        if let Some(v) = vars.label_color {
            config.theme.label_color = v;
        }
        if let Some(v) = vars.inactive_label_color {
            config.theme.inactive_label_color = v;
        }
        if let Some(v) = vars.station_fill {
            config.theme.station_fill = v;
        }
        if let Some(v) = vars.station_stroke {
            config.theme.station_stroke = v;
        }
        if let Some(v) = vars.visited_station_fill {
            config.theme.visited_station_fill = v;
        }
        if let Some(v) = vars.visited_station_stroke {
            config.theme.visited_station_stroke = v;
        }
        if let Some(v) = vars.dimmed_line_color {
            config.theme.dimmed_line_color = v;
        }
        if let Some(v) = vars.boundary_color {
            config.theme.boundary_color = v;
        }
        if let Some(v) = vars.route_start_color {
            config.theme.route_start_color = v;
        }
        if let Some(v) = vars.route_end_color {
            config.theme.route_end_color = v;
        }
        if let Some(v) = vars.route_via_color {
            config.theme.route_via_color = v;
        }
        if let Some(v) = vars.route_border_color {
            config.theme.route_border_color = v;
        }
    }

    if let Some(map) = parsed.map {
        if let Some(v) = map.width {
            config.map.width = v;
        }
        if let Some(v) = map.height {
            config.map.height = v;
        }
        if let Some(v) = map.margin {
            config.map.margin = v;
        }
        if let Some(v) = map.line_width_multiplier {
            config.map.line_width_multiplier = v;
        }
        if let Some(v) = map.line_width_tick_ratio {
            config.map.line_width_tick_ratio = v;
        }
        if let Some(v) = map.line_stroke_ratio {
            config.map.line_stroke_ratio = v;
        }
        if let Some(v) = map.dash_ratio {
            config.map.dash_ratio = v;
        }
        if let Some(v) = map.station_radius_ratio {
            config.map.station_radius_ratio = v;
        }
        if let Some(v) = map.station_stroke_ratio {
            config.map.station_stroke_ratio = v;
        }
        if let Some(v) = map.long_station_width_ratio {
            config.map.long_station_width_ratio = v;
        }
        if let Some(v) = map.double_symbol_height {
            config.map.double_symbol_height = v;
        }
        if let Some(v) = map.long_symbol_height {
            config.map.long_symbol_height = v;
        }
        if let Some(v) = map.long_station_offset {
            config.map.long_station_offset = v;
        }
        if let Some(v) = map.label_font_ratio {
            config.map.label_font_ratio = v;
        }
        if let Some(v) = map.label_offset_ratio {
            config.map.label_offset_ratio = v;
        }
        if let Some(v) = map.boundary_width_ratio {
            config.map.boundary_width_ratio = v;
        }
        if let Some(v) = map.boundary_opacity {
            config.map.boundary_opacity = v;
        }
        if let Some(v) = map.show_boundary {
            config.map.show_boundary = v;
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_path_yields_defaults() {
        let config = load_config(None).expect("defaults");
        assert_eq!(config.map.line_width_multiplier, 0.7);
        assert_eq!(config.map.double_symbol_height, 5.0);
        assert_eq!(config.map.long_symbol_height, 8.0);
        assert_eq!(config.theme.dimmed_line_color, "#D9D9D9");
    }

    #[test]
    fn partial_file_overrides_field_by_field() {
        let dir = std::env::temp_dir().join("tubemap-config-test");
        std::fs::create_dir_all(&dir).expect("temp dir");
        let path = dir.join("config.json");
        std::fs::write(
            &path,
            r##"{
                "theme": "dark",
                "themeVariables": { "routeStartColor": "#00FF00" },
                "map": { "width": 1200, "showBoundary": true }
            }"##,
        )
        .expect("write config");

        let config = load_config(Some(&path)).expect("loads");
        assert_eq!(config.theme.background, Theme::dark().background);
        assert_eq!(config.theme.route_start_color, "#00FF00");
        assert_eq!(config.map.width, 1200.0);
        assert!(config.map.show_boundary);
        // Untouched fields keep their defaults.
        assert_eq!(config.map.height, 640.0);
    }
}
