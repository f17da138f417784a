use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub background: String,
    pub label_color: String,
    pub inactive_label_color: String,
    pub station_fill: String,
    pub station_stroke: String,
    pub visited_station_fill: String,
    pub visited_station_stroke: String,
    /// Base lines fade to this while a route highlight is active.
    pub dimmed_line_color: String,
    pub boundary_color: String,
    pub route_start_color: String,
    pub route_end_color: String,
    pub route_via_color: String,
    pub route_border_color: String,
}

impl Theme {
    pub fn classic() -> Self {
        Self {
            font_family: "Helvetica, Arial, sans-serif".to_string(),
            background: "#FFFFFF".to_string(),
            label_color: "#000000".to_string(),
            inactive_label_color: "grey".to_string(),
            station_fill: "#ffffff".to_string(),
            station_stroke: "#000000".to_string(),
            visited_station_fill: "#000000".to_string(),
            visited_station_stroke: "#ffffff".to_string(),
            dimmed_line_color: "#D9D9D9".to_string(),
            boundary_color: "grey".to_string(),
            route_start_color: "#39FF14".to_string(),
            route_end_color: "#FCE883".to_string(),
            route_via_color: "#C0C0C0".to_string(),
            route_border_color: "#000000".to_string(),
        }
    }

    pub fn dark() -> Self {
        Self {
            font_family: "Helvetica, Arial, sans-serif".to_string(),
            background: "#14181F".to_string(),
            label_color: "#E8EAED".to_string(),
            inactive_label_color: "#6B7280".to_string(),
            station_fill: "#14181F".to_string(),
            station_stroke: "#E8EAED".to_string(),
            visited_station_fill: "#E8EAED".to_string(),
            visited_station_stroke: "#14181F".to_string(),
            dimmed_line_color: "#3A4150".to_string(),
            boundary_color: "#6B7280".to_string(),
            route_start_color: "#39FF14".to_string(),
            route_end_color: "#FCE883".to_string(),
            route_via_color: "#8E959F".to_string(),
            route_border_color: "#E8EAED".to_string(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::classic()
    }
}
