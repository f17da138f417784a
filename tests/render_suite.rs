use std::path::{Path, PathBuf};

use tubemap_renderer::config::Config;
use tubemap_renderer::dataset::MapDocument;
use tubemap_renderer::model::GridModel;
use tubemap_renderer::render::TubeMap;
use tubemap_renderer::route::{RouteResponse, RouteStep};
use tubemap_renderer::topology::Topology;

fn fixture_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

fn load_map(fixture: &str) -> TubeMap {
    let path = fixture_root().join(fixture);
    let input = std::fs::read_to_string(&path).expect("fixture read failed");
    let doc = MapDocument::from_json(&input).expect("fixture parse failed");
    let model = GridModel::build(&doc).expect("fixture model build failed");
    TubeMap::new(model, Config::default())
}

fn assert_valid_svg(svg: &str, fixture: &str) {
    assert!(svg.contains("<svg"), "{fixture}: missing <svg tag");
    assert!(svg.contains("</svg>"), "{fixture}: missing </svg tag");
}

#[test]
fn render_all_fixtures() {
    // Keep this list explicit so new geometry cases must be added intentionally.
    let candidates = ["basic.json", "curves.json", "symbols.json", "boundary.json"];

    for fixture in candidates {
        let map = load_map(fixture);
        let svg = map.to_svg().expect("render failed");
        assert_valid_svg(&svg, fixture);
    }
}

#[test]
fn curves_fixture_emits_every_segment_shape() {
    let map = load_map("curves.json");
    let svg = map.to_svg().expect("render failed");
    // Straight run, quarter turn, and knee all appear in one path.
    let path = svg
        .split("id=\"U3\"")
        .nth(1)
        .and_then(|rest| rest.split("d=\"").nth(1))
        .and_then(|rest| rest.split('"').next())
        .expect("U3 path");
    assert!(path.starts_with('M'));
    assert!(path.contains('L'));
    assert!(path.contains('Q'));
    assert!(path.contains('C'));
}

#[test]
fn symbols_fixture_renders_rects_dashes_and_hidden_stations() {
    let map = load_map("symbols.json");
    let svg = map.to_svg().expect("render failed");

    assert!(svg.contains("<rect id=\"Markthalle\""));
    assert!(svg.contains("<rect id=\"Alter Bahnhof\""));
    assert!(svg.contains("stroke-dasharray"));
    // Hidden duplicate marker stays off the canvas.
    assert!(!svg.contains("id=\"Alter Bahnhof 2\""));
    // The closed station's label is struck through; the inactive one greyed.
    assert!(svg.contains("line-through"));
    assert!(svg.contains("fill=\"grey\""));
    // Two-line label becomes two tspans.
    assert!(svg.contains(">Markthalle</tspan>"));
    assert!(svg.contains(">Nord</tspan>"));
}

#[test]
fn boundary_is_opt_in() {
    let map = load_map("boundary.json");
    let svg = map.to_svg().expect("render failed");
    assert!(!svg.contains("Old city wall"));

    let path = fixture_root().join("boundary.json");
    let input = std::fs::read_to_string(&path).expect("fixture read failed");
    let doc = MapDocument::from_json(&input).expect("fixture parse failed");
    let model = GridModel::build(&doc).expect("fixture model build failed");
    let mut config = Config::default();
    config.map.show_boundary = true;
    let map = TubeMap::new(model, config);
    let svg = map.to_svg().expect("render failed");
    assert!(svg.contains("Old city wall (1961 - 1989)"));
    assert!(svg.contains("opacity=\"0.4\""));
}

#[test]
fn route_highlight_round_trip() {
    let mut map = load_map("basic.json");
    let base = map.to_svg().expect("render failed");

    let route_json = std::fs::read_to_string(
        fixture_root().join("routes").join("hauptplatz_nordpark.json"),
    )
    .expect("route fixture read failed");
    let response = RouteResponse::from_json(&route_json).expect("route parse failed");

    map.draw_route(&response.routes[0].steps)
        .expect("route applies");
    let highlighted = map.to_svg().expect("render failed");
    assert!(highlighted.contains("#D9D9D9"));
    assert!(highlighted.contains("#39FF14"));
    assert!(highlighted.contains("#FCE883"));
    assert!(highlighted.contains("#C0C0C0"));
    // The interchange is listed once per traversal, normalized names aside.
    assert_eq!(
        map.route().expect("route set").touched_stations(),
        vec!["Westkreuz", "Hauptplatz", "Hauptplatz 2", "Nordpark"]
    );

    map.clear_route();
    assert_eq!(map.to_svg().expect("render failed"), base);
}

#[test]
fn alternate_route_from_the_same_response() {
    let mut map = load_map("basic.json");
    let route_json = std::fs::read_to_string(
        fixture_root().join("routes").join("hauptplatz_nordpark.json"),
    )
    .expect("route fixture read failed");
    let response = RouteResponse::from_json(&route_json).expect("route parse failed");

    map.draw_route(&response.routes[1].steps)
        .expect("route applies");
    let highlight = map.route().expect("route set");
    assert_eq!(highlight.segments.len(), 1);
    assert!(highlight.roles.via.is_empty());
}

#[test]
fn route_ridden_against_the_node_order_still_renders() {
    let mut map = load_map("curves.json");
    map.draw_route(&[RouteStep {
        line: "U3".to_string(),
        from: "Höhenblick".to_string(),
        to: "Ringallee".to_string(),
    }])
    .expect("route applies");

    let svg = map.to_svg().expect("render failed");
    assert_valid_svg(&svg, "curves.json");
    // The backwards ride crosses the long diagonal, the knee and the
    // quarter turn; the segment keeps the line's own color over dimmed base.
    assert!(svg.contains("#D9D9D9"));
    assert!(svg.contains("stroke=\"#019377\""));
    assert_eq!(
        map.route().expect("route set").touched_stations(),
        vec!["Höhenblick", "Bogenstraße", "Ringallee"]
    );
}

#[test]
fn topology_sees_shared_stations_across_lines() {
    let map = load_map("basic.json");
    let topology = Topology::from_model(map.model());

    assert_eq!(topology.station_lines("Hauptplatz"), vec!["U1", "U2"]);

    let neighbors = topology.neighbors("Hauptplatz", "U1");
    assert_eq!(neighbors.previous.station, "Westkreuz");
    assert_eq!(neighbors.next.station, "Osttor");
}
