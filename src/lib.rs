#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod dataset;
pub mod model;
pub mod path;
pub mod render;
pub mod route;
pub mod scale;
pub mod theme;
pub mod topology;

pub use config::{load_config, Config, MapConfig};
pub use dataset::MapDocument;
pub use model::GridModel;
pub use render::TubeMap;
pub use route::{extract_route, RouteResponse, RouteStep};
pub use theme::Theme;
pub use topology::{normalize_name, Topology};

#[cfg(feature = "cli")]
pub use cli::run;
