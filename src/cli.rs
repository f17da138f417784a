use crate::config::load_config;
use crate::dataset::MapDocument;
use crate::model::GridModel;
use crate::render::{write_output_svg, TubeMap};
use crate::route::RouteResponse;
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "tubemap", version, about = "Schematic transit map renderer")]
pub struct Args {
    /// Input map dataset (.json) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file (svg/png). Defaults to stdout for SVG if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Config JSON file (themeVariables and map overrides)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Viewport width, overriding the config
    #[arg(short = 'w', long = "width")]
    pub width: Option<f32>,

    /// Viewport height, overriding the config
    #[arg(short = 'H', long = "height")]
    pub height: Option<f32>,

    /// Route response JSON; the chosen route is highlighted on the map
    #[arg(long = "route")]
    pub route: Option<PathBuf>,

    /// 1-based route to pick from the route response
    #[arg(long = "routeIndex", default_value_t = 1)]
    pub route_index: usize,

    /// Draw the decorative boundary polyline, if the dataset has one
    #[arg(long = "showBoundary", default_value_t = false)]
    pub show_boundary: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Svg,
    Png,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    let mut config = load_config(args.config.as_deref())?;
    if let Some(width) = args.width {
        config.map.width = width;
    }
    if let Some(height) = args.height {
        config.map.height = height;
    }
    if args.show_boundary {
        config.map.show_boundary = true;
    }

    let input = read_input(args.input.as_deref())?;
    let doc = MapDocument::from_json(&input).context("Failed to parse map dataset")?;
    let model = GridModel::build(&doc)?;
    let mut map = TubeMap::new(model, config);

    if let Some(route_path) = &args.route {
        let route_json = std::fs::read_to_string(route_path)?;
        let response =
            RouteResponse::from_json(&route_json).context("Failed to parse route response")?;
        let plan = args
            .route_index
            .checked_sub(1)
            .and_then(|idx| response.routes.get(idx))
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Route index {} out of range ({} routes available)",
                    args.route_index,
                    response.routes.len()
                )
            })?;
        map.draw_route(&plan.steps)?;
    }

    let svg = map.to_svg()?;
    match args.output_format {
        OutputFormat::Svg => {
            write_output_svg(&svg, args.output.as_deref())?;
        }
        OutputFormat::Png => {
            let output = ensure_output(&args.output, "png")?;
            write_png(&svg, &output, &map)?;
        }
    }

    Ok(())
}

#[cfg(feature = "png")]
fn write_png(svg: &str, output: &Path, map: &TubeMap) -> Result<()> {
    crate::render::write_output_png(svg, output, &map.config().map)
}

#[cfg(not(feature = "png"))]
fn write_png(_svg: &str, _output: &Path, _map: &TubeMap) -> Result<()> {
    Err(anyhow::anyhow!(
        "PNG output requires the 'png' feature"
    ))
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path {
        if path == Path::new("-") {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            return Ok(buf);
        }
        return Ok(std::fs::read_to_string(path)?);
    }

    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn ensure_output(output: &Option<PathBuf>, ext: &str) -> Result<PathBuf> {
    if let Some(path) = output {
        return Ok(path.clone());
    }
    Err(anyhow::anyhow!("Output path required for {} output", ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_route_flags() {
        let args = Args::try_parse_from([
            "tubemap",
            "-i",
            "map.json",
            "--route",
            "route.json",
            "--routeIndex",
            "2",
            "--showBoundary",
        ])
        .expect("valid arguments");
        assert_eq!(args.route_index, 2);
        assert!(args.show_boundary);
        assert!(matches!(args.output_format, OutputFormat::Svg));
    }
}
