use std::collections::BTreeMap;
use std::env;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use formats::feature_info::FeatureRecord;
use formats::collection::parse_feature_collection;
use foundation::{Crs, Extent, MapPoint, ScreenPoint};
use layers::DeploymentConfig;
use layers::attributes::display_rows;
use scene::labels::edge_length_labels;
use scene::{PlanarOps, Polygon, PolygonEditor};
use serde_json::{Map, Value, json};
use services::{FeatureSink, MapSession, MapView, QueryOutcome, ReqwestTransport};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod convert;
mod host;

use convert::{
    parse_bbox, parse_line, parse_pair, parse_size, pixel_to_map, polygons_of,
    polygons_to_geojson,
};
use host::HeadlessHost;

const CONFIG_ENV: &str = "MAPEDIT_CONFIG";

#[derive(Parser, Debug)]
#[command(author, version, about = "Polygon editing and WMS/WFS feature queries")]
struct Args {
    /// Deployment config JSON (default: $MAPEDIT_CONFIG, then the built-in deployment)
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Query a layer's attributes at a pixel of a view
    Query {
        /// Logical layer name from the deployment config
        #[arg(long)]
        layer: String,

        /// View extent: xmin,ymin,xmax,ymax (default: the deployment's home view)
        #[arg(long)]
        bbox: Option<String>,

        /// EPSG code of --bbox
        #[arg(long, default_value_t = 4326)]
        crs: u32,

        /// View size in pixels: WIDTHxHEIGHT
        #[arg(long, default_value = "800x600")]
        size: String,

        /// Clicked pixel: X,Y from the top-left corner
        #[arg(long)]
        pixel: String,

        /// CQL filter applied to the layer
        #[arg(long)]
        filter: Option<String>,
    },

    /// Resolve the extent a layer zooms to
    Extent {
        #[arg(long)]
        layer: String,

        #[arg(long)]
        filter: Option<String>,
    },

    /// Cut one polygon of a GeoJSON file with a line
    Split {
        #[arg(long)]
        input: PathBuf,

        /// Cut line: space-separated x,y pairs
        #[arg(long)]
        line: String,

        /// Index of the polygon to cut
        #[arg(long, default_value_t = 0)]
        target: usize,

        #[arg(long, default_value_t = 4326)]
        crs: u32,
    },

    /// Union every polygon of a GeoJSON file, in file order
    Merge {
        #[arg(long)]
        input: PathBuf,

        #[arg(long, default_value_t = 4326)]
        crs: u32,
    },

    /// Geodesic edge lengths of every polygon of a GeoJSON file
    Lengths {
        #[arg(long)]
        input: PathBuf,

        #[arg(long, default_value_t = 4326)]
        crs: u32,
    },

    /// Service hosts that need cross-origin access
    Domains,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = Arc::new(load_config(args.config)?);

    match args.command {
        Command::Query {
            layer,
            bbox,
            crs,
            size,
            pixel,
            filter,
        } => {
            let (width, height) = parse_size(&size)?;
            let extent = match bbox {
                Some(bbox) => {
                    let [xmin, ymin, xmax, ymax] = parse_bbox(&bbox)?;
                    Extent::new(xmin, ymin, xmax, ymax, Crs::from_wkid(crs))
                }
                None => config.map.home_extent(width, height),
            };
            let view = MapView {
                extent,
                width,
                height,
            };
            let pixel = parse_pair(&pixel)?;
            query(config, view, &layer, pixel, filter.as_deref()).await?
        }
        Command::Extent { layer, filter } => extent(config, &layer, filter.as_deref()).await?,
        Command::Split {
            input,
            line,
            target,
            crs,
        } => split(&input, &line, target, Crs::from_wkid(crs)).await?,
        Command::Merge { input, crs } => merge(&input, Crs::from_wkid(crs)).await?,
        Command::Lengths { input, crs } => lengths(&input, Crs::from_wkid(crs)).await?,
        Command::Domains => {
            for domain in config.cors_domains() {
                println!("{domain}");
            }
        }
    }

    Ok(())
}

fn load_config(path: Option<PathBuf>) -> Result<DeploymentConfig, Box<dyn Error>> {
    let path = path.or_else(|| env::var_os(CONFIG_ENV).map(PathBuf::from));
    match path {
        Some(path) => {
            info!(path = %path.display(), "loading deployment config");
            Ok(DeploymentConfig::load(&path)?)
        }
        None => Ok(DeploymentConfig::builtin()),
    }
}

fn session(config: Arc<DeploymentConfig>, view: MapView) -> MapSession<HeadlessHost> {
    MapSession::new(
        config,
        HeadlessHost::new(view),
        Arc::new(ReqwestTransport::new()),
    )
}

/// The deployment's starting view at 800x600.
fn home_view(config: &DeploymentConfig) -> MapView {
    let (width, height) = (800, 600);
    info!(basemap = %config.map.basemap, zoom = config.map.zoom, "starting from home view");
    MapView {
        extent: config.map.home_extent(width, height),
        width,
        height,
    }
}

/// Collects display rows per layer as JSON.
struct JsonSink<'a> {
    config: &'a DeploymentConfig,
    layers: Vec<Value>,
}

impl FeatureSink for JsonSink<'_> {
    fn show(&mut self, layer: &str, records: &[FeatureRecord], at: MapPoint) {
        let features: Vec<Value> = records
            .iter()
            .map(|record| {
                let rows: Map<String, Value> = display_rows(self.config, record)
                    .into_iter()
                    .map(|(name, value)| (name, Value::String(value)))
                    .collect();
                Value::Object(rows)
            })
            .collect();
        self.layers.push(json!({
            "layer": layer,
            "at": [at.x, at.y],
            "features": features,
        }));
    }
}

async fn query(
    config: Arc<DeploymentConfig>,
    view: MapView,
    layer: &str,
    pixel: [f64; 2],
    filter: Option<&str>,
) -> Result<(), Box<dyn Error>> {
    let mut session = session(Arc::clone(&config), view);
    session.add_layer(layer, filter, &BTreeMap::new())?;

    let at = pixel_to_map(&view.extent, (view.width, view.height), pixel);
    let mut sink = JsonSink {
        config: &config,
        layers: Vec::new(),
    };
    let outcomes = session
        .query_click(ScreenPoint::new(pixel[0], pixel[1]), at, &mut sink)
        .await;

    println!("{}", serde_json::to_string_pretty(&sink.layers)?);
    for (name, outcome) in outcomes {
        if let QueryOutcome::Failure(err) = outcome {
            error!(layer = %name, error = %err, "query failed");
            return Err(err.into());
        }
    }
    Ok(())
}

async fn extent(
    config: Arc<DeploymentConfig>,
    layer: &str,
    filter: Option<&str>,
) -> Result<(), Box<dyn Error>> {
    let view = home_view(&config);
    let mut session = session(config, view);
    let update = session
        .add_layer(layer, filter, &BTreeMap::new())?
        .run()
        .await;
    let resolved = update.resolved;
    if session.apply_extent(update) {
        if let Some(view) = session.host().last_extent() {
            info!(
                xmin = view.xmin(),
                ymin = view.ymin(),
                xmax = view.xmax(),
                ymax = view.ymax(),
                "view moved"
            );
        }
    }

    match resolved {
        Some(resolved) => {
            println!("{}", serde_json::to_string_pretty(&resolved)?);
            Ok(())
        }
        None => Err(format!("no extent available for layer '{layer}'").into()),
    }
}

async fn read_polygons(input: &Path) -> Result<Vec<Polygon>, Box<dyn Error>> {
    let body = tokio::fs::read_to_string(input).await?;
    let polygons = polygons_of(&parse_feature_collection(&body)?);
    if polygons.is_empty() {
        return Err(format!("{} contains no polygons", input.display()).into());
    }
    Ok(polygons)
}

fn editor_with(polygons: Vec<Polygon>, crs: Crs) -> (PolygonEditor, Vec<scene::GraphicId>) {
    let mut editor = PolygonEditor::planar(crs);
    let ids = polygons
        .into_iter()
        .map(|p| editor.create_polygon(p))
        .collect();
    (editor, ids)
}

fn print_polygons(editor: &PolygonEditor) -> Result<(), Box<dyn Error>> {
    let out = polygons_to_geojson(editor.polygons().map(|(_, p)| p));
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

async fn split(
    input: &Path,
    line: &str,
    target: usize,
    crs: Crs,
) -> Result<(), Box<dyn Error>> {
    let line = parse_line(line)?;
    let (mut editor, ids) = editor_with(read_polygons(input).await?, crs);
    let id = *ids
        .get(target)
        .ok_or_else(|| format!("polygon {target} out of range ({} polygons)", ids.len()))?;

    editor.toggle_selection(id);
    let pieces = editor.split(&line)?;
    info!(pieces = pieces.len(), "polygon split");
    print_polygons(&editor)
}

async fn merge(input: &Path, crs: Crs) -> Result<(), Box<dyn Error>> {
    let (mut editor, ids) = editor_with(read_polygons(input).await?, crs);
    for id in ids {
        editor.toggle_selection(id);
    }
    editor.merge()?;
    print_polygons(&editor)
}

async fn lengths(input: &Path, crs: Crs) -> Result<(), Box<dyn Error>> {
    let polygons = read_polygons(input).await?;
    let out: Vec<Value> = polygons
        .iter()
        .enumerate()
        .map(|(index, polygon)| {
            let edges: Vec<Value> = edge_length_labels(&PlanarOps, polygon, crs)
                .into_iter()
                .map(|label| {
                    json!({
                        "anchor": [label.anchor.x, label.anchor.y],
                        "meters": label.meters,
                        "text": label.text,
                    })
                })
                .collect();
            json!({ "polygon": index, "edges": edges })
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::home_view;
    use foundation::math::mercator::geographic_to_mercator;
    use foundation::{Crs, MapPoint};
    use layers::DeploymentConfig;
    use pretty_assertions::assert_eq;

    #[test]
    fn home_view_surrounds_the_configured_center() {
        let config = DeploymentConfig::builtin();
        let view = home_view(&config);
        assert_eq!((view.width, view.height), (800, 600));
        assert_eq!(view.extent.crs(), Crs::WebMercator);
        let [lon, lat] = config.map.center;
        assert!(view.extent.contains(geographic_to_mercator(MapPoint::new(lon, lat))));
    }
}
