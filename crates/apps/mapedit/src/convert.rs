//! Command-line argument parsing and GeoJSON <-> editor geometry conversion.

use std::error::Error;

use foundation::{Extent, MapPoint};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Position, Value};
use scene::{Polygon, Polyline};
use tracing::warn;

pub fn parse_bbox(bbox: &str) -> Result<[f64; 4], Box<dyn Error>> {
    let parts: Vec<_> = bbox.split(',').collect();
    if parts.len() != 4 {
        return Err("bbox must be xmin,ymin,xmax,ymax".into());
    }
    let xmin: f64 = parts[0].trim().parse()?;
    let ymin: f64 = parts[1].trim().parse()?;
    let xmax: f64 = parts[2].trim().parse()?;
    let ymax: f64 = parts[3].trim().parse()?;
    Ok([xmin, ymin, xmax, ymax])
}

/// `800x600`
pub fn parse_size(size: &str) -> Result<(u32, u32), Box<dyn Error>> {
    let (w, h) = size
        .split_once(['x', 'X'])
        .ok_or("size must be WIDTHxHEIGHT")?;
    Ok((w.trim().parse()?, h.trim().parse()?))
}

pub fn parse_pair(pair: &str) -> Result<[f64; 2], Box<dyn Error>> {
    let (x, y) = pair.split_once(',').ok_or("expected x,y")?;
    Ok([x.trim().parse()?, y.trim().parse()?])
}

/// Space-separated `x,y` pairs.
pub fn parse_path(path: &str) -> Result<Vec<MapPoint>, Box<dyn Error>> {
    path.split_whitespace()
        .map(|pair| parse_pair(pair).map(MapPoint::from))
        .collect()
}

pub fn parse_line(path: &str) -> Result<Polyline, Box<dyn Error>> {
    let vertices = parse_path(path)?;
    if vertices.len() < 2 {
        return Err("a cut line needs at least two vertices".into());
    }
    Ok(Polyline::new(vertices))
}

/// Map coordinates under a pixel of a view, origin top-left.
pub fn pixel_to_map(extent: &Extent, size: (u32, u32), pixel: [f64; 2]) -> MapPoint {
    let fx = pixel[0] / f64::from(size.0.max(1));
    let fy = pixel[1] / f64::from(size.1.max(1));
    MapPoint::new(
        extent.xmin() + fx * extent.width(),
        extent.ymax() - fy * extent.height(),
    )
}

fn ring_from_positions(ring: &[Position]) -> Vec<MapPoint> {
    ring.iter()
        .filter_map(|p| match p.as_slice() {
            [x, y, ..] => Some(MapPoint::new(*x, *y)),
            _ => None,
        })
        .collect()
}

fn polygon_from_rings(rings: &[Vec<Position>]) -> Option<Polygon> {
    let rings: Vec<_> = rings
        .iter()
        .map(|r| ring_from_positions(r))
        .filter(|r| r.len() >= 3)
        .collect();
    (!rings.is_empty()).then(|| Polygon::new(rings))
}

/// Every polygon in the collection; multi-polygons contribute one per part.
pub fn polygons_of(fc: &FeatureCollection) -> Vec<Polygon> {
    fn collect(value: &Value, out: &mut Vec<Polygon>) {
        match value {
            Value::Polygon(rings) => out.extend(polygon_from_rings(rings)),
            Value::MultiPolygon(polygons) => {
                out.extend(polygons.iter().filter_map(|p| polygon_from_rings(p)))
            }
            Value::GeometryCollection(geometries) => {
                for g in geometries {
                    collect(&g.value, out);
                }
            }
            Value::Point(_) | Value::MultiPoint(_) => warn!("skipping point geometry"),
            Value::LineString(_) | Value::MultiLineString(_) => warn!("skipping line geometry"),
        }
    }

    let mut out = Vec::new();
    for geometry in fc.features.iter().filter_map(|f| f.geometry.as_ref()) {
        collect(&geometry.value, &mut out);
    }
    out
}

pub fn polygon_geometry(polygon: &Polygon) -> Geometry {
    Geometry::new(Value::Polygon(
        polygon
            .rings
            .iter()
            .map(|ring| ring.iter().map(|p| vec![p.x, p.y]).collect())
            .collect(),
    ))
}

/// GeoJSON feature collection of plain polygons.
pub fn polygons_to_geojson<'a>(
    polygons: impl IntoIterator<Item = &'a Polygon>,
) -> FeatureCollection {
    let features = polygons
        .into_iter()
        .map(|p| Feature {
            bbox: None,
            geometry: Some(polygon_geometry(p)),
            id: None,
            properties: Some(JsonObject::new()),
            foreign_members: None,
        })
        .collect();
    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}
