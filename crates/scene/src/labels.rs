use foundation::crs::Crs;
use foundation::math::MapPoint;
use tracing::debug;

use crate::components::{Polygon, Polyline};
use crate::ops::GeometryOps;

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeLabel {
    /// Segment midpoint in the map CRS.
    pub anchor: MapPoint,
    pub meters: f64,
    pub text: String,
}

pub fn format_length(meters: f64) -> String {
    format!("{meters:.1} m")
}

/// One label per edge of the polygon's first ring, closing edge included.
pub fn edge_length_labels<O: GeometryOps + ?Sized>(
    ops: &O,
    polygon: &Polygon,
    crs: Crs,
) -> Vec<EdgeLabel> {
    let Some(ring) = polygon.first_ring() else {
        return Vec::new();
    };
    let mut vertices = ring.to_vec();
    if vertices.len() > 1 && vertices.first() == vertices.last() {
        vertices.pop();
    }
    if vertices.len() < 3 {
        return Vec::new();
    }
    if let Some(first) = vertices.first().copied() {
        vertices.push(first);
    }
    segment_labels(ops, &vertices, crs)
}

/// Labels for an in-progress path. The path is not closed.
pub fn preview_lengths<O: GeometryOps + ?Sized>(
    ops: &O,
    path: &[MapPoint],
    crs: Crs,
) -> Vec<EdgeLabel> {
    segment_labels(ops, path, crs)
}

fn segment_labels<O: GeometryOps + ?Sized>(
    ops: &O,
    vertices: &[MapPoint],
    crs: Crs,
) -> Vec<EdgeLabel> {
    vertices
        .windows(2)
        .filter_map(|w| {
            let segment = Polyline::new(vec![w[0], w[1]]);
            match ops.geodesic_length(&segment, crs) {
                Ok(meters) => Some(EdgeLabel {
                    anchor: w[0].midpoint(w[1]),
                    meters,
                    text: format_length(meters),
                }),
                Err(err) => {
                    debug!(error = %err, "segment length unavailable, label skipped");
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{edge_length_labels, format_length, preview_lengths};
    use crate::components::{Polygon, Polyline};
    use crate::ops::{GeometryOpError, GeometryOps};
    use foundation::crs::Crs;
    use foundation::math::MapPoint;
    use pretty_assertions::assert_eq;

    /// Planar lengths, failing on any segment that touches x = 99.
    struct Ruler;

    impl GeometryOps for Ruler {
        fn cut(&self, _: &Polygon, _: &Polyline) -> Result<Vec<Polygon>, GeometryOpError> {
            Err(GeometryOpError::Engine("unused".into()))
        }

        fn union(&self, _: &Polygon, _: &Polygon) -> Result<Option<Polygon>, GeometryOpError> {
            Err(GeometryOpError::Engine("unused".into()))
        }

        fn geodesic_length(&self, line: &Polyline, _: Crs) -> Result<f64, GeometryOpError> {
            let (a, b) = (line.vertices[0], line.vertices[1]);
            if a.x == 99.0 || b.x == 99.0 {
                return Err(GeometryOpError::Engine("boom".into()));
            }
            Ok((a.x - b.x).hypot(a.y - b.y))
        }
    }

    #[test]
    fn rounds_to_one_decimal() {
        assert_eq!(format_length(12.345), "12.3 m");
        assert_eq!(format_length(0.0), "0.0 m");
        assert_eq!(format_length(1000.06), "1000.1 m");
    }

    #[test]
    fn labels_every_edge_including_closing_one() {
        let tri = Polygon::from_exterior(vec![
            MapPoint::new(0.0, 0.0),
            MapPoint::new(3.0, 0.0),
            MapPoint::new(3.0, 4.0),
        ]);
        let labels = edge_length_labels(&Ruler, &tri, Crs::WebMercator);
        let texts: Vec<&str> = labels.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["3.0 m", "4.0 m", "5.0 m"]);
        assert_eq!(labels[2].anchor, MapPoint::new(1.5, 2.0));
    }

    #[test]
    fn failing_segment_is_skipped() {
        let poly = Polygon::from_exterior(vec![
            MapPoint::new(0.0, 0.0),
            MapPoint::new(99.0, 0.0),
            MapPoint::new(0.0, 10.0),
        ]);
        let labels = edge_length_labels(&Ruler, &poly, Crs::WebMercator);
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].text, "10.0 m");
    }

    #[test]
    fn preview_does_not_close_the_path() {
        let path = [
            MapPoint::new(0.0, 0.0),
            MapPoint::new(3.0, 0.0),
            MapPoint::new(3.0, 4.0),
        ];
        assert_eq!(preview_lengths(&Ruler, &path, Crs::Wgs84).len(), 2);
        assert!(preview_lengths(&Ruler, &path[..1], Crs::Wgs84).is_empty());
    }
}
