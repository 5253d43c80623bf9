use foundation::math::MapPoint;
use geo::{Area, Contains, Coord, LineString, MultiPolygon, Point};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum GeometryKind {
    Polygon,
    Line,
    Point,
}

/// Polygon in the map CRS as a flat list of rings.
///
/// Rings are stored the way they were drawn. Which ring is a shell and which
/// is a hole is decided by nesting depth when the polygon is handed to the
/// geometry engine, so multi-part results round-trip without extra metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub rings: Vec<Vec<MapPoint>>,
}

impl Polygon {
    pub fn new(rings: Vec<Vec<MapPoint>>) -> Self {
        Self { rings }
    }

    /// Single-ring polygon. The ring is closed if the caller left it open.
    pub fn from_exterior(mut ring: Vec<MapPoint>) -> Self {
        if let (Some(first), Some(last)) = (ring.first().copied(), ring.last().copied())
            && first != last
        {
            ring.push(first);
        }
        Self { rings: vec![ring] }
    }

    pub fn first_ring(&self) -> Option<&[MapPoint]> {
        self.rings.first().map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.rings.iter().all(|r| r.len() < 3)
    }

    pub fn is_finite(&self) -> bool {
        self.rings
            .iter()
            .flatten()
            .all(|p| p.x.is_finite() && p.y.is_finite())
    }

    pub fn contains(&self, point: MapPoint) -> bool {
        self.to_geo().contains(&Point::new(point.x, point.y))
    }

    /// Planar area in squared map units.
    pub fn area(&self) -> f64 {
        self.to_geo().unsigned_area()
    }

    pub fn to_geo(&self) -> MultiPolygon<f64> {
        let rings: Vec<LineString<f64>> = self
            .rings
            .iter()
            .filter(|r| distinct_vertices(r) >= 3)
            .map(|r| LineString::from(r.iter().map(|p| (p.x, p.y)).collect::<Vec<_>>()))
            .collect();
        classify_rings(rings)
    }

    pub fn from_geo(multi: &MultiPolygon<f64>) -> Self {
        let mut rings = Vec::new();
        for part in multi {
            rings.push(ring_points(part.exterior()));
            rings.extend(part.interiors().iter().map(ring_points));
        }
        Self { rings }
    }

    pub fn from_geo_polygon(part: &geo::Polygon<f64>) -> Self {
        Self::from_geo(&MultiPolygon::new(vec![part.clone()]))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Polyline {
    pub vertices: Vec<MapPoint>,
}

impl Polyline {
    pub fn new(vertices: Vec<MapPoint>) -> Self {
        Self { vertices }
    }

    pub fn segments(&self) -> impl Iterator<Item = (MapPoint, MapPoint)> + '_ {
        self.vertices.windows(2).map(|w| (w[0], w[1]))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Polygon(Polygon),
    Line(Polyline),
    Point(MapPoint),
}

impl Geometry {
    pub fn kind(&self) -> GeometryKind {
        match self {
            Geometry::Polygon(_) => GeometryKind::Polygon,
            Geometry::Line(_) => GeometryKind::Line,
            Geometry::Point(_) => GeometryKind::Point,
        }
    }

    pub fn as_polygon(&self) -> Option<&Polygon> {
        match self {
            Geometry::Polygon(p) => Some(p),
            _ => None,
        }
    }
}

fn distinct_vertices(ring: &[MapPoint]) -> usize {
    let mut count = 0;
    for (i, p) in ring.iter().enumerate() {
        if !ring[..i].contains(p) {
            count += 1;
        }
    }
    count
}

fn ring_points(ring: &LineString<f64>) -> Vec<MapPoint> {
    ring.coords().map(|c| MapPoint::new(c.x, c.y)).collect()
}

fn interior_sample(ring: &LineString<f64>) -> Option<Point<f64>> {
    ring.coords().next().map(|c: &Coord<f64>| Point::from(*c))
}

/// Even nesting depth makes a shell, odd depth a hole of the smallest shell
/// around it. A hole with no enclosing shell is promoted to a shell.
fn classify_rings(rings: Vec<LineString<f64>>) -> MultiPolygon<f64> {
    let filled: Vec<geo::Polygon<f64>> = rings
        .iter()
        .map(|r| geo::Polygon::new(r.clone(), vec![]))
        .collect();

    let depth: Vec<usize> = rings
        .iter()
        .enumerate()
        .map(|(i, ring)| {
            let Some(p) = interior_sample(ring) else { return 0 };
            filled
                .iter()
                .enumerate()
                .filter(|(j, other)| *j != i && other.contains(&p))
                .count()
        })
        .collect();

    let mut shells: Vec<(usize, Vec<LineString<f64>>)> = Vec::new();
    let mut holes = Vec::new();
    for (i, d) in depth.iter().enumerate() {
        if d % 2 == 0 {
            shells.push((i, Vec::new()));
        } else {
            holes.push(i);
        }
    }

    for hole in holes {
        let Some(p) = interior_sample(&rings[hole]) else { continue };
        let parent = shells
            .iter()
            .enumerate()
            .filter(|(_, (s, _))| filled[*s].contains(&p))
            .min_by(|(_, (a, _)), (_, (b, _))| {
                filled[*a]
                    .unsigned_area()
                    .total_cmp(&filled[*b].unsigned_area())
            })
            .map(|(k, _)| k);
        match parent {
            Some(k) => shells[k].1.push(rings[hole].clone()),
            None => shells.push((hole, Vec::new())),
        }
    }

    MultiPolygon::new(
        shells
            .into_iter()
            .map(|(s, interiors)| geo::Polygon::new(rings[s].clone(), interiors))
            .collect(),
    )
}
