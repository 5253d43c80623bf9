use foundation::crs::{Crs, point_to_geographic};
use foundation::math::precision::stable_total_cmp_f64;
use geo::{Area, BooleanOps, Contains, Coord, Distance, Geodesic, LineString, MultiPolygon, Point};
use tracing::debug;

use crate::components::{Polygon, Polyline};
use crate::ops::{GeometryOpError, GeometryOps};

/// Positions along a path closer than this are the same position.
const AT_EPS: f64 = 1e-9;

/// Geometry engine backed by the `geo` crate.
///
/// Cutting walks the line across each polygon part, turns every stretch of
/// line that runs through the interior into a chord, and splits the shell
/// along each chord in line order. Holes are subtracted from the pieces
/// afterwards.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlanarOps;

impl GeometryOps for PlanarOps {
    fn cut(&self, polygon: &Polygon, line: &Polyline) -> Result<Vec<Polygon>, GeometryOpError> {
        let mut path: Vec<Coord<f64>> = Vec::with_capacity(line.vertices.len());
        for v in &line.vertices {
            if !v.x.is_finite() || !v.y.is_finite() {
                return Err(GeometryOpError::Degenerate(
                    "cut line has a non-finite vertex".into(),
                ));
            }
            let c = Coord { x: v.x, y: v.y };
            if path.last() != Some(&c) {
                path.push(c);
            }
        }
        if path.len() < 2 {
            return Err(GeometryOpError::Degenerate(
                "cut line needs two distinct vertices".into(),
            ));
        }

        let shape = finite_shape(polygon)?;
        if shape.0.is_empty() {
            return Err(GeometryOpError::Degenerate("polygon has no area".into()));
        }

        let mut pieces = Vec::new();
        let mut was_cut = false;
        for part in &shape {
            match cut_part(part, &path) {
                Some(parts) => {
                    was_cut = true;
                    pieces.extend(parts);
                }
                None => pieces.push(part.clone()),
            }
        }

        if !was_cut {
            return Ok(vec![polygon.clone()]);
        }
        Ok(pieces.iter().map(Polygon::from_geo_polygon).collect())
    }

    fn union(&self, a: &Polygon, b: &Polygon) -> Result<Option<Polygon>, GeometryOpError> {
        let merged = finite_shape(a)?.union(&finite_shape(b)?);
        if merged.0.is_empty() || merged.unsigned_area() <= 0.0 {
            return Ok(None);
        }
        Ok(Some(Polygon::from_geo(&merged)))
    }

    fn geodesic_length(&self, line: &Polyline, crs: Crs) -> Result<f64, GeometryOpError> {
        if line.vertices.len() < 2 {
            return Err(GeometryOpError::Degenerate(
                "length needs at least two vertices".into(),
            ));
        }
        let mut total = 0.0;
        for (a, b) in line.segments() {
            let a = point_to_geographic(a, crs)?;
            let b = point_to_geographic(b, crs)?;
            if ![a.x, a.y, b.x, b.y].iter().all(|v| v.is_finite()) {
                return Err(GeometryOpError::Degenerate(
                    "segment has a non-finite vertex".into(),
                ));
            }
            total += Geodesic.distance(Point::new(a.x, a.y), Point::new(b.x, b.y));
        }
        Ok(total)
    }
}

#[derive(Debug, Clone, Copy)]
struct Crossing {
    /// Segment index plus fraction along that segment.
    at: f64,
    point: Coord<f64>,
}

fn cut_part(part: &geo::Polygon<f64>, line: &[Coord<f64>]) -> Option<Vec<geo::Polygon<f64>>> {
    let shell = open_ring(part.exterior());
    if shell.len() < 3 {
        return None;
    }
    let tol = tolerance(&shell, line);

    let chords = chords(&shell, line, tol);
    if chords.is_empty() {
        return None;
    }

    let mut rings = vec![shell];
    for chord in &chords {
        let Some(idx) = rings.iter().position(|r| chord_inside(r, chord, tol)) else {
            debug!("chord left no piece to split, skipped");
            continue;
        };
        let Some((first, second)) = split_ring(&rings[idx], chord, tol) else {
            continue;
        };
        rings[idx] = first;
        rings.push(second);
    }
    if rings.len() < 2 {
        return None;
    }

    let holes = MultiPolygon::new(
        part.interiors()
            .iter()
            .map(|h| geo::Polygon::new(h.clone(), vec![]))
            .collect(),
    );
    let mut out = Vec::new();
    for ring in rings {
        let piece = geo::Polygon::new(LineString::from(ring), vec![]);
        if holes.0.is_empty() {
            out.push(piece);
        } else {
            out.extend(piece.difference(&holes));
        }
    }
    Some(out)
}

fn chords(ring: &[Coord<f64>], line: &[Coord<f64>], tol: f64) -> Vec<Vec<Coord<f64>>> {
    let crossings = crossings(ring, line, tol);
    crossings
        .windows(2)
        .map(|w| chord_path(line, w[0], w[1]))
        .filter(|path| chord_inside(ring, path, tol))
        .collect()
}

fn crossings(ring: &[Coord<f64>], line: &[Coord<f64>], tol: f64) -> Vec<Crossing> {
    let n = ring.len();
    let mut out = Vec::new();
    for (k, seg) in line.windows(2).enumerate() {
        for i in 0..n {
            if let Some(t) = intersect(seg[0], seg[1], ring[i], ring[(i + 1) % n]) {
                out.push(Crossing {
                    at: k as f64 + t,
                    point: lerp(seg[0], seg[1], t),
                });
            }
        }
    }
    out.sort_by(|a, b| stable_total_cmp_f64(a.at, b.at));
    // Vertex hits are reported once per adjacent edge.
    out.dedup_by(|next, prev| dist(next.point, prev.point) <= tol);
    out
}

fn chord_path(line: &[Coord<f64>], from: Crossing, to: Crossing) -> Vec<Coord<f64>> {
    let mut path = vec![from.point];
    let first = from.at.floor() as usize + 1;
    for (j, v) in line.iter().enumerate().skip(first) {
        if j as f64 >= to.at - AT_EPS {
            break;
        }
        path.push(*v);
    }
    path.push(to.point);
    path
}

fn chord_inside(ring: &[Coord<f64>], chord: &[Coord<f64>], tol: f64) -> bool {
    let (Some(a), Some(b)) = (chord.first(), chord.last()) else {
        return false;
    };
    if locate(ring, *a, tol).is_none() || locate(ring, *b, tol).is_none() {
        return false;
    }
    let Some(midpoint) = longest_segment_midpoint(chord) else {
        return false;
    };
    geo::Polygon::new(LineString::from(ring.to_vec()), vec![]).contains(&Point::from(midpoint))
}

fn split_ring(
    ring: &[Coord<f64>],
    chord: &[Coord<f64>],
    tol: f64,
) -> Option<(Vec<Coord<f64>>, Vec<Coord<f64>>)> {
    let a = *chord.first()?;
    let b = *chord.last()?;
    let pa = locate(ring, a, tol)?;
    let pb = locate(ring, b, tol)?;
    if (pa - pb).abs() < AT_EPS {
        return None;
    }
    let inner = &chord[1..chord.len() - 1];

    let mut first = vec![a];
    first.extend(between(ring, pa, pb));
    first.push(b);
    first.extend(inner.iter().rev());

    let mut second = vec![b];
    second.extend(between(ring, pb, pa));
    second.push(a);
    second.extend(inner.iter());

    let has_area = |r: &Vec<Coord<f64>>| {
        r.len() >= 3 && geo::Polygon::new(LineString::from(r.clone()), vec![]).unsigned_area() > 0.0
    };
    (has_area(&first) && has_area(&second)).then_some((first, second))
}

/// Ring vertices strictly after `from` and strictly before `to`, walking
/// forward and wrapping around.
fn between(ring: &[Coord<f64>], from: f64, to: f64) -> Vec<Coord<f64>> {
    let n = ring.len() as f64;
    let span = if to > from { to - from } else { to + n - from };
    let mut out = Vec::new();
    let mut j = from.floor() + 1.0;
    while j - from < span - AT_EPS {
        out.push(ring[(j as usize) % ring.len()]);
        j += 1.0;
    }
    out
}

/// Position of `p` on the ring boundary as edge index plus fraction.
fn locate(ring: &[Coord<f64>], p: Coord<f64>, tol: f64) -> Option<f64> {
    let n = ring.len();
    let mut best: Option<(f64, f64)> = None;
    for i in 0..n {
        let a = ring[i];
        let b = ring[(i + 1) % n];
        let d = Coord {
            x: b.x - a.x,
            y: b.y - a.y,
        };
        let len2 = d.x * d.x + d.y * d.y;
        let u = if len2 == 0.0 {
            0.0
        } else {
            (((p.x - a.x) * d.x + (p.y - a.y) * d.y) / len2).clamp(0.0, 1.0)
        };
        let gap = dist(p, lerp(a, b, u));
        if best.is_none_or(|(g, _)| gap < g) {
            best = Some((gap, i as f64 + u));
        }
    }
    let (gap, mut pos) = best?;
    if gap > tol {
        return None;
    }
    let nearest = pos.round();
    if (pos - nearest).abs() < AT_EPS {
        pos = nearest;
    }
    if pos >= n as f64 {
        pos -= n as f64;
    }
    Some(pos)
}

/// Fraction along `p..q` where it meets `a..b`, or `None` for parallel or
/// disjoint segments.
fn intersect(p: Coord<f64>, q: Coord<f64>, a: Coord<f64>, b: Coord<f64>) -> Option<f64> {
    const SLACK: f64 = 1e-12;
    let r = Coord {
        x: q.x - p.x,
        y: q.y - p.y,
    };
    let s = Coord {
        x: b.x - a.x,
        y: b.y - a.y,
    };
    let denom = cross(r, s);
    if denom.abs() <= f64::EPSILON * r.x.hypot(r.y) * s.x.hypot(s.y) {
        return None;
    }
    let ap = Coord {
        x: a.x - p.x,
        y: a.y - p.y,
    };
    let t = cross(ap, s) / denom;
    let u = cross(ap, r) / denom;
    let range = -SLACK..=1.0 + SLACK;
    (range.contains(&t) && range.contains(&u)).then(|| t.clamp(0.0, 1.0))
}

fn open_ring(ring: &LineString<f64>) -> Vec<Coord<f64>> {
    let mut coords: Vec<Coord<f64>> = ring.coords().copied().collect();
    if coords.len() > 1 && coords.first() == coords.last() {
        coords.pop();
    }
    coords
}

fn tolerance(ring: &[Coord<f64>], line: &[Coord<f64>]) -> f64 {
    let scale = ring
        .iter()
        .chain(line)
        .map(|c| c.x.abs().max(c.y.abs()))
        .fold(1.0, f64::max);
    scale * 1e-9
}

/// The boolean-op backend cannot handle NaN or infinite coordinates.
fn finite_shape(polygon: &Polygon) -> Result<MultiPolygon<f64>, GeometryOpError> {
    if !polygon.is_finite() {
        return Err(GeometryOpError::Degenerate(
            "polygon has a non-finite vertex".into(),
        ));
    }
    Ok(polygon.to_geo())
}

fn longest_segment_midpoint(path: &[Coord<f64>]) -> Option<Coord<f64>> {
    path.windows(2)
        .max_by(|a, b| stable_total_cmp_f64(dist(a[0], a[1]), dist(b[0], b[1])))
        .map(|w| lerp(w[0], w[1], 0.5))
}

fn cross(a: Coord<f64>, b: Coord<f64>) -> f64 {
    a.x * b.y - a.y * b.x
}

fn lerp(a: Coord<f64>, b: Coord<f64>, t: f64) -> Coord<f64> {
    Coord {
        x: a.x + (b.x - a.x) * t,
        y: a.y + (b.y - a.y) * t,
    }
}

fn dist(a: Coord<f64>, b: Coord<f64>) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}

#[cfg(test)]
mod tests {
    use super::PlanarOps;
    use crate::components::{Polygon, Polyline};
    use crate::ops::{GeometryOpError, GeometryOps};
    use foundation::crs::Crs;
    use foundation::math::MapPoint;
    use foundation::math::mercator::geographic_to_mercator;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<MapPoint> {
        vec![
            MapPoint::new(x0, y0),
            MapPoint::new(x1, y0),
            MapPoint::new(x1, y1),
            MapPoint::new(x0, y1),
            MapPoint::new(x0, y0),
        ]
    }

    fn line(points: &[(f64, f64)]) -> Polyline {
        Polyline::new(points.iter().map(|&(x, y)| MapPoint::new(x, y)).collect())
    }

    fn total_area(pieces: &[Polygon]) -> f64 {
        pieces.iter().map(Polygon::area).sum()
    }

    #[test]
    fn straight_line_halves_square() {
        let square = Polygon::new(vec![rect(0.0, 0.0, 10.0, 10.0)]);
        let pieces = PlanarOps
            .cut(&square, &line(&[(5.0, -1.0), (5.0, 11.0)]))
            .unwrap();
        assert_eq!(pieces.len(), 2);
        for piece in &pieces {
            assert!((piece.area() - 50.0).abs() < 1e-9);
        }
    }

    #[test]
    fn bent_line_cuts_along_its_vertices() {
        let square = Polygon::new(vec![rect(0.0, 0.0, 10.0, 10.0)]);
        let pieces = PlanarOps
            .cut(&square, &line(&[(-1.0, 5.0), (5.0, 5.0), (5.0, 11.0)]))
            .unwrap();
        assert_eq!(pieces.len(), 2);
        let mut areas: Vec<f64> = pieces.iter().map(Polygon::area).collect();
        areas.sort_by(f64::total_cmp);
        assert!((areas[0] - 25.0).abs() < 1e-9);
        assert!((areas[1] - 75.0).abs() < 1e-9);
    }

    #[test]
    fn line_crossing_both_arms_of_a_u_yields_three_pieces() {
        let u = Polygon::from_exterior(vec![
            MapPoint::new(0.0, 0.0),
            MapPoint::new(30.0, 0.0),
            MapPoint::new(30.0, 20.0),
            MapPoint::new(20.0, 20.0),
            MapPoint::new(20.0, 10.0),
            MapPoint::new(10.0, 10.0),
            MapPoint::new(10.0, 20.0),
            MapPoint::new(0.0, 20.0),
        ]);
        let pieces = PlanarOps
            .cut(&u, &line(&[(-5.0, 15.0), (35.0, 15.0)]))
            .unwrap();
        assert_eq!(pieces.len(), 3);
        assert!((total_area(&pieces) - 500.0).abs() < 1e-9);
    }

    #[test]
    fn holes_are_carried_into_pieces() {
        let holed = Polygon::new(vec![rect(0.0, 0.0, 10.0, 10.0), rect(4.0, 4.0, 6.0, 6.0)]);
        let pieces = PlanarOps
            .cut(&holed, &line(&[(5.0, -1.0), (5.0, 11.0)]))
            .unwrap();
        assert_eq!(pieces.len(), 2);
        for piece in &pieces {
            assert!((piece.area() - 48.0).abs() < 1e-6);
        }
    }

    #[test]
    fn line_that_misses_or_stops_inside_returns_original() {
        let square = Polygon::new(vec![rect(0.0, 0.0, 10.0, 10.0)]);
        let outside = PlanarOps
            .cut(&square, &line(&[(20.0, 0.0), (20.0, 10.0)]))
            .unwrap();
        assert_eq!(outside, vec![square.clone()]);

        let dangling = PlanarOps
            .cut(&square, &line(&[(5.0, -1.0), (5.0, 5.0)]))
            .unwrap();
        assert_eq!(dangling.len(), 1);
    }

    #[test]
    fn degenerate_cut_line_is_an_error() {
        let square = Polygon::new(vec![rect(0.0, 0.0, 10.0, 10.0)]);
        let err = PlanarOps
            .cut(&square, &line(&[(1.0, 1.0), (1.0, 1.0)]))
            .unwrap_err();
        assert!(matches!(err, GeometryOpError::Degenerate(_)));
        assert!(
            PlanarOps
                .cut(&square, &line(&[(0.0, f64::NAN), (1.0, 1.0)]))
                .is_err()
        );
    }

    #[test]
    fn union_of_overlapping_squares() {
        let a = Polygon::new(vec![rect(0.0, 0.0, 10.0, 10.0)]);
        let b = Polygon::new(vec![rect(5.0, 5.0, 15.0, 15.0)]);
        let merged = PlanarOps.union(&a, &b).unwrap().unwrap();
        assert!((merged.area() - 175.0).abs() < 1e-9);
    }

    #[test]
    fn union_of_disjoint_squares_keeps_both_parts() {
        let a = Polygon::new(vec![rect(0.0, 0.0, 1.0, 1.0)]);
        let b = Polygon::new(vec![rect(5.0, 5.0, 6.0, 6.0)]);
        let merged = PlanarOps.union(&a, &b).unwrap().unwrap();
        assert_eq!(merged.rings.len(), 2);
        assert!((merged.area() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn union_of_empty_polygons_is_none() {
        let empty = Polygon::new(vec![]);
        assert_eq!(PlanarOps.union(&empty, &empty).unwrap(), None);
    }

    #[test]
    fn non_finite_polygon_vertices_are_rejected() {
        let square = Polygon::new(vec![rect(0.0, 0.0, 10.0, 10.0)]);
        let broken = Polygon::from_exterior(vec![
            MapPoint::new(5.0, 5.0),
            MapPoint::new(f64::NAN, 5.0),
            MapPoint::new(15.0, 15.0),
            MapPoint::new(5.0, 15.0),
        ]);
        assert!(matches!(
            PlanarOps.union(&square, &broken),
            Err(GeometryOpError::Degenerate(_))
        ));
        assert!(matches!(
            PlanarOps.union(&broken, &square),
            Err(GeometryOpError::Degenerate(_))
        ));
        assert!(matches!(
            PlanarOps.cut(&broken, &line(&[(10.0, 0.0), (10.0, 20.0)])),
            Err(GeometryOpError::Degenerate(_))
        ));

        let infinite = Polygon::new(vec![rect(0.0, 0.0, f64::INFINITY, 10.0)]);
        assert!(PlanarOps.union(&square, &infinite).is_err());
    }

    #[test]
    fn geodesic_length_matches_across_crs() {
        let degree = PlanarOps
            .geodesic_length(&line(&[(0.0, 0.0), (1.0, 0.0)]), Crs::Wgs84)
            .unwrap();
        assert!((degree - 111_319.49).abs() < 1.0, "{degree}");

        let a = geographic_to_mercator(MapPoint::new(0.0, 0.0));
        let b = geographic_to_mercator(MapPoint::new(1.0, 0.0));
        let projected = PlanarOps
            .geodesic_length(&Polyline::new(vec![a, b]), Crs::WebMercator)
            .unwrap();
        assert!((projected - degree).abs() < 1e-6);
    }

    #[test]
    fn geodesic_length_rejects_unknown_crs() {
        let err = PlanarOps
            .geodesic_length(&line(&[(0.0, 0.0), (1.0, 0.0)]), Crs::Other(32648))
            .unwrap_err();
        assert!(matches!(err, GeometryOpError::Crs(_)));
    }
}
