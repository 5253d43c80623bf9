use foundation::bounds::Aabb2;
use geojson::{Feature, Geometry, Position, Value};

/// Bounds of every coordinate in the geometry tree.
///
/// Empty coordinate arrays (and positions with fewer than two ordinates)
/// contribute nothing. Returns `None` when no coordinate was found anywhere.
pub fn bounding_box_of(geometry: &Geometry) -> Option<Aabb2> {
    let mut acc = Aabb2::empty();
    accumulate(&geometry.value, &mut acc);
    acc.non_empty()
}

/// Bounds over all feature geometries; features without geometry are skipped.
pub fn bounding_box_of_features(features: &[Feature]) -> Option<Aabb2> {
    let mut acc = Aabb2::empty();
    for geometry in features.iter().filter_map(|f| f.geometry.as_ref()) {
        accumulate(&geometry.value, &mut acc);
    }
    acc.non_empty()
}

fn accumulate(value: &Value, acc: &mut Aabb2) {
    match value {
        Value::Point(position) => extend(acc, position),
        Value::MultiPoint(positions) | Value::LineString(positions) => {
            positions.iter().for_each(|p| extend(acc, p));
        }
        Value::MultiLineString(lines) | Value::Polygon(lines) => {
            lines.iter().flatten().for_each(|p| extend(acc, p));
        }
        Value::MultiPolygon(polygons) => {
            polygons
                .iter()
                .flatten()
                .flatten()
                .for_each(|p| extend(acc, p));
        }
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                accumulate(&g.value, acc);
            }
        }
    }
}

fn extend(acc: &mut Aabb2, position: &Position) {
    if let [x, y, ..] = position.as_slice() {
        acc.extend(*x, *y);
    }
}

#[cfg(test)]
mod tests {
    use super::{bounding_box_of, bounding_box_of_features};
    use foundation::bounds::Aabb2;
    use geojson::{Feature, Geometry, Value};

    fn feature(geometry: Option<Value>) -> Feature {
        Feature {
            bbox: None,
            geometry: geometry.map(Geometry::new),
            id: None,
            properties: None,
            foreign_members: None,
        }
    }

    #[test]
    fn collection_ignores_empty_polygon() {
        let g = Geometry::new(Value::GeometryCollection(vec![
            Geometry::new(Value::Point(vec![1.0, 1.0])),
            Geometry::new(Value::LineString(vec![vec![0.0, 0.0], vec![2.0, 2.0]])),
            Geometry::new(Value::Polygon(vec![])),
        ]));
        assert_eq!(
            bounding_box_of(&g),
            Some(Aabb2::new([0.0, 0.0], [2.0, 2.0]))
        );
    }

    #[test]
    fn nothing_found_is_none() {
        let g = Geometry::new(Value::GeometryCollection(vec![
            Geometry::new(Value::Polygon(vec![vec![]])),
            Geometry::new(Value::Point(vec![])),
            Geometry::new(Value::MultiPolygon(vec![vec![]])),
        ]));
        assert_eq!(bounding_box_of(&g), None);
    }

    #[test]
    fn nested_multipolygon_and_3d_positions() {
        let g = Geometry::new(Value::MultiPolygon(vec![
            vec![vec![
                vec![105.0, 20.0, 5.0],
                vec![106.0, 20.0, 5.0],
                vec![106.0, 21.0, 5.0],
                vec![105.0, 20.0, 5.0],
            ]],
            vec![vec![vec![104.5, 22.5], vec![104.6, 22.6], vec![104.5, 22.5]]],
        ]));
        assert_eq!(
            bounding_box_of(&g),
            Some(Aabb2::new([104.5, 20.0], [106.0, 22.6]))
        );
    }

    #[test]
    fn features_without_geometry_are_skipped() {
        let features = vec![
            feature(None),
            feature(Some(Value::MultiLineString(vec![vec![
                vec![3.0, -1.0],
                vec![4.0, 1.0],
            ]]))),
        ];
        assert_eq!(
            bounding_box_of_features(&features),
            Some(Aabb2::new([3.0, -1.0], [4.0, 1.0]))
        );
        assert_eq!(bounding_box_of_features(&[]), None);
    }
}
