use std::collections::BTreeMap;

use foundation::crs::Crs;
use foundation::math::MapPoint;
use tracing::{debug, info};

use crate::components::{Geometry, Polygon, Polyline, Symbol};
use crate::entity::GraphicId;
use crate::graphics::GraphicsLayer;
use crate::labels::edge_length_labels;
use crate::ops::{GeometryOpError, GeometryOps};
use crate::picking;
use crate::planar::PlanarOps;
use crate::selection::SelectionSet;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EditOperation {
    Split,
    Merge,
}

impl std::fmt::Display for EditOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EditOperation::Split => "split",
            EditOperation::Merge => "merge",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditError {
    WrongSelection {
        operation: EditOperation,
        selected: usize,
    },
    NotAPolygon(GraphicId),
    /// The cut line did not traverse the polygon.
    NotSplit { pieces: usize },
    EmptyUnion,
    Geometry(GeometryOpError),
}

impl std::fmt::Display for EditError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EditError::WrongSelection {
                operation: EditOperation::Merge,
                selected,
            } => write!(f, "merge needs at least two selected polygons, {selected} selected"),
            EditError::WrongSelection {
                operation,
                selected,
            } => write!(
                f,
                "{operation} needs exactly one selected polygon, {selected} selected"
            ),
            EditError::NotAPolygon(id) => write!(f, "{id} is not a polygon"),
            EditError::NotSplit { pieces } => {
                write!(f, "cut line produced {pieces} piece(s), polygon left intact")
            }
            EditError::EmptyUnion => f.write_str("union of the selected polygons is empty"),
            EditError::Geometry(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for EditError {}

impl From<GeometryOpError> for EditError {
    fn from(value: GeometryOpError) -> Self {
        EditError::Geometry(value)
    }
}

/// Polygon editing state: the graphics layer, the ordered selection and the
/// edge labels each polygon owns.
///
/// Every operation either completes or leaves all three untouched.
#[derive(Debug)]
pub struct PolygonEditor<O = PlanarOps> {
    ops: O,
    crs: Crs,
    layer: GraphicsLayer,
    selection: SelectionSet,
    labels: BTreeMap<GraphicId, Vec<GraphicId>>,
}

impl PolygonEditor<PlanarOps> {
    pub fn planar(crs: Crs) -> Self {
        Self::new(PlanarOps, crs)
    }
}

impl<O: GeometryOps> PolygonEditor<O> {
    /// `crs` is the CRS polygon coordinates are expressed in.
    pub fn new(ops: O, crs: Crs) -> Self {
        Self {
            ops,
            crs,
            layer: GraphicsLayer::new(),
            selection: SelectionSet::new(),
            labels: BTreeMap::new(),
        }
    }

    pub fn crs(&self) -> Crs {
        self.crs
    }

    pub fn ops(&self) -> &O {
        &self.ops
    }

    pub fn layer(&self) -> &GraphicsLayer {
        &self.layer
    }

    /// Adds an unselected polygon together with its edge length labels.
    pub fn create_polygon(&mut self, polygon: Polygon) -> GraphicId {
        let labels = edge_length_labels(&self.ops, &polygon, self.crs);
        let id = self.layer.add(Geometry::Polygon(polygon), Symbol::Polygon);
        let owned = labels
            .into_iter()
            .map(|l| self.layer.add(Geometry::Point(l.anchor), Symbol::Label(l.text)))
            .collect();
        self.labels.insert(id, owned);
        id
    }

    pub fn graphic_at(&self, point: MapPoint) -> Option<GraphicId> {
        picking::graphic_at(&self.layer, point)
    }

    /// Flips membership of `id`. Returns whether it is selected afterwards.
    ///
    /// Ids that are not polygons in the layer are ignored.
    pub fn toggle_selection(&mut self, id: GraphicId) -> bool {
        if self.polygon(id).is_err() {
            debug!(%id, "toggle ignored for unknown graphic");
            return false;
        }
        if self.selection.remove(id) {
            self.layer.set_symbol(id, Symbol::Polygon);
            false
        } else {
            self.selection.insert(id);
            self.layer.set_symbol(id, Symbol::SelectedPolygon);
            true
        }
    }

    /// Cuts the single selected polygon with `line`.
    ///
    /// On success the original is gone, the selection is empty and each piece
    /// is a new unselected polygon.
    pub fn split(&mut self, line: &Polyline) -> Result<Vec<GraphicId>, EditError> {
        let Some(id) = self.selection.only() else {
            return Err(EditError::WrongSelection {
                operation: EditOperation::Split,
                selected: self.selection.len(),
            });
        };
        let pieces = self.ops.cut(self.polygon(id)?, line)?;
        if pieces.len() < 2 {
            return Err(EditError::NotSplit {
                pieces: pieces.len(),
            });
        }

        self.remove_polygon(id);
        self.selection.clear();
        let created: Vec<GraphicId> = pieces.into_iter().map(|p| self.create_polygon(p)).collect();
        info!(source = %id, pieces = created.len(), "polygon split");
        Ok(created)
    }

    /// Unions the selected polygons, folding left in selection order.
    pub fn merge(&mut self) -> Result<GraphicId, EditError> {
        let ids = self.selection.to_vec();
        if ids.len() < 2 {
            return Err(EditError::WrongSelection {
                operation: EditOperation::Merge,
                selected: ids.len(),
            });
        }

        let mut merged = self.polygon(ids[0])?.clone();
        for id in &ids[1..] {
            merged = self
                .ops
                .union(&merged, self.polygon(*id)?)?
                .ok_or(EditError::EmptyUnion)?;
        }

        for id in &ids {
            self.remove_polygon(*id);
        }
        self.selection.clear();
        let created = self.create_polygon(merged);
        info!(sources = ids.len(), merged = %created, "polygons merged");
        Ok(created)
    }

    /// Replaces the geometry of an existing polygon and relabels its edges.
    pub fn update_polygon(&mut self, id: GraphicId, polygon: Polygon) -> Result<(), EditError> {
        self.polygon(id)?;
        let labels = edge_length_labels(&self.ops, &polygon, self.crs);
        self.layer.set_geometry(id, Geometry::Polygon(polygon));
        self.remove_labels(id);
        let owned = labels
            .into_iter()
            .map(|l| self.layer.add(Geometry::Point(l.anchor), Symbol::Label(l.text)))
            .collect();
        self.labels.insert(id, owned);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.layer.clear();
        self.selection.clear();
        self.labels.clear();
    }

    pub fn polygon_count(&self) -> usize {
        self.layer.polygon_count()
    }

    pub fn selected_count(&self) -> usize {
        self.selection.len()
    }

    pub fn selected_graphics(&self) -> Vec<GraphicId> {
        self.selection.to_vec()
    }

    pub fn is_selected(&self, id: GraphicId) -> bool {
        self.selection.contains(id)
    }

    pub fn labels_of(&self, id: GraphicId) -> &[GraphicId] {
        self.labels.get(&id).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn polygons(&self) -> impl Iterator<Item = (GraphicId, &Polygon)> {
        self.layer
            .iter()
            .filter_map(|g| g.geometry.as_polygon().map(|p| (g.id, p)))
    }

    pub fn polygon(&self, id: GraphicId) -> Result<&Polygon, EditError> {
        self.layer
            .get(id)
            .and_then(|g| g.geometry.as_polygon())
            .ok_or(EditError::NotAPolygon(id))
    }

    fn remove_polygon(&mut self, id: GraphicId) {
        self.layer.remove(id);
        self.selection.remove(id);
        self.remove_labels(id);
    }

    fn remove_labels(&mut self, id: GraphicId) {
        for label in self.labels.remove(&id).unwrap_or_default() {
            self.layer.remove(label);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::{EditError, EditOperation, PolygonEditor};
    use crate::components::{Polygon, Polyline, Symbol};
    use crate::ops::{GeometryOpError, GeometryOps};
    use crate::planar::PlanarOps;
    use foundation::crs::Crs;
    use foundation::math::MapPoint;
    use pretty_assertions::assert_eq;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon {
        Polygon::from_exterior(vec![
            MapPoint::new(x0, y0),
            MapPoint::new(x1, y0),
            MapPoint::new(x1, y1),
            MapPoint::new(x0, y1),
        ])
    }

    fn vertical_cut(x: f64) -> Polyline {
        Polyline::new(vec![MapPoint::new(x, -100.0), MapPoint::new(x, 100.0)])
    }

    /// Scripted engine that records the order union was called in.
    #[derive(Default)]
    struct Scripted {
        pieces: usize,
        fail: bool,
        unions: RefCell<Vec<f64>>,
    }

    impl GeometryOps for Scripted {
        fn cut(&self, polygon: &Polygon, _: &Polyline) -> Result<Vec<Polygon>, GeometryOpError> {
            if self.fail {
                return Err(GeometryOpError::Engine("cut failed".into()));
            }
            Ok(vec![polygon.clone(); self.pieces])
        }

        fn union(&self, a: &Polygon, b: &Polygon) -> Result<Option<Polygon>, GeometryOpError> {
            if self.fail {
                return Err(GeometryOpError::Engine("union failed".into()));
            }
            self.unions.borrow_mut().push(b.rings[0][0].x);
            Ok(Some(a.clone()))
        }

        fn geodesic_length(&self, _: &Polyline, _: Crs) -> Result<f64, GeometryOpError> {
            Ok(1.0)
        }
    }

    #[test]
    fn toggle_twice_restores_selection_and_symbol() {
        let mut editor = PolygonEditor::planar(Crs::WebMercator);
        let id = editor.create_polygon(rect(0.0, 0.0, 10.0, 10.0));
        let before = editor.selected_graphics();

        assert!(editor.toggle_selection(id));
        assert_eq!(editor.layer().get(id).unwrap().symbol, Symbol::SelectedPolygon);
        assert!(!editor.toggle_selection(id));

        assert_eq!(editor.selected_graphics(), before);
        assert_eq!(editor.layer().get(id).unwrap().symbol, Symbol::Polygon);
    }

    #[test]
    fn toggle_ignores_labels_and_unknown_ids() {
        let mut editor = PolygonEditor::planar(Crs::WebMercator);
        let id = editor.create_polygon(rect(0.0, 0.0, 10.0, 10.0));
        let label = editor.labels_of(id)[0];
        assert!(!editor.toggle_selection(label));
        assert_eq!(editor.selected_count(), 0);
    }

    #[test]
    fn polygon_creation_adds_one_label_per_edge() {
        let mut editor = PolygonEditor::new(Scripted::default(), Crs::WebMercator);
        let id = editor.create_polygon(rect(0.0, 0.0, 10.0, 10.0));
        assert_eq!(editor.labels_of(id).len(), 4);
        assert_eq!(editor.layer().len(), 5);
        assert_eq!(editor.polygon_count(), 1);
        let label = editor.layer().get(editor.labels_of(id)[0]).unwrap();
        assert_eq!(label.symbol, Symbol::Label("1.0 m".into()));
    }

    #[test]
    fn split_requires_exactly_one_selected() {
        let mut editor = PolygonEditor::planar(Crs::WebMercator);
        let a = editor.create_polygon(rect(0.0, 0.0, 10.0, 10.0));
        let b = editor.create_polygon(rect(20.0, 0.0, 30.0, 10.0));

        let err = editor.split(&vertical_cut(5.0)).unwrap_err();
        assert_eq!(
            err,
            EditError::WrongSelection {
                operation: EditOperation::Split,
                selected: 0
            }
        );

        editor.toggle_selection(a);
        editor.toggle_selection(b);
        let graphics = editor.layer().len();
        assert!(editor.split(&vertical_cut(5.0)).is_err());
        assert_eq!(editor.layer().len(), graphics);
        assert_eq!(editor.selected_graphics(), vec![a, b]);
    }

    #[test]
    fn split_into_one_piece_changes_nothing() {
        let mut editor = PolygonEditor::new(
            Scripted {
                pieces: 1,
                ..Default::default()
            },
            Crs::WebMercator,
        );
        let id = editor.create_polygon(rect(0.0, 0.0, 10.0, 10.0));
        editor.toggle_selection(id);
        let graphics = editor.layer().len();

        assert_eq!(
            editor.split(&vertical_cut(50.0)),
            Err(EditError::NotSplit { pieces: 1 })
        );
        assert_eq!(editor.layer().len(), graphics);
        assert_eq!(editor.selected_graphics(), vec![id]);
    }

    #[test]
    fn split_failure_in_engine_changes_nothing() {
        let mut editor = PolygonEditor::new(
            Scripted {
                fail: true,
                ..Default::default()
            },
            Crs::WebMercator,
        );
        let id = editor.create_polygon(rect(0.0, 0.0, 10.0, 10.0));
        editor.toggle_selection(id);
        assert!(matches!(
            editor.split(&vertical_cut(5.0)),
            Err(EditError::Geometry(_))
        ));
        assert!(editor.layer().contains(id));
        assert_eq!(editor.selected_count(), 1);
    }

    #[test]
    fn split_replaces_original_with_unselected_pieces() {
        let mut editor = PolygonEditor::planar(Crs::WebMercator);
        let id = editor.create_polygon(rect(0.0, 0.0, 10.0, 10.0));
        let old_labels = editor.labels_of(id).to_vec();
        editor.toggle_selection(id);

        let pieces = editor.split(&vertical_cut(5.0)).unwrap();
        assert_eq!(pieces.len(), 2);
        assert!(!editor.layer().contains(id));
        assert!(old_labels.iter().all(|l| !editor.layer().contains(*l)));
        assert_eq!(editor.selected_count(), 0);
        assert_eq!(editor.polygon_count(), 2);
        for piece in &pieces {
            assert_eq!(editor.layer().get(*piece).unwrap().symbol, Symbol::Polygon);
            assert_eq!(editor.labels_of(*piece).len(), 4);
        }
    }

    #[test]
    fn merge_requires_two_selected() {
        let mut editor = PolygonEditor::planar(Crs::WebMercator);
        let id = editor.create_polygon(rect(0.0, 0.0, 10.0, 10.0));
        assert!(editor.merge().is_err());
        editor.toggle_selection(id);
        assert_eq!(
            editor.merge(),
            Err(EditError::WrongSelection {
                operation: EditOperation::Merge,
                selected: 1
            })
        );
        assert_eq!(editor.polygon_count(), 1);
        assert_eq!(editor.selected_graphics(), vec![id]);
    }

    #[test]
    fn merge_with_non_finite_vertex_changes_nothing() {
        let mut editor = PolygonEditor::planar(Crs::Wgs84);
        let square = editor.create_polygon(rect(0.0, 0.0, 10.0, 10.0));
        let broken = editor.create_polygon(Polygon::from_exterior(vec![
            MapPoint::new(5.0, 5.0),
            MapPoint::new(f64::NAN, 5.0),
            MapPoint::new(15.0, 15.0),
            MapPoint::new(5.0, 15.0),
        ]));
        editor.toggle_selection(square);
        editor.toggle_selection(broken);
        let graphics = editor.layer().len();
        let square_labels = editor.labels_of(square).to_vec();

        assert!(matches!(
            editor.merge(),
            Err(EditError::Geometry(GeometryOpError::Degenerate(_)))
        ));
        assert_eq!(editor.layer().len(), graphics);
        assert_eq!(editor.polygon_count(), 2);
        assert_eq!(editor.selected_graphics(), vec![square, broken]);
        assert_eq!(editor.labels_of(square), square_labels.as_slice());
    }

    #[test]
    fn merge_overlapping_polygons_covers_largest_input() {
        let mut editor = PolygonEditor::planar(Crs::WebMercator);
        let inputs = [
            rect(0.0, 0.0, 10.0, 10.0),
            rect(5.0, 5.0, 20.0, 20.0),
            rect(15.0, 0.0, 25.0, 8.0),
        ];
        let largest = inputs.iter().map(Polygon::area).fold(0.0, f64::max);
        for poly in inputs {
            let id = editor.create_polygon(poly);
            editor.toggle_selection(id);
        }

        let merged = editor.merge().unwrap();
        assert_eq!(editor.polygon_count(), 1);
        assert_eq!(editor.selected_count(), 0);
        assert!(editor.polygon(merged).unwrap().area() >= largest);
    }

    #[test]
    fn merge_folds_in_selection_order() {
        let mut editor = PolygonEditor::new(Scripted::default(), Crs::WebMercator);
        let a = editor.create_polygon(rect(1.0, 0.0, 2.0, 1.0));
        let b = editor.create_polygon(rect(2.0, 0.0, 3.0, 1.0));
        let c = editor.create_polygon(rect(3.0, 0.0, 4.0, 1.0));
        for id in [c, a, b] {
            editor.toggle_selection(id);
        }
        editor.merge().unwrap();
        assert_eq!(*editor.ops().unions.borrow(), vec![1.0, 2.0]);
    }

    #[test]
    fn merge_failure_changes_nothing() {
        let mut editor = PolygonEditor::new(
            Scripted {
                fail: true,
                ..Default::default()
            },
            Crs::WebMercator,
        );
        let a = editor.create_polygon(rect(0.0, 0.0, 1.0, 1.0));
        let b = editor.create_polygon(rect(1.0, 0.0, 2.0, 1.0));
        editor.toggle_selection(a);
        editor.toggle_selection(b);
        let graphics = editor.layer().len();

        assert!(editor.merge().is_err());
        assert_eq!(editor.layer().len(), graphics);
        assert_eq!(editor.selected_graphics(), vec![a, b]);
    }

    #[test]
    fn update_polygon_relabels_edges() {
        let mut editor = PolygonEditor::new(Scripted::default(), Crs::WebMercator);
        let id = editor.create_polygon(rect(0.0, 0.0, 1.0, 1.0));
        let triangle = Polygon::from_exterior(vec![
            MapPoint::new(0.0, 0.0),
            MapPoint::new(1.0, 0.0),
            MapPoint::new(0.0, 1.0),
        ]);
        editor.update_polygon(id, triangle.clone()).unwrap();
        assert_eq!(editor.labels_of(id).len(), 3);
        assert_eq!(editor.layer().len(), 4);
        assert_eq!(editor.polygon(id).unwrap(), &triangle);
    }

    #[test]
    fn clear_removes_everything() {
        let mut editor = PolygonEditor::planar(Crs::WebMercator);
        let id = editor.create_polygon(rect(0.0, 0.0, 10.0, 10.0));
        editor.toggle_selection(id);
        editor.clear();
        assert!(editor.layer().is_empty());
        assert_eq!(editor.selected_count(), 0);
        assert!(editor.labels_of(id).is_empty());
    }
}
