use crate::components::{Geometry, GeometryKind, Symbol};
use crate::entity::GraphicId;
use foundation::handles::HandleAllocator;

#[derive(Debug, Clone, PartialEq)]
pub struct Graphic {
    pub id: GraphicId,
    pub geometry: Geometry,
    pub symbol: Symbol,
}

/// Client-side drawing surface: graphics in insertion order.
///
/// Ids are never reused, so a removed id stays invalid for the lifetime of
/// the layer.
#[derive(Debug, Default)]
pub struct GraphicsLayer {
    ids: HandleAllocator,
    graphics: Vec<Graphic>,
}

impl GraphicsLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, geometry: Geometry, symbol: Symbol) -> GraphicId {
        let id = GraphicId(self.ids.allocate());
        self.graphics.push(Graphic {
            id,
            geometry,
            symbol,
        });
        id
    }

    pub fn remove(&mut self, id: GraphicId) -> Option<Graphic> {
        let idx = self.position(id)?;
        Some(self.graphics.remove(idx))
    }

    pub fn get(&self, id: GraphicId) -> Option<&Graphic> {
        self.graphics.iter().find(|g| g.id == id)
    }

    pub fn contains(&self, id: GraphicId) -> bool {
        self.position(id).is_some()
    }

    /// Returns `false` when `id` is not in the layer.
    pub fn set_symbol(&mut self, id: GraphicId, symbol: Symbol) -> bool {
        match self.graphics.iter_mut().find(|g| g.id == id) {
            Some(g) => {
                g.symbol = symbol;
                true
            }
            None => false,
        }
    }

    pub fn set_geometry(&mut self, id: GraphicId, geometry: Geometry) -> bool {
        match self.graphics.iter_mut().find(|g| g.id == id) {
            Some(g) => {
                g.geometry = geometry;
                true
            }
            None => false,
        }
    }

    /// Bottom-to-top draw order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Graphic> {
        self.graphics.iter()
    }

    pub fn len(&self) -> usize {
        self.graphics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graphics.is_empty()
    }

    pub fn polygon_count(&self) -> usize {
        self.graphics
            .iter()
            .filter(|g| g.geometry.kind() == GeometryKind::Polygon)
            .count()
    }

    pub fn clear(&mut self) {
        self.graphics.clear();
    }

    fn position(&self, id: GraphicId) -> Option<usize> {
        self.graphics.iter().position(|g| g.id == id)
    }
}
