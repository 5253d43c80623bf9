use foundation::math::MapPoint;

use crate::entity::GraphicId;
use crate::graphics::GraphicsLayer;

/// Topmost polygon graphic containing `point`.
///
/// Ordering contract:
/// - The most recently added graphic wins when several overlap.
/// - Points on a polygon boundary do not count as inside.
pub fn graphic_at(layer: &GraphicsLayer, point: MapPoint) -> Option<GraphicId> {
    layer
        .iter()
        .rev()
        .find(|g| g.geometry.as_polygon().is_some_and(|p| p.contains(point)))
        .map(|g| g.id)
}
