pub mod components;
pub mod editor;
pub mod entity;
pub mod graphics;
pub mod labels;
pub mod ops;
pub mod picking;
pub mod planar;
pub mod selection;
pub mod tools;

pub use components::*;
pub use editor::{EditError, EditOperation, PolygonEditor};
pub use entity::GraphicId;
pub use graphics::{Graphic, GraphicsLayer};
pub use ops::{GeometryOpError, GeometryOps};
pub use planar::PlanarOps;
pub use selection::SelectionSet;
pub use tools::{ClickAction, DrawOutcome, DrawnGeometry, Tool, ToolState};
