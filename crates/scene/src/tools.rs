use foundation::math::MapPoint;
use tracing::debug;

use crate::components::{Polygon, Polyline};
use crate::editor::{EditError, PolygonEditor};
use crate::entity::GraphicId;
use crate::ops::GeometryOps;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Tool {
    Draw,
    Select,
    Split,
    Edit,
}

/// Geometry handed back by the host's drawing toolbar.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawnGeometry {
    Polygon(Polygon),
    Line(Polyline),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOutcome {
    Created(GraphicId),
    Split(Result<Vec<GraphicId>, EditError>),
    /// No tool expected this geometry.
    Ignored,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClickAction {
    Toggled { graphic: GraphicId, selected: bool },
    /// No interactive tool is active: the click belongs to feature queries.
    QueryFeatures(MapPoint),
    None,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ToolError {
    NeedsSingleSelection { tool: Tool, selected: usize },
    NotEditing,
    Edit(EditError),
}

impl std::fmt::Display for ToolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolError::NeedsSingleSelection { tool, selected } => write!(
                f,
                "{tool:?} tool needs exactly one selected polygon, {selected} selected"
            ),
            ToolError::NotEditing => f.write_str("edit tool is not active"),
            ToolError::Edit(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ToolError {}

/// Which interactive tool owns map input.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ToolState {
    active: Option<Tool>,
}

impl ToolState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<Tool> {
        self.active
    }

    pub fn activate<O: GeometryOps>(
        &mut self,
        tool: Tool,
        editor: &PolygonEditor<O>,
    ) -> Result<(), ToolError> {
        if matches!(tool, Tool::Split | Tool::Edit) && editor.selected_count() != 1 {
            return Err(ToolError::NeedsSingleSelection {
                tool,
                selected: editor.selected_count(),
            });
        }
        debug!(?tool, "tool activated");
        self.active = Some(tool);
        Ok(())
    }

    pub fn deactivate(&mut self) {
        self.active = None;
    }

    /// Routes a finished drawing to the editor. Drawing tools are one-shot.
    pub fn draw_end<O: GeometryOps>(
        &mut self,
        editor: &mut PolygonEditor<O>,
        geometry: DrawnGeometry,
    ) -> DrawOutcome {
        let outcome = match (self.active, geometry) {
            (Some(Tool::Draw), DrawnGeometry::Polygon(p)) => {
                DrawOutcome::Created(editor.create_polygon(p))
            }
            (Some(Tool::Split), DrawnGeometry::Line(line)) => DrawOutcome::Split(editor.split(&line)),
            _ => return DrawOutcome::Ignored,
        };
        self.active = None;
        outcome
    }

    /// Commits a vertex edit of the single selected polygon.
    pub fn edit_end<O: GeometryOps>(
        &mut self,
        editor: &mut PolygonEditor<O>,
        polygon: Polygon,
    ) -> Result<GraphicId, ToolError> {
        if self.active != Some(Tool::Edit) {
            return Err(ToolError::NotEditing);
        }
        let selected = editor.selected_graphics();
        let [id] = selected.as_slice() else {
            return Err(ToolError::NeedsSingleSelection {
                tool: Tool::Edit,
                selected: selected.len(),
            });
        };
        editor
            .update_polygon(*id, polygon)
            .map_err(ToolError::Edit)?;
        self.active = None;
        Ok(*id)
    }

    pub fn click<O: GeometryOps>(
        &mut self,
        editor: &mut PolygonEditor<O>,
        point: MapPoint,
    ) -> ClickAction {
        match self.active {
            Some(Tool::Select) => match editor.graphic_at(point) {
                Some(graphic) => ClickAction::Toggled {
                    graphic,
                    selected: editor.toggle_selection(graphic),
                },
                None => ClickAction::None,
            },
            Some(_) => ClickAction::None,
            None => ClickAction::QueryFeatures(point),
        }
    }
}
