use foundation::crs::{Crs, CrsError};

use crate::components::{Polygon, Polyline};

#[derive(Debug, Clone, PartialEq)]
pub enum GeometryOpError {
    /// Input too small or not finite to operate on.
    Degenerate(String),
    Crs(CrsError),
    Engine(String),
}

impl std::fmt::Display for GeometryOpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeometryOpError::Degenerate(msg) => write!(f, "degenerate geometry: {msg}"),
            GeometryOpError::Crs(err) => write!(f, "{err}"),
            GeometryOpError::Engine(msg) => write!(f, "geometry engine failure: {msg}"),
        }
    }
}

impl std::error::Error for GeometryOpError {}

impl From<CrsError> for GeometryOpError {
    fn from(value: CrsError) -> Self {
        GeometryOpError::Crs(value)
    }
}

/// Geometry engine the editor delegates to.
///
/// Implementations may fail on any input; the editor treats every error as
/// "operation did not happen".
pub trait GeometryOps {
    /// Pieces of `polygon` cut by `line`. A line that does not traverse the
    /// polygon yields the polygon itself as the single piece.
    fn cut(&self, polygon: &Polygon, line: &Polyline) -> Result<Vec<Polygon>, GeometryOpError>;

    /// `None` when the union has no area.
    fn union(&self, a: &Polygon, b: &Polygon) -> Result<Option<Polygon>, GeometryOpError>;

    /// Geodesic length in meters of `line`, whose vertices are in `crs`.
    fn geodesic_length(&self, line: &Polyline, crs: Crs) -> Result<f64, GeometryOpError>;
}

impl<T: GeometryOps + ?Sized> GeometryOps for &T {
    fn cut(&self, polygon: &Polygon, line: &Polyline) -> Result<Vec<Polygon>, GeometryOpError> {
        (**self).cut(polygon, line)
    }

    fn union(&self, a: &Polygon, b: &Polygon) -> Result<Option<Polygon>, GeometryOpError> {
        (**self).union(a, b)
    }

    fn geodesic_length(&self, line: &Polyline, crs: Crs) -> Result<f64, GeometryOpError> {
        (**self).geodesic_length(line, crs)
    }
}
