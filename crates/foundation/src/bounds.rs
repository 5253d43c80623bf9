use serde::Serialize;

use crate::crs::{Crs, CrsError, point_to_geographic};
use crate::math::MapPoint;

/// Running axis-aligned bounds without a CRS attached.
///
/// Starts empty; `extend` only accepts finite coordinates so an empty input
/// never turns into NaN bounds.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb2 {
    pub min: [f64; 2],
    pub max: [f64; 2],
}

impl Aabb2 {
    pub fn new(min: [f64; 2], max: [f64; 2]) -> Self {
        Aabb2 { min, max }
    }

    pub fn empty() -> Self {
        Aabb2 {
            min: [f64::INFINITY, f64::INFINITY],
            max: [f64::NEG_INFINITY, f64::NEG_INFINITY],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min[0] > self.max[0] || self.min[1] > self.max[1]
    }

    pub fn extend(&mut self, x: f64, y: f64) {
        if !x.is_finite() || !y.is_finite() {
            return;
        }
        self.min[0] = self.min[0].min(x);
        self.min[1] = self.min[1].min(y);
        self.max[0] = self.max[0].max(x);
        self.max[1] = self.max[1].max(y);
    }

    pub fn merge(&mut self, other: &Aabb2) {
        if other.is_empty() {
            return;
        }
        self.extend(other.min[0], other.min[1]);
        self.extend(other.max[0], other.max[1]);
    }

    /// `None` while nothing has been added.
    pub fn non_empty(self) -> Option<Self> {
        (!self.is_empty()).then_some(self)
    }
}

/// Axis-aligned bounding box tagged with its CRS.
///
/// Invariant: `xmin <= xmax` and `ymin <= ymax`. Constructors reorder corners.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct Extent {
    xmin: f64,
    ymin: f64,
    xmax: f64,
    ymax: f64,
    crs: Crs,
}

impl Extent {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64, crs: Crs) -> Self {
        Extent {
            xmin: x1.min(x2),
            ymin: y1.min(y2),
            xmax: x1.max(x2),
            ymax: y1.max(y2),
            crs,
        }
    }

    pub fn from_aabb(aabb: Aabb2, crs: Crs) -> Option<Self> {
        let aabb = aabb.non_empty()?;
        Some(Extent::new(aabb.min[0], aabb.min[1], aabb.max[0], aabb.max[1], crs))
    }

    /// The whole geographic world.
    pub fn world() -> Self {
        Extent::new(-180.0, -90.0, 180.0, 90.0, Crs::Wgs84)
    }

    pub fn xmin(&self) -> f64 {
        self.xmin
    }

    pub fn ymin(&self) -> f64 {
        self.ymin
    }

    pub fn xmax(&self) -> f64 {
        self.xmax
    }

    pub fn ymax(&self) -> f64 {
        self.ymax
    }

    pub fn crs(&self) -> Crs {
        self.crs
    }

    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }

    pub fn center(&self) -> MapPoint {
        MapPoint::new(
            (self.xmin + self.xmax) / 2.0,
            (self.ymin + self.ymax) / 2.0,
        )
    }

    pub fn contains(&self, p: MapPoint) -> bool {
        p.x >= self.xmin && p.x <= self.xmax && p.y >= self.ymin && p.y <= self.ymax
    }

    /// Scales width and height by `factor` around the center.
    ///
    /// `expand(1.1)` grows each axis by 10%, half on either side.
    pub fn expand(&self, factor: f64) -> Self {
        let c = self.center();
        let hw = self.width() * factor / 2.0;
        let hh = self.height() * factor / 2.0;
        Extent::new(c.x - hw, c.y - hh, c.x + hw, c.y + hh, self.crs)
    }

    pub fn union(&self, other: &Extent) -> Result<Self, CrsError> {
        if self.crs != other.crs {
            return Err(CrsError::Mismatch {
                left: self.crs,
                right: other.crs,
            });
        }
        Ok(Extent::new(
            self.xmin.min(other.xmin),
            self.ymin.min(other.ymin),
            self.xmax.max(other.xmax),
            self.ymax.max(other.ymax),
            self.crs,
        ))
    }

    /// Reprojects both corners to WGS84. Identity when already geographic.
    pub fn to_geographic(&self) -> Result<Self, CrsError> {
        if self.crs.is_geographic() {
            return Ok(*self);
        }
        let lo = point_to_geographic(MapPoint::new(self.xmin, self.ymin), self.crs)?;
        let hi = point_to_geographic(MapPoint::new(self.xmax, self.ymax), self.crs)?;
        Ok(Extent::new(lo.x, lo.y, hi.x, hi.y, Crs::Wgs84))
    }

    /// `xmin,ymin,xmax,ymax` as used by the `BBOX` parameter.
    pub fn bbox_param(&self) -> String {
        format!("{},{},{},{}", self.xmin, self.ymin, self.xmax, self.ymax)
    }
}
