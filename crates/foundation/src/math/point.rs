use serde::{Deserialize, Serialize};

/// A position in some map CRS. The CRS travels separately.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapPoint {
    pub x: f64,
    pub y: f64,
}

impl MapPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn midpoint(self, other: Self) -> Self {
        Self::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

impl std::ops::Add for MapPoint {
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl std::ops::Sub for MapPoint {
    type Output = Self;

    fn sub(self, other: Self) -> Self::Output {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

impl From<[f64; 2]> for MapPoint {
    fn from(v: [f64; 2]) -> Self {
        Self::new(v[0], v[1])
    }
}

/// Pixel position on the host's viewport, origin top-left.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Whole-pixel coordinates as sent in feature-info requests.
    pub fn rounded(&self) -> (i64, i64) {
        (self.x.round() as i64, self.y.round() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::{MapPoint, ScreenPoint};

    #[test]
    fn map_point_add_sub_midpoint() {
        let a = MapPoint::new(1.0, 2.0);
        let b = MapPoint::new(-0.5, 4.0);
        assert_eq!(a + b, MapPoint::new(0.5, 6.0));
        assert_eq!(a - b, MapPoint::new(1.5, -2.0));
        assert_eq!(a.midpoint(b), MapPoint::new(0.25, 3.0));
    }

    #[test]
    fn screen_point_rounds_half_away_from_zero() {
        assert_eq!(ScreenPoint::new(10.5, 3.49).rounded(), (11, 3));
    }
}
