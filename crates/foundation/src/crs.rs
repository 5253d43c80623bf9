//! Coordinate reference system identifiers and the geographic normalizer.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::math::{MapPoint, geographic_to_mercator, mercator_to_geographic};

/// A CRS as the map host reports it: a numeric well-known id.
///
/// Only WGS84 and spherical Web Mercator can be reprojected; every other code
/// is carried through untouched.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub enum Crs {
    Wgs84,
    WebMercator,
    Other(u32),
}

impl Crs {
    pub fn from_wkid(wkid: u32) -> Self {
        match wkid {
            4326 => Crs::Wgs84,
            3857 | 102100 | 102113 | 900913 => Crs::WebMercator,
            other => Crs::Other(other),
        }
    }

    pub fn wkid(&self) -> u32 {
        match self {
            Crs::Wgs84 => 4326,
            Crs::WebMercator => 3857,
            Crs::Other(code) => *code,
        }
    }

    pub fn is_geographic(&self) -> bool {
        matches!(self, Crs::Wgs84)
    }

    /// Value for `SRS`/`srsName` request parameters.
    pub fn srs(&self) -> String {
        format!("EPSG:{}", self.wkid())
    }

    /// Parses the CRS spellings found in capabilities documents, GeoJSON `crs`
    /// members and request parameters.
    ///
    /// Accepts `EPSG:3857`, `urn:ogc:def:crs:EPSG::4326`, `urn:ogc:def:crs:OGC:1.3:CRS84`,
    /// `CRS:84`, `http://www.opengis.net/gml/srs/epsg.xml#4326` and bare codes.
    pub fn parse(s: &str) -> Result<Self, CrsError> {
        let upper = s.trim().to_ascii_uppercase();
        if upper == "CRS:84" || upper.ends_with("CRS84") {
            return Ok(Crs::Wgs84);
        }

        let code = upper
            .rsplit([':', '#', '/'])
            .next()
            .filter(|c| !c.is_empty())
            .ok_or_else(|| CrsError::Unparsable(s.to_string()))?;

        code.parse::<u32>()
            .map(Crs::from_wkid)
            .map_err(|_| CrsError::Unparsable(s.to_string()))
    }
}

impl From<u32> for Crs {
    fn from(wkid: u32) -> Self {
        Crs::from_wkid(wkid)
    }
}

impl From<Crs> for u32 {
    fn from(crs: Crs) -> Self {
        crs.wkid()
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.wkid())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrsError {
    /// No transform is known between this CRS and WGS84.
    Unsupported(Crs),
    Unparsable(String),
    /// Two extents in different CRS were combined.
    Mismatch { left: Crs, right: Crs },
}

impl fmt::Display for CrsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrsError::Unsupported(crs) => write!(f, "no geographic transform for {crs}"),
            CrsError::Unparsable(s) => write!(f, "unrecognized CRS identifier: {s:?}"),
            CrsError::Mismatch { left, right } => {
                write!(f, "cannot combine extents in {left} and {right}")
            }
        }
    }
}

impl std::error::Error for CrsError {}

/// Converts a point in `from` to WGS84 degrees. Identity for geographic input.
pub fn point_to_geographic(p: MapPoint, from: Crs) -> Result<MapPoint, CrsError> {
    match from {
        Crs::Wgs84 => Ok(p),
        Crs::WebMercator => Ok(mercator_to_geographic(p)),
        Crs::Other(_) => Err(CrsError::Unsupported(from)),
    }
}

/// Converts a WGS84 point into `to`. Identity for geographic output.
pub fn point_from_geographic(p: MapPoint, to: Crs) -> Result<MapPoint, CrsError> {
    match to {
        Crs::Wgs84 => Ok(p),
        Crs::WebMercator => Ok(geographic_to_mercator(p)),
        Crs::Other(_) => Err(CrsError::Unsupported(to)),
    }
}
