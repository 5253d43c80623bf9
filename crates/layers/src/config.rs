//! Per-deployment configuration: which services exist and how their
//! attributes are presented.

use std::collections::BTreeMap;
use std::path::Path;

use foundation::math::mercator::{MERCATOR_HALF_WORLD, geographic_to_mercator};
use foundation::{Crs, Extent, MapPoint};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConfigError;

/// Meters per pixel of 256-pixel Web Mercator tiles at zoom 0.
const ZOOM0_RESOLUTION: f64 = 2.0 * MERCATOR_HALF_WORLD / 256.0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Logical layer name used by callers.
    pub name: String,
    pub url: String,
    /// Qualified layer list, e.g. `workspace:layer`.
    pub layers: String,
    /// Host that must be allowed for cross-origin requests.
    #[serde(default)]
    pub domain: String,
}

impl ServiceConfig {
    pub fn new(name: impl Into<String>, url: impl Into<String>, layers: impl Into<String>) -> Self {
        let url = url.into();
        let domain = host_of(&url);
        Self {
            name: name.into(),
            url,
            layers: layers.into(),
            domain,
        }
    }

    /// Layer name without its workspace prefix.
    pub fn local_layer_name(&self) -> &str {
        self.layers
            .split_once(':')
            .map_or(self.layers.as_str(), |(_, local)| local)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapDefaults {
    pub basemap: String,
    /// Longitude, latitude.
    pub center: [f64; 2],
    pub zoom: u8,
}

impl MapDefaults {
    /// Web Mercator extent of a `width` x `height` pixel view at the
    /// default center and zoom.
    pub fn home_extent(&self, width: u32, height: u32) -> Extent {
        let resolution = ZOOM0_RESOLUTION / 2f64.powi(i32::from(self.zoom));
        let [lon, lat] = self.center;
        let center = geographic_to_mercator(MapPoint::new(lon, lat));
        let half_width = f64::from(width) * resolution / 2.0;
        let half_height = f64::from(height) * resolution / 2.0;
        Extent::new(
            center.x - half_width,
            center.y - half_height,
            center.x + half_width,
            center.y + half_height,
            Crs::WebMercator,
        )
    }
}

impl Default for MapDefaults {
    fn default() -> Self {
        Self {
            basemap: "satellite".to_string(),
            center: [108.0, 16.0],
            zoom: 5,
        }
    }
}

/// Showing `layer` hides every layer in `excludes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exclusion {
    pub layer: String,
    pub excludes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentConfig {
    pub services: Vec<ServiceConfig>,
    #[serde(default)]
    pub field_mapping: BTreeMap<String, String>,
    #[serde(default)]
    pub hidden_fields: Vec<String>,
    #[serde(default)]
    pub map: MapDefaults,
    #[serde(default)]
    pub exclusions: Vec<Exclusion>,
}

impl DeploymentConfig {
    /// The shipped deployment: administrative boundaries plus the garden
    /// survey layer.
    pub fn builtin() -> Self {
        let boundaries = "https://bando.ifee.edu.vn:8453/geoserver/ws_ranhgioi/wms";
        let gardens = "https://maps-150.ifee.edu.vn:8453/geoserver/_2025_EUDR/wms";

        let field_mapping = [
            ("land_type", "Loại đất"),
            ("area", "Diện tích"),
            ("farmer", "Nông hộ"),
            ("name", "Tên"),
            ("province", "Tỉnh/Thành phố"),
            ("commune", "Phường/Xã"),
            ("lon", "Kinh độ (WGS84)"),
            ("lat", "Vĩ độ (WGS84)"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            services: vec![
                ServiceConfig::new("province", boundaries, "ws_ranhgioi:rg_vn_tinh"),
                ServiceConfig::new("commune", boundaries, "ws_ranhgioi:rg_vn_xa"),
                ServiceConfig::new("gardens", gardens, "_2025_EUDR:gardens"),
            ],
            field_mapping,
            hidden_fields: ["gid", "geom", "tt", "province_code", "commune_code"]
                .into_iter()
                .map(String::from)
                .collect(),
            map: MapDefaults::default(),
            exclusions: vec![
                Exclusion {
                    layer: "commune".to_string(),
                    excludes: vec!["province".to_string()],
                },
                Exclusion {
                    layer: "gardens".to_string(),
                    excludes: vec!["commune".to_string()],
                },
            ],
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))?;
        Self::from_json(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (i, service) in self.services.iter().enumerate() {
            if service.name.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("service #{i} has no name")));
            }
            if service.url.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "service '{}' has no url",
                    service.name
                )));
            }
            if self.services[..i].iter().any(|s| s.name == service.name) {
                return Err(ConfigError::Invalid(format!(
                    "service '{}' is configured twice",
                    service.name
                )));
            }
        }
        Ok(())
    }

    pub fn service(&self, name: &str) -> Option<&ServiceConfig> {
        self.services.iter().find(|s| s.name == name)
    }

    /// Layers that must be hidden while `name` is shown.
    pub fn excluded_by(&self, name: &str) -> &[String] {
        self.exclusions
            .iter()
            .find(|e| e.layer == name)
            .map(|e| e.excludes.as_slice())
            .unwrap_or_default()
    }

    /// Service hosts to allow for cross-origin requests, first-seen order.
    pub fn cors_domains(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for service in &self.services {
            let domain = service.domain.trim();
            if !domain.is_empty() && !out.contains(&domain) {
                out.push(domain);
            }
        }
        out
    }
}

/// Host part of a service URL; a URL without a scheme is read as `http`.
fn host_of(url: &str) -> String {
    let parsed = match Url::parse(url) {
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(&format!("http://{url}")),
        other => other,
    };
    parsed
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::{DeploymentConfig, MapDefaults, ServiceConfig};
    use crate::error::ConfigError;
    use foundation::Crs;
    use foundation::math::mercator::MERCATOR_HALF_WORLD;
    use pretty_assertions::assert_eq;

    #[test]
    fn builtin_is_valid() {
        let config = DeploymentConfig::builtin();
        assert!(config.validate().is_ok());
        assert_eq!(config.service("commune").unwrap().local_layer_name(), "rg_vn_xa");
        assert_eq!(config.excluded_by("commune"), ["province".to_string()]);
        assert!(config.excluded_by("province").is_empty());
    }

    #[test]
    fn cors_domains_are_unique_in_first_seen_order() {
        let config = DeploymentConfig::builtin();
        assert_eq!(
            config.cors_domains(),
            vec!["bando.ifee.edu.vn", "maps-150.ifee.edu.vn"]
        );
    }

    #[test]
    fn domain_is_derived_from_url() {
        let s = ServiceConfig::new("x", "http://localhost:8080/geoserver/wms", "a:b");
        assert_eq!(s.domain, "localhost");
        let bare = ServiceConfig::new("y", "gis.example.org/wms", "b");
        assert_eq!(bare.domain, "gis.example.org");
        assert_eq!(bare.local_layer_name(), "b");
        let tricky = ServiceConfig::new("z", "https://user:pw@Maps.Example.org:8443/ows?x=1", "c");
        assert_eq!(tricky.domain, "maps.example.org");
        let junk = ServiceConfig::new("w", "http://", "d");
        assert_eq!(junk.domain, "");
    }

    #[test]
    fn home_extent_is_centered_on_the_default_view() {
        let world = MapDefaults {
            basemap: "osm".to_string(),
            center: [0.0, 0.0],
            zoom: 0,
        }
        .home_extent(256, 256);
        assert_eq!(world.crs(), Crs::WebMercator);
        assert!((world.xmin() + MERCATOR_HALF_WORLD).abs() < 1e-6);
        assert!((world.ymax() - MERCATOR_HALF_WORLD).abs() < 1e-6);

        let defaults = MapDefaults::default();
        let home = defaults.home_extent(800, 600);
        assert!((home.width() / home.height() - 800.0 / 600.0).abs() < 1e-9);
        let center = home.to_geographic().unwrap().center();
        assert!((center.x - 108.0).abs() < 1e-6, "{center:?}");
        assert!((home.width() - world.width() * 800.0 / 256.0 / 32.0).abs() < 1e-6);
    }

    #[test]
    fn parses_minimal_json_with_defaults() {
        let config = DeploymentConfig::from_json(
            r#"{"services":[{"name":"parcels","url":"https://gis.example/wms","layers":"ws:parcels"}]}"#,
        )
        .unwrap();
        assert_eq!(config.services.len(), 1);
        assert_eq!(config.map.zoom, 5);
        assert!(config.hidden_fields.is_empty());
        assert!(config.cors_domains().is_empty());
    }

    #[test]
    fn rejects_duplicate_names_and_empty_urls() {
        let dup = r#"{"services":[
            {"name":"a","url":"https://x/wms","layers":"l"},
            {"name":"a","url":"https://y/wms","layers":"m"}]}"#;
        assert!(matches!(
            DeploymentConfig::from_json(dup),
            Err(ConfigError::Invalid(_))
        ));

        let empty = r#"{"services":[{"name":"a","url":" ","layers":"l"}]}"#;
        assert!(matches!(
            DeploymentConfig::from_json(empty),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            DeploymentConfig::from_json("{"),
            Err(ConfigError::Parse(_))
        ));
    }
}
