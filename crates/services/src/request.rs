//! OGC request URLs. Parameter order is fixed so URLs are reproducible.

use std::collections::BTreeMap;

use foundation::{Crs, Extent, ScreenPoint};
use tracing::debug;

pub const FEATURE_INFO_VERSION: &str = "1.1.1";
pub const CAPABILITIES_VERSION: &str = "1.3.0";
pub const WFS_VERSION: &str = "1.1.0";

/// `outputFormat` values tried in order when asking a WFS for JSON.
pub const WFS_OUTPUT_FORMATS: [&str; 3] = ["application/json", "json", "application/geo+json"];

/// Feature limit for the global GetFeatureInfo fallback.
pub const FALLBACK_FEATURE_COUNT: u32 = 1000;
pub const FALLBACK_SIZE: u32 = 256;

pub fn encode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// `base` followed by the separator needed before more parameters.
pub fn with_query_separator(base: &str) -> String {
    if !base.contains('?') {
        format!("{base}?")
    } else if base.ends_with('?') || base.ends_with('&') {
        base.to_string()
    } else {
        format!("{base}&")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureInfoRequest {
    pub layers: String,
    pub query_layers: String,
    pub bbox: Extent,
    /// Declared request SRS, e.g. `EPSG:4326`.
    pub srs: String,
    pub width: u32,
    pub height: u32,
    pub x: i64,
    pub y: i64,
    pub format: String,
    pub info_format: String,
    pub feature_count: Option<u32>,
    pub cql_filter: Option<String>,
    pub extra: BTreeMap<String, String>,
}

impl FeatureInfoRequest {
    pub fn new(layers: &str, bbox: Extent, srs: String, size: (u32, u32), pixel: ScreenPoint) -> Self {
        let (x, y) = pixel.rounded();
        Self {
            layers: layers.to_string(),
            query_layers: layers.to_string(),
            bbox,
            srs,
            width: size.0,
            height: size.1,
            x,
            y,
            format: "image/png".to_string(),
            info_format: "application/json".to_string(),
            feature_count: None,
            cql_filter: None,
            extra: BTreeMap::new(),
        }
    }

    /// GetFeatureInfo over the whole world, used to find filtered features
    /// when no WFS answers.
    pub fn global(layers: &str, filter: Option<&str>) -> Self {
        let half = f64::from(FALLBACK_SIZE) / 2.0;
        let mut req = Self::new(
            layers,
            Extent::world(),
            Crs::Wgs84.srs(),
            (FALLBACK_SIZE, FALLBACK_SIZE),
            ScreenPoint::new(half, half),
        );
        req.feature_count = Some(FALLBACK_FEATURE_COUNT);
        req.cql_filter = filter.map(str::to_string);
        req
    }

    pub fn with_filter(mut self, filter: Option<&str>) -> Self {
        self.cql_filter = filter.filter(|f| !f.trim().is_empty()).map(str::to_string);
        self
    }

    pub fn with_params(mut self, params: &BTreeMap<String, String>) -> Self {
        self.extra.extend(params.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    pub fn to_url(&self, base: &str) -> String {
        let mut params = vec![
            "REQUEST=GetFeatureInfo".to_string(),
            "SERVICE=WMS".to_string(),
            format!("VERSION={FEATURE_INFO_VERSION}"),
            format!("LAYERS={}", encode(&self.layers)),
            format!("QUERY_LAYERS={}", encode(&self.query_layers)),
            "STYLES=".to_string(),
            format!("BBOX={}", self.bbox.bbox_param()),
            format!("WIDTH={}", self.width),
            format!("HEIGHT={}", self.height),
            format!("FORMAT={}", encode(&self.format)),
            format!("INFO_FORMAT={}", encode(&self.info_format)),
            format!("SRS={}", self.srs),
            format!("X={}", self.x),
            format!("Y={}", self.y),
            "TRANSPARENT=true".to_string(),
        ];
        if let Some(count) = self.feature_count {
            params.push(format!("FEATURE_COUNT={count}"));
        }
        if let Some(filter) = &self.cql_filter {
            params.push(format!("CQL_FILTER={}", encode(filter)));
        }
        for (k, v) in &self.extra {
            // The filter already has its own slot.
            if k.eq_ignore_ascii_case("CQL_FILTER") && self.cql_filter.is_some() {
                continue;
            }
            params.push(format!("{}={}", encode(k), encode(v)));
        }
        with_query_separator(base) + &params.join("&")
    }
}

pub fn capabilities_url(base: &str) -> String {
    format!(
        "{}SERVICE=WMS&REQUEST=GetCapabilities&VERSION={CAPABILITIES_VERSION}",
        with_query_separator(base)
    )
}

/// WFS endpoint for a WMS endpoint: a `/wms` path segment becomes `/wfs` and
/// a `SERVICE=WMS` parameter becomes `SERVICE=WFS`. Both rewrites apply when
/// both are present.
pub fn derive_wfs_endpoint(wms_url: &str) -> String {
    let (path, query) = match wms_url.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (wms_url, None),
    };

    let mut path = path.to_string();
    let lower = path.to_ascii_lowercase();
    let segment = lower.rmatch_indices("/wms").find(|(i, _)| {
        matches!(lower.as_bytes().get(i + 4), None | Some(b'/'))
    });
    if let Some((i, _)) = segment {
        path.replace_range(i..i + 4, "/wfs");
    }

    let query = query.map(|q| {
        q.split('&')
            .map(|pair| match pair.split_once('=') {
                Some((k, v)) if k.eq_ignore_ascii_case("service") && v.eq_ignore_ascii_case("wms") => {
                    format!("{k}=WFS")
                }
                _ => pair.to_string(),
            })
            .collect::<Vec<_>>()
            .join("&")
    });

    let derived = match query {
        Some(q) => format!("{path}?{q}"),
        None => path,
    };
    if derived == wms_url {
        debug!(url = wms_url, "no WMS marker found, using the URL as the WFS endpoint");
    }
    derived
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WfsGetFeature {
    pub type_name: String,
    pub output_format: String,
    pub max_features: Option<u32>,
    pub cql_filter: Option<String>,
}

impl WfsGetFeature {
    pub fn new(type_name: &str, output_format: &str) -> Self {
        Self {
            type_name: type_name.to_string(),
            output_format: output_format.to_string(),
            max_features: None,
            cql_filter: None,
        }
    }

    pub fn to_url(&self, base: &str) -> String {
        let mut params = vec![
            "service=WFS".to_string(),
            format!("version={WFS_VERSION}"),
            "request=GetFeature".to_string(),
            format!("typeName={}", encode(&self.type_name)),
            format!("outputFormat={}", encode(&self.output_format)),
        ];
        if let Some(max) = self.max_features {
            params.push(format!("maxFeatures={max}"));
        }
        if let Some(filter) = &self.cql_filter {
            params.push(format!("cql_filter={}", encode(filter)));
        }
        with_query_separator(base) + &params.join("&")
    }
}
