//! Where to zoom after a layer is added.
//!
//! With a filter: WFS GetFeature (each JSON output format in turn), then a
//! global GetFeatureInfo, then the declared capabilities extent. Without a
//! filter only the declared extent is used.

use std::sync::Arc;

use formats::capabilities::parse_capabilities;
use formats::extent::bounding_box_of_features;
use formats::collection::{FeatureCollection, coordinate_crs};
use foundation::Extent;
use layers::ServiceConfig;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::query::{QueryErrorKind, read_feature_collection};
use crate::request::{
    FALLBACK_FEATURE_COUNT, FeatureInfoRequest, WFS_OUTPUT_FORMATS, WfsGetFeature,
    capabilities_url, derive_wfs_endpoint,
};
use crate::transport::Transport;

/// Declared extents are grown by this factor before use.
pub const DECLARED_EXTENT_PADDING: f64 = 1.1;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtentSource {
    Wfs,
    WmsFallback,
    Capabilities,
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct ResolvedExtent {
    /// Always WGS84.
    pub extent: Extent,
    pub source: ExtentSource,
}

#[derive(Clone)]
pub struct ExtentResolver {
    transport: Arc<dyn Transport>,
}

impl ExtentResolver {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// `None` when every step failed; failures are logged, never returned.
    pub async fn resolve(
        &self,
        service: &ServiceConfig,
        filter: Option<&str>,
    ) -> Option<ResolvedExtent> {
        if let Some(filter) = filter.filter(|f| !f.trim().is_empty()) {
            if let Some(extent) = self.from_wfs(service, filter).await {
                return Some(ResolvedExtent {
                    extent,
                    source: ExtentSource::Wfs,
                });
            }
            if let Some(extent) = self.from_wms_fallback(service, filter).await {
                return Some(ResolvedExtent {
                    extent,
                    source: ExtentSource::WmsFallback,
                });
            }
            debug!(layer = %service.name, "filtered extent unavailable, using declared extent");
        }

        self.declared(service).await.map(|extent| ResolvedExtent {
            extent,
            source: ExtentSource::Capabilities,
        })
    }

    async fn from_wfs(&self, service: &ServiceConfig, filter: &str) -> Option<Extent> {
        let endpoint = derive_wfs_endpoint(&service.url);
        for format in WFS_OUTPUT_FORMATS {
            let mut request = WfsGetFeature::new(&service.layers, format);
            request.max_features = Some(FALLBACK_FEATURE_COUNT);
            request.cql_filter = Some(filter.to_string());
            let url = request.to_url(&endpoint);

            let resp = match self.transport.get(&url).await {
                Ok(resp) => resp,
                Err(err) => {
                    warn!(layer = %service.name, error = %err, "WFS request failed");
                    return None;
                }
            };
            if let Some(media) = resp.media_type()
                && resp.is_success()
                && !media.contains("json")
            {
                debug!(format, media = %media, "WFS answered with a non-JSON type, trying next format");
                continue;
            }
            match read_feature_collection(&resp) {
                Ok(fc) => {
                    let extent = extent_of(&fc);
                    if extent.is_none() {
                        debug!(layer = %service.name, "WFS returned no located features");
                    }
                    return extent;
                }
                Err(err) if err.kind == QueryErrorKind::TransportFailure => {
                    warn!(layer = %service.name, error = %err, "WFS request failed");
                    return None;
                }
                Err(err) => {
                    debug!(format, error = %err, "WFS format rejected, trying next format");
                }
            }
        }
        None
    }

    async fn from_wms_fallback(&self, service: &ServiceConfig, filter: &str) -> Option<Extent> {
        let url = FeatureInfoRequest::global(&service.layers, Some(filter)).to_url(&service.url);
        let resp = match self.transport.get(&url).await {
            Ok(resp) => resp,
            Err(err) => {
                warn!(layer = %service.name, error = %err, "GetFeatureInfo fallback failed");
                return None;
            }
        };
        match read_feature_collection(&resp) {
            Ok(fc) => extent_of(&fc),
            Err(err) => {
                warn!(layer = %service.name, error = %err, "GetFeatureInfo fallback failed");
                None
            }
        }
    }

    /// Capabilities bounding box for the service's layer, padded.
    pub async fn declared(&self, service: &ServiceConfig) -> Option<Extent> {
        let url = capabilities_url(&service.url);
        let resp = match self.transport.get(&url).await {
            Ok(resp) if resp.is_success() => resp,
            Ok(resp) => {
                warn!(layer = %service.name, status = resp.status, "GetCapabilities failed");
                return None;
            }
            Err(err) => {
                warn!(layer = %service.name, error = %err, "GetCapabilities failed");
                return None;
            }
        };
        let caps = match parse_capabilities(&resp.body) {
            Ok(caps) => caps,
            Err(err) => {
                warn!(layer = %service.name, error = %err, "capabilities document unreadable");
                return None;
            }
        };
        let Some(extent) = caps.declared_extent(&service.layers) else {
            warn!(layer = %service.name, "layer declares no usable bounding box");
            return None;
        };
        info!(layer = %service.name, "using declared extent");
        Some(extent.expand(DECLARED_EXTENT_PADDING))
    }
}

/// Bounds of every feature geometry, in WGS84.
fn extent_of(fc: &FeatureCollection) -> Option<Extent> {
    let aabb = bounding_box_of_features(&fc.features)?;
    let extent = Extent::from_aabb(aabb, coordinate_crs(fc))?;
    match extent.to_geographic() {
        Ok(geo) => Some(geo),
        Err(err) => {
            warn!(error = %err, "feature extent is in a CRS that cannot be converted");
            None
        }
    }
}
