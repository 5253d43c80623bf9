use std::collections::BTreeMap;
use std::sync::Arc;

use formats::exception::{exception_message, looks_like_xml};
use formats::feature_info::FeatureRecord;
use formats::collection::{FeatureCollection, parse_feature_collection};
use foundation::{Crs, Extent, MapPoint, ScreenPoint, point_to_geographic};
use tracing::{debug, warn};

use crate::request::FeatureInfoRequest;
use crate::transport::{HttpResponse, Transport};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum QueryErrorKind {
    /// No response, or a non-2xx status.
    TransportFailure,
    /// The service answered with an OGC exception document.
    ProtocolException,
    /// The body was neither an exception document nor a feature collection.
    MalformedResponse,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryError {
    pub kind: QueryErrorKind,
    pub message: String,
}

impl QueryError {
    pub fn new(kind: QueryErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for QueryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.kind {
            QueryErrorKind::TransportFailure => "transport failure",
            QueryErrorKind::ProtocolException => "service exception",
            QueryErrorKind::MalformedResponse => "malformed response",
        };
        write!(f, "{kind}: {}", self.message)
    }
}

impl std::error::Error for QueryError {}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    /// Valid answer with no features at the point.
    Empty,
    Data(Vec<FeatureRecord>),
    Failure(QueryError),
}

/// What the host currently shows.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MapView {
    pub extent: Extent,
    pub width: u32,
    pub height: u32,
}

/// Receives attribute records for display.
pub trait FeatureSink {
    fn show(&mut self, layer: &str, records: &[FeatureRecord], at: MapPoint);
}

/// Bounding box and SRS to put on the wire for a view extent.
///
/// WGS84 passes through, Web Mercator is converted to WGS84, and any other
/// CRS is sent as-is under its own code.
pub fn request_frame(extent: &Extent) -> (Extent, String) {
    match extent.crs() {
        Crs::Wgs84 => (*extent, Crs::Wgs84.srs()),
        crs @ Crs::WebMercator => match extent.to_geographic() {
            Ok(geo) => (geo, Crs::Wgs84.srs()),
            Err(err) => {
                warn!(error = %err, "extent conversion failed, sending native SRS");
                (*extent, crs.srs())
            }
        },
        crs @ Crs::Other(_) => {
            warn!(srs = %crs.srs(), "no transform for view CRS, querying in native SRS");
            (*extent, crs.srs())
        }
    }
}

/// Click point in WGS84 when a transform is known, otherwise unchanged.
pub fn display_point(point: MapPoint, crs: Crs) -> MapPoint {
    point_to_geographic(point, crs).unwrap_or(point)
}

/// Checks status and exception documents, then parses the JSON body.
pub fn read_feature_collection(resp: &HttpResponse) -> Result<FeatureCollection, QueryError> {
    if !resp.is_success() {
        return Err(QueryError::new(
            QueryErrorKind::TransportFailure,
            format!("HTTP status {}", resp.status),
        ));
    }
    let body = resp.body.trim();
    if looks_like_xml(body) {
        let message = match exception_message(body) {
            Ok(Some(msg)) => msg,
            Ok(None) => "XML document without exception text".to_string(),
            Err(err) => format!("unreadable exception document: {err}"),
        };
        return Err(QueryError::new(QueryErrorKind::ProtocolException, message));
    }
    parse_feature_collection(body)
        .map_err(|e| QueryError::new(QueryErrorKind::MalformedResponse, e.to_string()))
}

pub fn classify_response(resp: &HttpResponse) -> QueryOutcome {
    match read_feature_collection(resp) {
        Ok(fc) if fc.features.is_empty() => QueryOutcome::Empty,
        Ok(fc) => QueryOutcome::Data(fc.features.iter().map(FeatureRecord::from).collect()),
        Err(err) => QueryOutcome::Failure(err),
    }
}

/// Point queries against WMS GetFeatureInfo.
#[derive(Clone)]
pub struct FeatureQueryEngine {
    transport: Arc<dyn Transport>,
}

impl FeatureQueryEngine {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub async fn fetch(&self, url: &str) -> QueryOutcome {
        debug!(url, "GetFeatureInfo");
        match self.transport.get(url).await {
            Ok(resp) => classify_response(&resp),
            Err(err) => QueryOutcome::Failure(QueryError::new(
                QueryErrorKind::TransportFailure,
                err.to_string(),
            )),
        }
    }

    /// Queries `layers` at `pixel` of `view` on the service at `base_url`.
    pub async fn query(
        &self,
        base_url: &str,
        layers: &str,
        view: &MapView,
        pixel: ScreenPoint,
        filter: Option<&str>,
        params: &BTreeMap<String, String>,
    ) -> QueryOutcome {
        let (bbox, srs) = request_frame(&view.extent);
        let url = FeatureInfoRequest::new(layers, bbox, srs, (view.width, view.height), pixel)
            .with_filter(filter)
            .with_params(params)
            .to_url(base_url);
        self.fetch(&url).await
    }
}
