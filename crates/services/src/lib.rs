//! OGC service access: GetFeatureInfo point queries, extent resolution for
//! filtered layers and the session that ties remote layers to a map host.

pub mod extent;
pub mod query;
pub mod request;
pub mod session;
pub mod transport;

pub use extent::{ExtentResolver, ExtentSource, ResolvedExtent};
pub use query::{FeatureQueryEngine, FeatureSink, MapView, QueryError, QueryErrorKind, QueryOutcome};
pub use request::{FeatureInfoRequest, WfsGetFeature};
pub use session::{ExtentJob, ExtentUpdate, HostError, MapHost, MapSession, SessionError};
pub use transport::{BoxFuture, HttpResponse, MemoryTransport, ReqwestTransport, Transport, TransportError};
