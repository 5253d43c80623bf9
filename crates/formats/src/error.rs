#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    Json(String),
    Xml(String),
}

impl std::fmt::Display for FormatError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormatError::Json(msg) => write!(f, "invalid JSON document: {msg}"),
            FormatError::Xml(msg) => write!(f, "invalid XML document: {msg}"),
        }
    }
}

impl std::error::Error for FormatError {}

impl From<serde_json::Error> for FormatError {
    fn from(e: serde_json::Error) -> Self {
        FormatError::Json(e.to_string())
    }
}

impl From<quick_xml::Error> for FormatError {
    fn from(e: quick_xml::Error) -> Self {
        FormatError::Xml(e.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for FormatError {
    fn from(e: quick_xml::events::attributes::AttrError) -> Self {
        FormatError::Xml(e.to_string())
    }
}

impl From<geojson::Error> for FormatError {
    fn from(e: geojson::Error) -> Self {
        FormatError::Json(e.to_string())
    }
}
