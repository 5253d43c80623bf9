#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayerError {
    /// No service is configured under this logical name.
    ConfigurationMissing(String),
    /// A binding for this logical name is already active.
    AlreadyBound(String),
}

impl std::fmt::Display for LayerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayerError::ConfigurationMissing(name) => {
                write!(f, "no service configured for layer '{name}'")
            }
            LayerError::AlreadyBound(name) => write!(f, "layer '{name}' is already active"),
        }
    }
}

impl std::error::Error for LayerError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Io(String),
    Parse(String),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "config read failed: {msg}"),
            ConfigError::Parse(msg) => write!(f, "config parse failed: {msg}"),
            ConfigError::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}
