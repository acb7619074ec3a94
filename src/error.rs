//! Custom error types for valdiff.

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Failed to read file {path}: {source}")]
    ReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {path}: {source}")]
    JsonError {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid YAML in {path}: {source}")]
    YamlError {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid TOML in {path}: {source}")]
    TomlError {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Could not detect file format for {path}")]
    UnknownFormat { path: String },
}

/// Failure to build the canonical form of a value. The equality oracle
/// treats it as "not equal".
#[derive(Debug, thiserror::Error)]
pub enum CanonicalError {
    #[error("Value nesting exceeds {limit} levels")]
    DepthExceeded { limit: usize },

    #[error("Failed to render canonical sort key: {source}")]
    SortKey {
        #[source]
        source: serde_json::Error,
    },
}

/// A delta that does not fit the value it is applied to.
#[derive(Debug, thiserror::Error)]
pub enum PatchError {
    #[error("Cannot apply a {expected} delta to a {found}")]
    KindMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("Key {key} referenced by the delta is missing")]
    MissingKey { key: String },

    #[error("Edit script covers {expected} elements but the list has {found}")]
    ScriptLength { expected: usize, found: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum ValdiffError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Patch(#[from] PatchError),

    #[error("Invalid configuration: {message}")]
    ConfigError { message: String },
}

impl ParseError {
    pub fn file_not_found(path: impl Into<String>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    pub fn read_error(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::ReadError {
            path: path.into(),
            source,
        }
    }

    pub fn json_error(path: impl Into<String>, source: serde_json::Error) -> Self {
        Self::JsonError {
            path: path.into(),
            source,
        }
    }

    pub fn yaml_error(path: impl Into<String>, source: serde_yaml::Error) -> Self {
        Self::YamlError {
            path: path.into(),
            source,
        }
    }

    pub fn toml_error(path: impl Into<String>, source: toml::de::Error) -> Self {
        Self::TomlError {
            path: path.into(),
            source,
        }
    }

    pub fn unknown_format(path: impl Into<String>) -> Self {
        Self::UnknownFormat { path: path.into() }
    }
}

impl PatchError {
    pub fn missing_key(key: impl Into<String>) -> Self {
        Self::MissingKey { key: key.into() }
    }
}

impl ValdiffError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }
}
