use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("duplicate class qualified name: {0}")]
    DuplicateClass(String),

    #[error("group {group} references unknown class {qname}")]
    UnknownClass { group: String, qname: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid skip pattern {pattern:?}: {source}")]
    InvalidSkipPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid numeric type convention {0:?}, expected Prefix[a:b.c:d]")]
    InvalidNumericConvention(String),

    #[error("failed to read config {path}: {message}")]
    Read { path: String, message: String },
}

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("render failed: {0}")]
    Render(String),
}
