use thiserror::Error;

#[derive(Error, Debug)]
pub enum BqFlowError {
    #[error("Invalid version: {0}")]
    InvalidVersion(String),

    #[error("Invalid start time: {0}")]
    InvalidStartTime(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Multiple partitioning definitions: {0}")]
    MultiPartitioning(String),

    #[error("Cluster error: {0}")]
    Cluster(String),

    #[error("Unsupported type: {0}")]
    UnsupportedType(String),

    #[error("Unsupported mode: {0}")]
    UnsupportedMode(String),

    #[error("Name too long: {0}")]
    NameTooLong(String),

    #[error("Conflicting name: {0}")]
    ConflictingName(String),

    #[error("Stage not found: {0}")]
    StageNotFound(String),

    #[error("Invalid requirement: {0}")]
    InvalidRequirement(String),

    #[error("Wrong builder signature: {0}")]
    WrongSignature(String),

    #[error("Entity type not valid: {0}")]
    NotParametrized(String),

    #[error("Unknown trigger type: {0}")]
    UnknownTrigger(String),

    #[error("Invalid dictionary: {0}")]
    InvalidDict(String),

    #[error("Definition file not found: {0}")]
    DefinitionFileNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BqFlowError>;
