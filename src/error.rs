/// Error types for configuration and resource graph construction
use thiserror::Error;

use crate::graph::ResourceId;

/// Errors raised before anything is handed to the provisioning engine
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration file could not be read
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file is not valid YAML or has the wrong shape
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// Configuration parsed but violates an authoring rule
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Two clusters share a table key
    #[error("duplicate cluster name: {0}")]
    DuplicateCluster(String),

    /// Two environment variables in one container share a name
    #[error("cluster {cluster}: container {container} declares {name} more than once")]
    DuplicateEnvVar {
        cluster: String,
        container: String,
        name: String,
    },

    /// Two declarations share a logical id
    #[error("resource {0} is declared twice")]
    DuplicateResource(ResourceId),

    /// A declaration names a prerequisite or reference that was not declared before it
    #[error("resource {resource} depends on undeclared resource {missing}")]
    UnknownDependency {
        resource: ResourceId,
        missing: ResourceId,
    },

    /// User data template failed to render
    #[error("failed to render template: {0}")]
    Render(#[from] handlebars::RenderError),
}

/// Result type for configuration and graph operations
pub type Result<T> = std::result::Result<T, Error>;
