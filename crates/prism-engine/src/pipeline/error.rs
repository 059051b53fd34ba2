use thiserror::Error;

use crate::vertex::LayoutError;

use super::{ShaderStage, Topology};

/// Shader compilation/linking failure, carrying the backend's diagnostic
/// text verbatim.
#[derive(Debug, Clone, Error)]
pub enum ShaderError {
    /// A single stage failed to compile.
    #[error("{stage} shader failed to compile: {log}")]
    Compile { stage: ShaderStage, log: String },

    /// Stages compiled but failed to combine into a program.
    #[error("shader program failed to link: {log}")]
    Link { log: String },
}

/// Pipeline construction failure.
///
/// Construction aborts on the first error and releases any partially created
/// backend resources; a failed pipeline is never observable.
#[derive(Debug, Clone, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Shader(#[from] ShaderError),

    #[error(transparent)]
    Layout(#[from] LayoutError),

    /// The backend has no equivalent primitive for the requested topology.
    #[error("topology {topology:?} is not supported by this backend")]
    UnsupportedTopology { topology: Topology },

    /// The backend refused to create a required object (program, vertex
    /// array). Rare outside of a lost context.
    #[error("backend object creation failed: {reason}")]
    Backend { reason: String },
}
