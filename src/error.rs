use std::path::PathBuf;
use std::process::ExitStatus;

pub type BoxedIncludeProviderError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, thiserror::Error)]
pub enum PreviewError {
    /// A texture, shader or include name has no matching lump
    #[error("no lump matches {name:?}")]
    Resolution { name: String },

    /// A hardware shader block that cannot be turned into a definition
    #[error("malformed shader definition for {texture:?}: {reason}")]
    MalformedDefinition { texture: String, reason: String },

    /// The external viewer executable could not be found
    #[error("shader viewer {name:?} was not found")]
    ExternalToolMissing { name: String },

    /// The viewer could not be started
    #[error("failed to launch {program:?}")]
    ProcessLaunch {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The viewer ran but reported failure
    #[error("{program:?} exited with {status}")]
    ProcessFailed { program: PathBuf, status: ExitStatus },

    /// Arguments were requested for a definition with no generated shader
    #[error("shader {identifier:?} has not been rewritten yet")]
    NotRewritten { identifier: String },

    #[error("cannot parse {value:?} as a {ty} value")]
    InvalidUniformValue { value: String, ty: String },

    #[error("i/o error on {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to walk the mod directory")]
    Walk(#[from] walkdir::Error),
}

impl PreviewError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PreviewError::Io {
            path: path.into(),
            source,
        }
    }
}
