use std::time::Duration;

pub type InstallResult<T> = Result<T, InstallError>;

#[derive(Debug, thiserror::Error)]
pub enum InstallError {
    #[error("command failed: {command}: {output}")]
    CommandFailed { command: String, output: String },

    #[error("command timed out after {}s: {command}", timeout.as_secs())]
    CommandTimedOut { command: String, timeout: Duration },

    #[error("package manager still locked after {attempts} attempts")]
    LockContention { attempts: u32 },

    #[error("invalid {field}: {value}")]
    Invalid { field: &'static str, value: String },

    #[error("missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("this installer must be run as root (use --skip-root-check to bypass)")]
    NotRoot,

    #[error("unsupported operating system: {0}")]
    UnsupportedSystem(String),

    #[error("phase '{phase}' failed")]
    PhaseFailed {
        phase: &'static str,
        #[source]
        source: Box<InstallError>,
    },

    #[error("aborted by operator")]
    Aborted,

    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}
