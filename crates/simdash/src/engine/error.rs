/// Failures reported by the command interpreter and the device setter.
///
/// All of them are user-facing and recoverable; state is never modified when
/// one is returned.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CommandError {
    /// A required argument is missing.
    #[error("Usage: {0}")]
    Usage(&'static str),

    /// The command exists but does not apply to the given target.
    #[error("Unsupported mode target '{0}'")]
    UnsupportedTarget(String),

    /// The target is known but the value is outside its vocabulary.
    #[error("Value for {target} must be {expected}, got '{value}'")]
    InvalidValue {
        target: String,
        expected: &'static str,
        value: String,
    },

    /// A numeric argument is outside its declared bounds (or not a number).
    #[error("{name} range {min}-{max}, got '{value}'")]
    OutOfRange {
        name: &'static str,
        min: i64,
        max: i64,
        value: String,
    },

    /// The setter does not know the target device.
    #[error("Unknown device '{0}'")]
    UnknownDevice(String),
}

/// Failures talking to a running engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("engine is not running")]
    Stopped,
}

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for EngineError {
    fn from(_: tokio::sync::mpsc::error::SendError<T>) -> Self {
        EngineError::Stopped
    }
}

impl From<tokio::sync::oneshot::error::RecvError> for EngineError {
    fn from(_: tokio::sync::oneshot::error::RecvError) -> Self {
        EngineError::Stopped
    }
}
