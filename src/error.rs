use thiserror::Error;

/// Top-level error for the `kview` binary (message plus process exit code).
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// Failures reported by the binding engine.
///
/// Each variant has a fixed blast radius: `Instantiation` and
/// `ConfigResolution` exclude one model, `Evaluation` drops one figure row,
/// and the lookup variants reject one UI event. None of them abort a build.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("could not instantiate model '{model}': {reason}")]
    Instantiation { model: String, reason: String },

    #[error("could not resolve plot domains for '{model}.{variable}': {reason}")]
    ConfigResolution {
        model: String,
        variable: String,
        reason: String,
    },

    #[error("could not plot '{model}.{variable}' with {params}: {reason}")]
    Evaluation {
        model: String,
        variable: String,
        /// Human-readable summary of the sampling that was used.
        params: String,
        reason: String,
    },

    #[error("invalid domain: {0}")]
    InvalidDomain(String),

    #[error("unknown model '{0}'")]
    UnknownModel(String),

    #[error("model '{model}' has no plottable variable '{variable}'")]
    UnknownVariable { model: String, variable: String },

    #[error("variable '{model}.{variable}' has no parameter '{param}'")]
    UnknownParameter {
        model: String,
        variable: String,
        param: String,
    },
}

impl EngineError {
    /// Model the failure belongs to, when it is scoped to one.
    pub fn model(&self) -> Option<&str> {
        match self {
            EngineError::Instantiation { model, .. }
            | EngineError::ConfigResolution { model, .. }
            | EngineError::Evaluation { model, .. }
            | EngineError::UnknownVariable { model, .. }
            | EngineError::UnknownParameter { model, .. } => Some(model),
            EngineError::UnknownModel(model) => Some(model),
            EngineError::InvalidDomain(_) => None,
        }
    }
}
