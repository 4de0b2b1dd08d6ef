use thiserror::Error;

/// Main error type for the FunTune system
#[derive(Error, Debug)]
pub enum TuneError {
    /// The simulator failed while playing one repetition of a trial. This
    /// aborts the whole tuning run.
    #[error("Simulator error in trial {trial_id}, repetition {repetition}: {source}")]
    Simulator {
        trial_id: String,
        repetition: usize,
        #[source]
        source: anyhow::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl TuneError {
    pub fn simulator(trial_id: impl Into<String>, repetition: usize, source: anyhow::Error) -> Self {
        Self::Simulator {
            trial_id: trial_id.into(),
            repetition,
            source,
        }
    }

    /// True when the error came from the simulator rather than from the engine.
    pub fn is_simulator_failure(&self) -> bool {
        matches!(self, Self::Simulator { .. })
    }
}

/// Result type alias for FunTune operations
pub type TuneResult<T> = Result<T, TuneError>;

/// Macro for creating validation errors
#[macro_export]
macro_rules! validation_error {
    ($($arg:tt)*) => {
        $crate::TuneError::Validation(format!($($arg)*))
    };
}

/// Macro for creating configuration errors
#[macro_export]
macro_rules! config_error {
    ($($arg:tt)*) => {
        $crate::TuneError::Config(format!($($arg)*))
    };
}
