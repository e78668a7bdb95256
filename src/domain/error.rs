//! Domain error types.

/// Top-level error type for tradesight.
///
/// Indicator math never raises: division-by-zero and unfilled windows
/// propagate as `None` values. Only the variants below are thrown.
#[derive(Debug, thiserror::Error)]
pub enum TradesightError {
    #[error("insufficient data: have {bars} bars, need {minimum}")]
    InsufficientData { bars: usize, minimum: usize },

    #[error("unsupported template: {name}")]
    UnsupportedTemplate { name: String },

    #[error("invalid parameter {key}: {reason}")]
    InvalidParameters { key: String, reason: String },

    #[error("data fetch failed: {reason}")]
    DataFetch { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&TradesightError> for std::process::ExitCode {
    fn from(err: &TradesightError) -> Self {
        let code: u8 = match err {
            TradesightError::Io(_) => 1,
            TradesightError::ConfigParse { .. }
            | TradesightError::ConfigInvalid { .. } => 2,
            TradesightError::UnsupportedTemplate { .. }
            | TradesightError::InvalidParameters { .. } => 3,
            TradesightError::InsufficientData { .. } => 4,
            TradesightError::DataFetch { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
