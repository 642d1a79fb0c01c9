use thiserror::Error;

/// Errors produced by the prediction pipeline.
///
/// Every stage of the inference and training pipelines returns one of these.
/// The HTTP layer maps them to status codes through [`PipelineError::kind`].
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("No data returned for this symbol")]
    NoData,

    #[error("No data returned for this symbol (timed out after {timeout_ms}ms)")]
    FetchTimeout { timeout_ms: u64 },

    #[error("Close price not found")]
    MissingClose,

    #[error("Not enough valid price data: need {required}, got {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("Invalid price range: max {max} <= min {min}")]
    DegenerateRange { min: f64, max: f64 },

    #[error("{0}")]
    Unexpected(String),
}

/// Coarse error categories exposed to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NoData,
    InsufficientData,
    DegenerateRange,
    Unexpected,
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::NoData
            | PipelineError::FetchTimeout { .. }
            | PipelineError::MissingClose => ErrorKind::NoData,
            PipelineError::InsufficientData { .. } => ErrorKind::InsufficientData,
            PipelineError::DegenerateRange { .. } => ErrorKind::DegenerateRange,
            PipelineError::Unexpected(_) => ErrorKind::Unexpected,
        }
    }

    /// Validation failures the caller can fix by asking for something else.
    pub fn is_client_error(&self) -> bool {
        self.kind() != ErrorKind::Unexpected
    }
}

/// Errors raised by the market data collaborator.
#[derive(Debug, Error)]
pub enum MarketDataError {
    #[error("Market data request failed for {symbol}: {reason}")]
    RequestFailed { symbol: String, reason: String },

    #[error("Market data provider returned HTTP {status} for {symbol}")]
    HttpStatus { symbol: String, status: u16 },

    #[error("Invalid market data for {symbol}: {reason}")]
    InvalidData { symbol: String, reason: String },
}

/// Errors raised while invoking a trained predictor.
#[derive(Debug, Error)]
pub enum PredictorError {
    #[error("{model}: expected a window of {expected} values, got {actual}")]
    WindowLength {
        model: String,
        expected: usize,
        actual: usize,
    },

    #[error("{model}: training failed: {reason}")]
    Training { model: String, reason: String },

    #[error("{model}: inference failed: {reason}")]
    Inference { model: String, reason: String },

    #[error("{model}: invalid model artifact: {reason}")]
    InvalidArtifact { model: String, reason: String },

    #[error("{model}: produced a non-finite output")]
    NonFinite { model: String },
}

impl From<MarketDataError> for PipelineError {
    fn from(err: MarketDataError) -> Self {
        PipelineError::Unexpected(err.to_string())
    }
}

impl From<PredictorError> for PipelineError {
    fn from(err: PredictorError) -> Self {
        PipelineError::Unexpected(err.to_string())
    }
}
