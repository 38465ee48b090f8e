//! Uniform outcome of one watermark request.

use super::{Raster, WatermarkError};

/// Status used when a failure carries no hint of its own.
pub const DEFAULT_FAILURE_STATUS: u16 = 500;

/// Terminal result produced once per request.
#[derive(Debug)]
pub enum OperationResult {
    Success(Raster),
    Failed(WatermarkError),
}

impl OperationResult {
    pub fn is_success(&self) -> bool {
        matches!(self, OperationResult::Success(_))
    }

    pub fn raster(&self) -> Option<&Raster> {
        match self {
            OperationResult::Success(raster) => Some(raster),
            OperationResult::Failed(_) => None,
        }
    }

    pub fn into_raster(self) -> Option<Raster> {
        match self {
            OperationResult::Success(raster) => Some(raster),
            OperationResult::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&WatermarkError> {
        match self {
            OperationResult::Success(_) => None,
            OperationResult::Failed(err) => Some(err),
        }
    }

    pub fn error_message(&self) -> Option<String> {
        self.error().map(ToString::to_string)
    }

    pub fn status_hint(&self) -> Option<u16> {
        self.error().and_then(WatermarkError::status_hint)
    }

    /// Status for a failed result, defaulting to 500 when no hint is present.
    pub fn status_code(&self) -> Option<u16> {
        self.error()
            .map(|err| err.status_hint().unwrap_or(DEFAULT_FAILURE_STATUS))
    }

    pub fn into_result(self) -> Result<Raster, WatermarkError> {
        self.into()
    }
}

impl From<Result<Raster, WatermarkError>> for OperationResult {
    fn from(result: Result<Raster, WatermarkError>) -> Self {
        match result {
            Ok(raster) => OperationResult::Success(raster),
            Err(err) => OperationResult::Failed(err),
        }
    }
}

impl From<WatermarkError> for OperationResult {
    fn from(err: WatermarkError) -> Self {
        OperationResult::Failed(err)
    }
}

impl From<OperationResult> for Result<Raster, WatermarkError> {
    fn from(result: OperationResult) -> Self {
        match result {
            OperationResult::Success(raster) => Ok(raster),
            OperationResult::Failed(err) => Err(err),
        }
    }
}
