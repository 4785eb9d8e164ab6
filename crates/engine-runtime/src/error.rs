use engine_core::error::ClientError;
use model::execution::operation::ScanOperation;
use thiserror::Error;

/// Errors that prevent a scan run from starting.
#[derive(Debug, Error)]
pub enum RunError {
    /// The table could not be split into scanners.
    #[error("Failed to open scanners: {0}")]
    ListScanners(#[source] ClientError),

    #[error("Operation {0} requires a geo client")]
    MissingGeoClient(ScanOperation),
}
