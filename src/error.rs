// error: failures surfaced by the engine and the frame pacer

use core::fmt;

/// Reported by a [`SampleSource`](crate::pacer::SampleSource) when the
/// upstream extractor can no longer deliver samples (camera lost, permission
/// revoked, model failure). Fatal to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AcquisitionError {
    DeviceLost,
    PermissionDenied,
    Extractor,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// `ingest` was called with no samples.
    EmptyBatch,
    /// A sample was NaN or infinite; the whole batch is rejected.
    NonFiniteSample { index: usize },
    /// A configuration value is out of range.
    InvalidConfig(&'static str),
    /// The sample source failed.
    Acquisition(AcquisitionError),
}

impl From<AcquisitionError> for Error {
    fn from(e: AcquisitionError) -> Self {
        Error::Acquisition(e)
    }
}

impl fmt::Display for AcquisitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AcquisitionError::DeviceLost => f.write_str("capture device lost"),
            AcquisitionError::PermissionDenied => f.write_str("capture permission denied"),
            AcquisitionError::Extractor => f.write_str("sample extractor failed"),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::EmptyBatch => f.write_str("empty sample batch"),
            Error::NonFiniteSample { index } => write!(f, "non-finite sample at index {}", index),
            Error::InvalidConfig(what) => write!(f, "invalid config: {}", what),
            Error::Acquisition(e) => write!(f, "acquisition failed: {}", e),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for AcquisitionError {}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

pub type Result<T> = core::result::Result<T, Error>;
