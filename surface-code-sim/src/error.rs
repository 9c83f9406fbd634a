//! Error taxonomy for lattice construction, the engine boundary and the round driver.

use thiserror::Error;

use crate::lattice::DataSiteId;

/// Errors raised while building a lattice.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LatticeError {
    #[error("invalid lattice dimension {width}x{height}: width and height must both be at least 2")]
    InvalidDimension { width: usize, height: usize },
}

/// Errors raised while decoding integer-tagged values from the engine boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("unknown Pauli tag {0} (expected 1, 2 or 3)")]
    UnknownPauliTag(i64),

    #[error("operation stream has odd length {0}; expected (kind, site) pairs")]
    OddOperationStream(usize),

    #[error("negative data site index {0}")]
    NegativeSite(i64),
}

/// Errors surfaced by a round driver run.
///
/// Engine failures are carried unchanged; the driver never retries.
#[derive(Error, Debug)]
pub enum DriverError<E>
where
    E: std::error::Error + 'static,
{
    #[error("measurement engine failed: {0}")]
    Engine(#[source] E),

    #[error("run cancelled at step {step}")]
    Cancelled { step: usize },
}

impl<E> DriverError<E>
where
    E: std::error::Error + 'static,
{
    /// The engine failure, if this error came from the engine.
    pub fn into_engine_error(self) -> Option<E> {
        match self {
            DriverError::Engine(e) => Some(e),
            DriverError::Cancelled { .. } => None,
        }
    }
}

/// Errors raised by the Pauli-frame reference engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("data site {site} out of range (lattice has {data_count} data sites)")]
    UnknownDataSite { site: DataSiteId, data_count: usize },
}

/// Errors raised by the channel-backed engine handle.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("engine worker disconnected")]
    Disconnected,

    #[error("remote engine failed: {0}")]
    Engine(String),

    #[error("unexpected reply from engine worker")]
    UnexpectedReply,
}

/// Errors raised by a detection experiment.
#[derive(Error, Debug)]
pub enum ExperimentError {
    #[error(transparent)]
    Lattice(#[from] LatticeError),

    #[error(transparent)]
    Driver(#[from] DriverError<FrameError>),
}
