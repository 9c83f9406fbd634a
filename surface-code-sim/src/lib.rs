//! # surface-code-sim
//!
//! Classical control logic for a planar surface-code experiment.
//!
//! Builds the band-by-band lattice of data and syndrome sites, drives repeated
//! rounds of stabilizer measurement against an external measurement engine,
//! and watches the resulting stream for round-over-round parity changes.
//! The engine (real hardware, a remote simulator, or the bundled Pauli-frame
//! engine) is only reached through the `MeasurementEngine` capability.
//!
//! ## Pieces
//!
//! - **Lattice**: `2h - 1` bands of data sites; syndrome sites between them
//!   alternating X / Z by band, ids contiguous with data first
//! - **Round driver**: sequential `measure` then `apply_ops` per syndrome site,
//!   `rounds * syndrome_count` steps, engine errors passed through untouched
//! - **History**: append-only results plus the previous round as baseline;
//!   any mismatch at a round boundary yields a `ParityChangeReport`
//!
//! No decoding is attempted: reports say that the pattern changed, not where
//! the error is.

pub mod driver;
pub mod error;
pub mod experiment;
pub mod frame;
pub mod history;
pub mod lattice;
pub mod protocol;
pub mod remote;


pub mod prelude {
    pub use crate::driver::*;
    pub use crate::error::*;
    pub use crate::experiment::*;
    pub use crate::frame::*;
    pub use crate::history::*;
    pub use crate::lattice::*;
    pub use crate::protocol::*;
    pub use crate::remote::*;
}
