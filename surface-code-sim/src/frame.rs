//! Classical Pauli-frame engine for exercising the round protocol.
//!
//! Instead of a 2^n state vector, errors are tracked as two bit vectors over
//! the data sites (the Pauli frame). An `XType` stabilizer flips when an odd
//! number of its data sites carry a Z error; a `ZType` stabilizer flips on an
//! odd number of X errors. Y toggles both frames.
//!
//! Operations come from an `OperationSource`: nothing, a fixed script, or
//! seeded depolarizing noise so runs are reproducible.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::driver::MeasurementEngine;
use crate::error::FrameError;
use crate::lattice::{DataSiteId, Lattice, StabilizerKind};
use crate::protocol::{Operation, Pauli, SyndromeRequest};

/// X and Z error frames over the data sites of a lattice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PauliFrame {
    x_errors: Vec<bool>,
    z_errors: Vec<bool>,
}

impl PauliFrame {
    /// Clean frame over `data_count` data sites.
    pub fn new(data_count: usize) -> Self {
        Self {
            x_errors: vec![false; data_count],
            z_errors: vec![false; data_count],
        }
    }

    /// Clean frame sized for `lattice`.
    pub fn for_lattice(lattice: &Lattice) -> Self {
        Self::new(lattice.data_count())
    }

    pub fn data_count(&self) -> usize {
        self.x_errors.len()
    }

    fn index(&self, site: DataSiteId) -> Result<usize, FrameError> {
        if site.0 < self.data_count() {
            Ok(site.0)
        } else {
            Err(FrameError::UnknownDataSite {
                site,
                data_count: self.data_count(),
            })
        }
    }

    /// Apply (toggle) one operation.
    pub fn apply(&mut self, op: Operation) -> Result<(), FrameError> {
        let idx = self.index(op.target)?;
        match op.kind {
            Pauli::X => self.x_errors[idx] ^= true,
            Pauli::Z => self.z_errors[idx] ^= true,
            Pauli::Y => {
                self.x_errors[idx] ^= true;
                self.z_errors[idx] ^= true;
            }
        }
        Ok(())
    }

    pub fn has_x_error(&self, site: DataSiteId) -> bool {
        self.x_errors.get(site.0).copied().unwrap_or(false)
    }

    pub fn has_z_error(&self, site: DataSiteId) -> bool {
        self.z_errors.get(site.0).copied().unwrap_or(false)
    }

    /// Outcome of measuring a `kind` stabilizer over `data`.
    pub fn parity(&self, kind: StabilizerKind, data: &[DataSiteId]) -> Result<bool, FrameError> {
        let frame = match kind {
            StabilizerKind::XType => &self.z_errors,
            StabilizerKind::ZType => &self.x_errors,
        };
        let mut parity = false;
        for &site in data {
            parity ^= frame[self.index(site)?];
        }
        Ok(parity)
    }

    /// Raw X error frame (read-only).
    pub fn x_errors(&self) -> &[bool] {
        &self.x_errors
    }

    /// Raw Z error frame (read-only).
    pub fn z_errors(&self) -> &[bool] {
        &self.z_errors
    }

    /// Number of data sites carrying any error.
    pub fn weight(&self) -> usize {
        self.x_errors
            .iter()
            .zip(&self.z_errors)
            .filter(|&(&x, &z)| x || z)
            .count()
    }

    /// Reset all errors to clean state.
    pub fn clear(&mut self) {
        self.x_errors.iter_mut().for_each(|e| *e = false);
        self.z_errors.iter_mut().for_each(|e| *e = false);
    }
}

/// Supplies the operations applied after each measurement step.
pub trait OperationSource {
    /// Operations to apply after step `step` (zero-based).
    fn next_ops(&mut self, step: usize) -> Vec<Operation>;
}

/// Never applies anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOps;

impl OperationSource for NoOps {
    fn next_ops(&mut self, _step: usize) -> Vec<Operation> {
        Vec::new()
    }
}

/// Fixed operations keyed by step.
#[derive(Debug, Clone, Default)]
pub struct ScriptedOps {
    script: BTreeMap<usize, Vec<Operation>>,
}

impl ScriptedOps {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `op` after step `step`.
    pub fn at(mut self, step: usize, op: Operation) -> Self {
        self.script.entry(step).or_default().push(op);
        self
    }
}

impl OperationSource for ScriptedOps {
    fn next_ops(&mut self, step: usize) -> Vec<Operation> {
        self.script.remove(&step).unwrap_or_default()
    }
}

/// Independent depolarizing noise: after every step each data site suffers a
/// uniformly random X, Y or Z with probability `p`.
#[derive(Debug, Clone)]
pub struct DepolarizingNoise {
    p: f64,
    data_count: usize,
    rng: StdRng,
}

impl DepolarizingNoise {
    pub fn new(p: f64, data_count: usize, seed: u64) -> Self {
        Self {
            p: p.clamp(0.0, 1.0),
            data_count,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn for_lattice(lattice: &Lattice, p: f64, seed: u64) -> Self {
        Self::new(p, lattice.data_count(), seed)
    }

    pub fn probability(&self) -> f64 {
        self.p
    }
}

impl OperationSource for DepolarizingNoise {
    fn next_ops(&mut self, _step: usize) -> Vec<Operation> {
        let mut ops = Vec::new();
        for site in 0..self.data_count {
            if self.rng.gen::<f64>() < self.p {
                let kind = match self.rng.gen_range(0..3) {
                    0 => Pauli::X,
                    1 => Pauli::Y,
                    _ => Pauli::Z,
                };
                ops.push(Operation::new(kind, DataSiteId(site)));
            }
        }
        ops
    }
}

/// Reference engine: measures stabilizers against a Pauli frame and applies
/// whatever its operation source produces.
#[derive(Debug, Clone)]
pub struct PauliFrameEngine<S> {
    frame: PauliFrame,
    source: S,
    step: usize,
}

impl<S: OperationSource> PauliFrameEngine<S> {
    pub fn new(lattice: &Lattice, source: S) -> Self {
        Self {
            frame: PauliFrame::for_lattice(lattice),
            source,
            step: 0,
        }
    }

    pub fn frame(&self) -> &PauliFrame {
        &self.frame
    }

    pub fn frame_mut(&mut self) -> &mut PauliFrame {
        &mut self.frame
    }

    /// Number of `apply_ops` calls served.
    pub fn steps(&self) -> usize {
        self.step
    }
}

impl PauliFrameEngine<NoOps> {
    /// Noise-free engine.
    pub fn clean(lattice: &Lattice) -> Self {
        Self::new(lattice, NoOps)
    }
}

impl<S: OperationSource> MeasurementEngine for PauliFrameEngine<S> {
    type Error = FrameError;

    fn measure(&mut self, request: &SyndromeRequest<'_>) -> Result<bool, FrameError> {
        self.frame.parity(request.kind, request.data)
    }

    fn apply_ops(&mut self) -> Result<Vec<Operation>, FrameError> {
        let ops = self.source.next_ops(self.step);
        self.step += 1;
        Ok(ops)
    }

    fn execute(&mut self, ops: &[Operation]) -> Result<(), FrameError> {
        ops.iter().try_for_each(|&op| self.frame.apply(op))
    }
}
