//! Round driver: sequential, pull-based syndrome extraction.
//!
//! One run is `rounds * syndrome_count` steps. At each step the cursor yields
//! the next syndrome site (index `step % syndrome_count`), the engine measures
//! it, the bit goes into the history, and the engine is asked for operations
//! to apply before the next step. Those operations are forwarded back to the
//! engine untouched. Each step completes before the next starts.
//!
//! The only normal exit is cursor exhaustion. Engine failures propagate as
//! `DriverError::Engine` with no retry; an optional `CancelToken` is checked
//! at step boundaries.

use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, trace};

use crate::error::DriverError;
use crate::history::{HistoryRetention, ParityChangeReport, SyndromeHistory};
use crate::lattice::Lattice;
use crate::protocol::{Operation, SyndromeRequest};

/// Capability implemented by whatever performs the physical measurements.
pub trait MeasurementEngine {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Measure one stabilizer and return its outcome bit.
    fn measure(&mut self, request: &SyndromeRequest<'_>) -> Result<bool, Self::Error>;

    /// Operations to apply to data sites before the next step. May be empty.
    fn apply_ops(&mut self) -> Result<Vec<Operation>, Self::Error>;

    /// Receive the operations returned by `apply_ops`.
    fn execute(&mut self, ops: &[Operation]) -> Result<(), Self::Error> {
        let _ = ops;
        Ok(())
    }
}

impl<T: MeasurementEngine + ?Sized> MeasurementEngine for &mut T {
    type Error = T::Error;

    fn measure(&mut self, request: &SyndromeRequest<'_>) -> Result<bool, Self::Error> {
        (**self).measure(request)
    }

    fn apply_ops(&mut self) -> Result<Vec<Operation>, Self::Error> {
        (**self).apply_ops()
    }

    fn execute(&mut self, ops: &[Operation]) -> Result<(), Self::Error> {
        (**self).execute(ops)
    }
}

/// Engine assembled from a `measure` closure and an `apply_ops` closure.
pub struct FnEngine<M, A, E> {
    measure: M,
    apply_ops: A,
    _error: PhantomData<fn() -> E>,
}

impl<M, A, E> FnEngine<M, A, E>
where
    M: FnMut(&SyndromeRequest<'_>) -> Result<bool, E>,
    A: FnMut() -> Result<Vec<Operation>, E>,
{
    pub fn new(measure: M, apply_ops: A) -> Self {
        Self {
            measure,
            apply_ops,
            _error: PhantomData,
        }
    }
}

impl<M, A, E> MeasurementEngine for FnEngine<M, A, E>
where
    M: FnMut(&SyndromeRequest<'_>) -> Result<bool, E>,
    A: FnMut() -> Result<Vec<Operation>, E>,
    E: std::error::Error + Send + Sync + 'static,
{
    type Error = E;

    fn measure(&mut self, request: &SyndromeRequest<'_>) -> Result<bool, E> {
        (self.measure)(request)
    }

    fn apply_ops(&mut self) -> Result<Vec<Operation>, E> {
        (self.apply_ops)()
    }
}

/// Cooperative cancellation flag, checked by the driver between steps.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Configuration for one run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Number of full measurement rounds.
    pub total_rounds: usize,
    /// How much raw history to keep.
    pub retention: HistoryRetention,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            total_rounds: 10,
            retention: HistoryRetention::Full,
        }
    }
}

/// Position of the driver in the syndrome enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundCursor {
    step: usize,
    total_rounds: usize,
    syndrome_count: usize,
}

impl RoundCursor {
    pub fn new(total_rounds: usize, syndrome_count: usize) -> Self {
        Self {
            step: 0,
            total_rounds,
            syndrome_count,
        }
    }

    /// Steps issued so far.
    pub fn step(&self) -> usize {
        self.step
    }

    /// Total number of steps in the run, saturating at `usize::MAX`.
    pub fn total_steps(&self) -> usize {
        self.total_rounds.saturating_mul(self.syndrome_count)
    }

    /// Syndrome index the next request will carry.
    pub fn next_index(&self) -> usize {
        if self.syndrome_count == 0 {
            0
        } else {
            self.step % self.syndrome_count
        }
    }

    /// Round the next request belongs to.
    pub fn round(&self) -> usize {
        if self.syndrome_count == 0 {
            0
        } else {
            self.step / self.syndrome_count
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.syndrome_count == 0 || self.round() >= self.total_rounds
    }

    /// Next syndrome to measure, or `None` once every round is done.
    pub fn next_request<'a>(&mut self, lattice: &'a Lattice) -> Option<SyndromeRequest<'a>> {
        if self.is_exhausted() {
            return None;
        }
        let index = self.next_index();
        let round = self.round();
        let site = lattice.syndrome(index)?;
        self.step += 1;
        Some(SyndromeRequest::new(index, round, site))
    }

    /// Wire form of `next_request`: the empty sequence ends the run.
    pub fn next_wire(&mut self, lattice: &Lattice) -> Vec<i64> {
        self.next_request(lattice)
            .map(|req| req.encode())
            .unwrap_or_default()
    }

    /// Rewind to the first step.
    pub fn reset(&mut self) {
        self.step = 0;
    }
}

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Rounds completed.
    pub rounds: usize,
    /// Number of `measure` calls.
    pub measurements: usize,
    /// Number of `apply_ops` calls.
    pub ops_requests: usize,
    /// Total operations forwarded to the engine.
    pub ops_forwarded: usize,
    /// Parity changes, in round order.
    pub reports: Vec<ParityChangeReport>,
    pub history: SyndromeHistory,
}

/// Drives measurement rounds over a shared, read-only lattice.
#[derive(Debug, Clone)]
pub struct RoundDriver<'a> {
    lattice: &'a Lattice,
    config: RunConfig,
    cancel: Option<CancelToken>,
}

impl<'a> RoundDriver<'a> {
    pub fn new(lattice: &'a Lattice, config: RunConfig) -> Self {
        Self {
            lattice,
            config,
            cancel: None,
        }
    }

    /// Observe `token` at every step boundary.
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn lattice(&self) -> &'a Lattice {
        self.lattice
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    fn cancelled(&self) -> bool {
        self.cancel.as_ref().map_or(false, CancelToken::is_cancelled)
    }

    /// Run every round against `engine`.
    pub fn run<E: MeasurementEngine>(
        &self,
        mut engine: E,
    ) -> Result<RunOutcome, DriverError<E::Error>> {
        let syndrome_count = self.lattice.syndrome_count();
        let mut cursor = RoundCursor::new(self.config.total_rounds, syndrome_count);
        let mut history = SyndromeHistory::with_retention(syndrome_count, self.config.retention);
        let mut reports = Vec::new();
        let mut ops_requests = 0;
        let mut ops_forwarded = 0;

        debug!(
            "starting run: {} rounds x {} syndromes",
            self.config.total_rounds, syndrome_count
        );

        while !cursor.is_exhausted() {
            if self.cancelled() {
                debug!("run cancelled at step {}", cursor.step());
                return Err(DriverError::Cancelled { step: cursor.step() });
            }
            let Some(request) = cursor.next_request(self.lattice) else {
                break;
            };

            let bit = engine.measure(&request).map_err(DriverError::Engine)?;
            trace!(
                "round {} syndrome {} ({:?}) -> {}",
                request.round,
                request.index,
                request.kind,
                bit as u8
            );
            if let Some(report) = history.record(bit) {
                reports.push(report);
            }

            let ops = engine.apply_ops().map_err(DriverError::Engine)?;
            ops_requests += 1;
            if !ops.is_empty() {
                trace!("forwarding {} operation(s)", ops.len());
                engine.execute(&ops).map_err(DriverError::Engine)?;
                ops_forwarded += ops.len();
            }
        }

        debug!(
            "run finished: {} measurements, {} parity change(s)",
            history.len(),
            reports.len()
        );

        Ok(RunOutcome {
            rounds: history.rounds_completed(),
            measurements: history.len(),
            ops_requests,
            ops_forwarded,
            reports,
            history,
        })
    }
}

/// Run `total_rounds` rounds with closure-supplied engine capabilities.
pub fn run_rounds<M, A, E>(
    lattice: &Lattice,
    total_rounds: usize,
    measure: M,
    apply_ops: A,
) -> Result<RunOutcome, DriverError<E>>
where
    M: FnMut(&SyndromeRequest<'_>) -> Result<bool, E>,
    A: FnMut() -> Result<Vec<Operation>, E>,
    E: std::error::Error + Send + Sync + 'static,
{
    let config = RunConfig {
        total_rounds,
        ..RunConfig::default()
    };
    RoundDriver::new(lattice, config).run(FnEngine::new(measure, apply_ops))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;
    use std::fmt;

    #[derive(Debug)]
    struct EngineDown;

    impl fmt::Display for EngineDown {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "engine down")
        }
    }

    impl std::error::Error for EngineDown {}

    #[test]
    fn test_call_counts_and_order() {
        let lat = Lattice::build(3, 3).unwrap();
        let mut seen = Vec::new();
        let mut apply_calls = 0;
        let outcome = run_rounds(
            &lat,
            3,
            |req| {
                seen.push((req.index, req.round));
                Ok::<_, Infallible>(false)
            },
            || {
                apply_calls += 1;
                Ok(vec![])
            },
        )
        .unwrap();

        let n = lat.syndrome_count();
        assert_eq!(seen.len(), 3 * n);
        assert_eq!(apply_calls, 3 * n);
        let expected: Vec<_> = (0..3).flat_map(|r| (0..n).map(move |i| (i, r))).collect();
        assert_eq!(seen, expected);
        assert_eq!(outcome.rounds, 3);
        assert_eq!(outcome.measurements, 3 * n);
        assert_eq!(outcome.ops_requests, 3 * n);
        assert!(outcome.reports.is_empty());
    }

    #[test]
    fn test_request_carries_site_topology() {
        let lat = Lattice::build(4, 3).unwrap();
        run_rounds(
            &lat,
            1,
            |req| {
                let site = lat.syndrome(req.index).unwrap();
                assert_eq!(req.site, site.id);
                assert_eq!(req.kind, site.kind);
                assert_eq!(req.data, site.data.as_slice());
                Ok::<_, Infallible>(false)
            },
            || Ok(vec![]),
        )
        .unwrap();
    }

    #[test]
    fn test_engine_failure_propagates_unchanged() {
        let lat = Lattice::build(2, 2).unwrap();
        let mut calls = 0;
        let err = run_rounds(
            &lat,
            5,
            |_| {
                calls += 1;
                if calls == 3 {
                    Err(EngineDown)
                } else {
                    Ok(false)
                }
            },
            || Ok(vec![]),
        )
        .unwrap_err();
        assert!(matches!(err, DriverError::Engine(EngineDown)));
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_huge_round_count_runs_until_engine_fails() {
        let lat = Lattice::build(3, 3).unwrap();
        let mut calls = 0;
        let err = run_rounds(
            &lat,
            usize::MAX,
            |_| {
                calls += 1;
                if calls > 30 {
                    Err(EngineDown)
                } else {
                    Ok(false)
                }
            },
            || Ok(vec![]),
        )
        .unwrap_err();
        assert!(matches!(err, DriverError::Engine(EngineDown)));
        assert_eq!(calls, 31);
    }

    #[test]
    fn test_cursor_step_count_saturates() {
        let cursor = RoundCursor::new(usize::MAX, 12);
        assert_eq!(cursor.total_steps(), usize::MAX);
        assert!(!cursor.is_exhausted());

        let mut empty = RoundCursor::new(3, 0);
        assert!(empty.is_exhausted());
        assert_eq!(empty.total_steps(), 0);
        let lat = Lattice::build(2, 2).unwrap();
        assert!(empty.next_request(&lat).is_none());
    }

    #[test]
    fn test_apply_ops_failure_stops_run() {
        let lat = Lattice::build(2, 2).unwrap();
        let mut measured = 0;
        let err = run_rounds(
            &lat,
            2,
            |_| {
                measured += 1;
                Ok(false)
            },
            || Err(EngineDown),
        )
        .unwrap_err();
        assert!(err.into_engine_error().is_some());
        assert_eq!(measured, 1);
    }

    #[test]
    fn test_forwarded_ops_counted() {
        let lat = Lattice::build(2, 2).unwrap();
        let outcome = run_rounds(
            &lat,
            2,
            |_| Ok::<_, Infallible>(false),
            || Ok(vec![Operation::x(0), Operation::z(1)]),
        )
        .unwrap();
        assert_eq!(outcome.ops_forwarded, 2 * 2 * lat.syndrome_count());
    }

    #[test]
    fn test_parity_change_reported_through_driver() {
        let lat = Lattice::build(3, 3).unwrap();
        let outcome = run_rounds(
            &lat,
            4,
            |req| Ok::<_, Infallible>(req.round >= 2 && req.index == 7),
            || Ok(vec![]),
        )
        .unwrap();
        assert_eq!(outcome.reports.len(), 1);
        assert_eq!(outcome.reports[0].round, 2);
        assert_eq!(outcome.reports[0].flipped_indices(), vec![7]);
    }

    #[test]
    fn test_zero_rounds_never_calls_engine() {
        let lat = Lattice::build(3, 3).unwrap();
        let outcome = run_rounds(
            &lat,
            0,
            |_| -> Result<bool, Infallible> { panic!("measure called") },
            || -> Result<Vec<Operation>, Infallible> { panic!("apply_ops called") },
        )
        .unwrap();
        assert_eq!(outcome.measurements, 0);
    }

    #[test]
    fn test_cancel_at_step_boundary() {
        let lat = Lattice::build(3, 3).unwrap();
        let token = CancelToken::new();
        let trigger = token.clone();
        let mut measured = 0;
        let engine = FnEngine::new(
            |_: &SyndromeRequest<'_>| {
                measured += 1;
                if measured == 5 {
                    trigger.cancel();
                }
                Ok::<_, Infallible>(false)
            },
            || Ok(vec![]),
        );
        let driver = RoundDriver::new(&lat, RunConfig::default()).with_cancel(token);
        let err = driver.run(engine).unwrap_err();
        assert!(matches!(err, DriverError::Cancelled { step: 5 }));
    }

    #[test]
    fn test_cursor_wire_terminates_with_empty() {
        let lat = Lattice::build(2, 2).unwrap();
        let mut cursor = RoundCursor::new(1, lat.syndrome_count());
        let mut requests = Vec::new();
        loop {
            let wire = cursor.next_wire(&lat);
            if wire.is_empty() {
                break;
            }
            requests.push(wire);
        }
        assert_eq!(requests.len(), lat.syndrome_count());
        assert_eq!(requests[0][0], 1);
        assert!(cursor.is_exhausted());
        assert!(cursor.next_wire(&lat).is_empty());

        cursor.reset();
        assert_eq!(cursor.step(), 0);
        assert_eq!(cursor.next_wire(&lat), requests[0]);
    }
}
