//! Repeated noisy runs over one shared lattice.
//!
//! Each trial drives `rounds` rounds against its own Pauli-frame engine fed by
//! seeded depolarizing noise, and records how many parity changes the detector
//! reported. Trials share a single `&Lattice`; with the `parallel` feature
//! they run on the rayon thread pool.
//!
//! Trial `t` uses seed `seed + t` (wrapping), so a configuration always
//! reproduces the same result regardless of scheduling.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use log::debug;

use crate::driver::{RoundDriver, RunConfig};
use crate::error::ExperimentError;
use crate::frame::{DepolarizingNoise, PauliFrameEngine};
use crate::history::HistoryRetention;
use crate::lattice::Lattice;

/// Configuration for a detection experiment.
#[derive(Debug, Clone)]
pub struct ExperimentConfig {
    /// Data sites per full row.
    pub width: usize,
    /// Number of full rows.
    pub height: usize,
    /// Measurement rounds per trial.
    pub rounds: usize,
    /// Per-site, per-step depolarizing probability.
    pub p_error: f64,
    /// Number of independent trials.
    pub trials: usize,
    /// Base seed; trial `t` uses `seed + t`, wrapping at `u64::MAX`.
    pub seed: u64,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            width: 3,
            height: 3,
            rounds: 5,
            p_error: 0.001,
            trials: 100,
            seed: 0,
        }
    }
}

/// Outcome of one trial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialResult {
    pub seed: u64,
    /// Parity-change reports produced.
    pub reports: usize,
    /// Round of the first report, if any.
    pub first_report_round: Option<usize>,
    /// Data sites carrying an error when the run ended.
    pub residual_weight: usize,
}

/// Aggregate of all trials in an experiment.
#[derive(Debug, Clone)]
pub struct ExperimentResult {
    pub width: usize,
    pub height: usize,
    pub rounds: usize,
    pub p_error: f64,
    pub trials: usize,
    /// Trials with at least one report.
    pub detecting_trials: usize,
    /// Reports summed over all trials.
    pub total_reports: usize,
    /// detecting_trials / trials.
    pub detection_rate: f64,
    /// total_reports / trials.
    pub mean_reports: f64,
}

/// Run a single noisy trial over `lattice`.
pub fn run_trial(
    lattice: &Lattice,
    rounds: usize,
    p_error: f64,
    seed: u64,
) -> Result<TrialResult, ExperimentError> {
    let noise = DepolarizingNoise::for_lattice(lattice, p_error, seed);
    let mut engine = PauliFrameEngine::new(lattice, noise);
    let config = RunConfig {
        total_rounds: rounds,
        retention: HistoryRetention::CurrentRound,
    };
    let outcome = RoundDriver::new(lattice, config).run(&mut engine)?;

    Ok(TrialResult {
        seed,
        reports: outcome.reports.len(),
        first_report_round: outcome.reports.first().map(|r| r.round),
        residual_weight: engine.frame().weight(),
    })
}

fn run_trials(
    lattice: &Lattice,
    config: &ExperimentConfig,
) -> Result<Vec<TrialResult>, ExperimentError> {
    let trial = |t: usize| {
        run_trial(
            lattice,
            config.rounds,
            config.p_error,
            config.seed.wrapping_add(t as u64),
        )
    };

    #[cfg(feature = "parallel")]
    let results = (0..config.trials).into_par_iter().map(trial).collect();
    #[cfg(not(feature = "parallel"))]
    let results = (0..config.trials).map(trial).collect();

    results
}

/// Run a full detection experiment.
pub fn run_experiment(config: &ExperimentConfig) -> Result<ExperimentResult, ExperimentError> {
    let lattice = Lattice::build(config.width, config.height)?;
    debug!(
        "experiment {}x{}, {} rounds, p={}, {} trials",
        config.width, config.height, config.rounds, config.p_error, config.trials
    );

    let trials = run_trials(&lattice, config)?;
    let detecting_trials = trials.iter().filter(|t| t.reports > 0).count();
    let total_reports: usize = trials.iter().map(|t| t.reports).sum();
    let denom = config.trials.max(1) as f64;

    Ok(ExperimentResult {
        width: config.width,
        height: config.height,
        rounds: config.rounds,
        p_error: config.p_error,
        trials: config.trials,
        detecting_trials,
        total_reports,
        detection_rate: detecting_trials as f64 / denom,
        mean_reports: total_reports as f64 / denom,
    })
}

/// Run the same experiment across several error rates.
pub fn detection_sweep(
    config: &ExperimentConfig,
    error_rates: &[f64],
) -> Result<Vec<ExperimentResult>, ExperimentError> {
    error_rates
        .iter()
        .map(|&p| {
            run_experiment(&ExperimentConfig {
                p_error: p,
                ..config.clone()
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LatticeError;

    #[test]
    fn test_zero_error_rate_no_detections() {
        let result = run_experiment(&ExperimentConfig {
            p_error: 0.0,
            trials: 20,
            ..ExperimentConfig::default()
        })
        .unwrap();
        assert_eq!(result.detecting_trials, 0);
        assert_eq!(result.total_reports, 0);
        assert_eq!(result.detection_rate, 0.0);
    }

    #[test]
    fn test_high_error_rate_detects() {
        let result = run_experiment(&ExperimentConfig {
            p_error: 0.2,
            trials: 20,
            ..ExperimentConfig::default()
        })
        .unwrap();
        assert!(
            result.detection_rate > 0.9,
            "High error rate should almost always be detected, got {}",
            result.detection_rate
        );
    }

    #[test]
    fn test_experiment_reproducible() {
        let config = ExperimentConfig {
            p_error: 0.02,
            trials: 16,
            seed: 7,
            ..ExperimentConfig::default()
        };
        let a = run_experiment(&config).unwrap();
        let b = run_experiment(&config).unwrap();
        assert_eq!(a.total_reports, b.total_reports);
        assert_eq!(a.detecting_trials, b.detecting_trials);
    }

    #[test]
    fn test_trial_seeded() {
        let lat = Lattice::build(4, 4).unwrap();
        let a = run_trial(&lat, 6, 0.05, 11).unwrap();
        let b = run_trial(&lat, 6, 0.05, 11).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.seed, 11);
    }

    #[test]
    fn test_trial_seeds_wrap_past_max() {
        let config = ExperimentConfig {
            p_error: 0.0,
            trials: 4,
            seed: u64::MAX - 1,
            ..ExperimentConfig::default()
        };
        let lat = Lattice::build(config.width, config.height).unwrap();
        let seeds: Vec<u64> = run_trials(&lat, &config)
            .unwrap()
            .iter()
            .map(|t| t.seed)
            .collect();
        assert_eq!(seeds, vec![u64::MAX - 1, u64::MAX, 0, 1]);
        assert_eq!(run_experiment(&config).unwrap().trials, 4);
    }

    #[test]
    fn test_invalid_lattice_surfaces() {
        let err = run_experiment(&ExperimentConfig {
            width: 1,
            ..ExperimentConfig::default()
        })
        .unwrap_err();
        assert!(matches!(
            err,
            ExperimentError::Lattice(LatticeError::InvalidDimension { width: 1, height: 3 })
        ));
    }

    #[test]
    fn test_sweep_detection_increases() {
        let config = ExperimentConfig {
            trials: 50,
            ..ExperimentConfig::default()
        };
        let results = detection_sweep(&config, &[0.0, 0.2]).unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].detection_rate < results[1].detection_rate);
    }
}
