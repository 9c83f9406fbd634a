//! Measurement history and round-over-round parity-change detection.
//!
//! Every syndrome result is appended in report order. When a round completes
//! (the number of recorded bits becomes a multiple of the syndrome count) the
//! completed window is compared slot by slot against the previous round's
//! window. A mismatch is a **parity change**: some error happened between the
//! two rounds. The baseline is always the immediately preceding round, so a
//! pattern that appears and then stays put is reported once.
//!
//! This is a change detector, not a decoder: it says *that* the pattern
//! moved, never *where* the physical error is.

use log::info;

use crate::lattice::{Lattice, SyndromeSiteId};

/// How much raw history to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryRetention {
    /// Keep every recorded bit for the lifetime of the run.
    #[default]
    Full,
    /// Keep only the round in progress plus the baseline window.
    CurrentRound,
}

/// Report that a completed round differs from the one before it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParityChangeReport {
    /// Zero-based round whose results are `after`.
    pub round: usize,
    /// Results of round `round - 1`.
    pub before: Vec<bool>,
    /// Results of round `round`.
    pub after: Vec<bool>,
}

impl ParityChangeReport {
    /// Syndrome indices whose outcome flipped.
    pub fn flipped_indices(&self) -> Vec<usize> {
        self.before
            .iter()
            .zip(&self.after)
            .enumerate()
            .filter(|(_, (b, a))| b != a)
            .map(|(i, _)| i)
            .collect()
    }

    /// Syndrome site ids whose outcome flipped.
    pub fn flipped_sites(&self, lattice: &Lattice) -> Vec<SyndromeSiteId> {
        self.flipped_indices()
            .into_iter()
            .filter_map(|i| lattice.syndrome(i).map(|s| s.id))
            .collect()
    }

    /// Number of flipped outcomes.
    pub fn weight(&self) -> usize {
        self.before
            .iter()
            .zip(&self.after)
            .filter(|(b, a)| b != a)
            .count()
    }
}

/// Append-only syndrome history with a last-round baseline.
#[derive(Debug, Clone)]
pub struct SyndromeHistory {
    syndrome_count: usize,
    retention: HistoryRetention,
    bits: Vec<bool>,
    /// Bits dropped under `CurrentRound` retention.
    dropped: usize,
    baseline: Option<Vec<bool>>,
}

impl SyndromeHistory {
    /// Empty history for a lattice with `syndrome_count` syndrome sites.
    ///
    /// # Panics
    ///
    /// Panics if `syndrome_count` is zero. Every built `Lattice` has at least
    /// one syndrome site.
    pub fn new(syndrome_count: usize) -> Self {
        Self::with_retention(syndrome_count, HistoryRetention::Full)
    }

    /// Empty history with the given retention policy.
    ///
    /// # Panics
    ///
    /// Panics if `syndrome_count` is zero.
    pub fn with_retention(syndrome_count: usize, retention: HistoryRetention) -> Self {
        assert!(syndrome_count > 0, "syndrome count must be positive");
        Self {
            syndrome_count,
            retention,
            bits: Vec::new(),
            dropped: 0,
            baseline: None,
        }
    }

    /// Record one measurement result.
    ///
    /// Returns a report when this bit completes a round that differs from the
    /// previous one.
    pub fn record(&mut self, bit: bool) -> Option<ParityChangeReport> {
        self.bits.push(bit);
        if self.len() % self.syndrome_count != 0 {
            return None;
        }

        let round = self.rounds_completed() - 1;
        let window = self.bits[self.bits.len() - self.syndrome_count..].to_vec();
        if self.retention == HistoryRetention::CurrentRound {
            self.dropped += self.bits.len();
            self.bits.clear();
        }

        let report = match self.baseline.take() {
            Some(before) if before != window => Some(ParityChangeReport {
                round,
                before,
                after: window.clone(),
            }),
            _ => None,
        };
        if let Some(r) = &report {
            info!(
                "parity change detected in round {}: {} syndrome(s) flipped",
                round,
                r.weight()
            );
        }
        self.baseline = Some(window);
        report
    }

    /// Number of syndrome sites per round.
    pub fn syndrome_count(&self) -> usize {
        self.syndrome_count
    }

    /// Total number of bits recorded, including any dropped by retention.
    pub fn len(&self) -> usize {
        self.dropped + self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of fully recorded rounds.
    pub fn rounds_completed(&self) -> usize {
        self.len() / self.syndrome_count
    }

    /// Results of the last completed round, if any.
    pub fn baseline(&self) -> Option<&[bool]> {
        self.baseline.as_deref()
    }

    /// Retained bits in report order. Under `CurrentRound` retention this is
    /// only the round in progress.
    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    /// Bits recorded so far in the round in progress.
    pub fn current_round(&self) -> &[bool] {
        let partial = self.len() % self.syndrome_count;
        &self.bits[self.bits.len() - partial..]
    }

    /// Retention policy in use.
    pub fn retention(&self) -> HistoryRetention {
        self.retention
    }
}
