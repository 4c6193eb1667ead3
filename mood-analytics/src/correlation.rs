//! Correlation Calculator
//!
//! Pairwise Pearson correlation over aligned per-date return series. Each
//! market's series is indexed by date once; every pair is then restricted to
//! the dates both markets actually traded (inner join, not union), so
//! markets with differing holiday calendars stay comparable over a
//! possibly-shorter aligned window.

use chrono::NaiveDate;
use mood_core::CorrelationEdge;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// A pair needs at least this many aligned points to be meaningful;
/// below it the pair is omitted, never stored as zero.
pub const MIN_ALIGNED_POINTS: usize = 5;

/// Pure pairwise correlation computation
pub struct CorrelationCalculator;

impl CorrelationCalculator {
    /// Pearson correlation coefficient of two equal-length samples
    ///
    /// `None` below two points or when either sample has zero variance
    /// (the coefficient does not exist for a constant series). The result
    /// is clamped to [-1, 1] against floating-point drift.
    pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
        if xs.len() != ys.len() || xs.len() < 2 {
            return None;
        }

        let n = xs.len() as f64;
        let mean_x = xs.iter().sum::<f64>() / n;
        let mean_y = ys.iter().sum::<f64>() / n;

        let mut cov = 0.0;
        let mut var_x = 0.0;
        let mut var_y = 0.0;
        for (x, y) in xs.iter().zip(ys) {
            let dx = x - mean_x;
            let dy = y - mean_y;
            cov += dx * dy;
            var_x += dx * dx;
            var_y += dy * dy;
        }

        if var_x == 0.0 || var_y == 0.0 {
            return None;
        }

        Some((cov / (var_x * var_y).sqrt()).clamp(-1.0, 1.0))
    }

    /// Correlation edges across all market pairs for one target date
    ///
    /// `returns_by_market` holds each market's dated daily-return series.
    /// Pairs with fewer than [`MIN_ALIGNED_POINTS`] aligned dates, or
    /// without a defined coefficient, are omitted. Emitted edges are
    /// canonical (`source_id < target_id`) and self pairs never occur.
    pub fn pairwise(
        date: NaiveDate,
        returns_by_market: &BTreeMap<String, Vec<(NaiveDate, f64)>>,
    ) -> Vec<CorrelationEdge> {
        // Index every series by date once, instead of re-aligning per pair.
        let indexed: Vec<(&String, HashMap<NaiveDate, f64>)> = returns_by_market
            .iter()
            .map(|(id, series)| (id, series.iter().copied().collect()))
            .collect();

        let mut edges = Vec::new();

        for i in 0..indexed.len() {
            for j in (i + 1)..indexed.len() {
                let (id_a, by_date_a) = &indexed[i];
                let (id_b, by_date_b) = &indexed[j];

                // Inner join on date; iterate the smaller index.
                let (probe, build) = if by_date_a.len() <= by_date_b.len() {
                    (by_date_a, by_date_b)
                } else {
                    (by_date_b, by_date_a)
                };

                let mut aligned: Vec<(NaiveDate, f64, f64)> = probe
                    .iter()
                    .filter_map(|(d, v)| build.get(d).map(|w| (*d, *v, *w)))
                    .collect();
                aligned.sort_by_key(|(d, _, _)| *d);

                if aligned.len() < MIN_ALIGNED_POINTS {
                    debug!(
                        "Omitting pair ({}, {}): only {} aligned points",
                        id_a,
                        id_b,
                        aligned.len()
                    );
                    continue;
                }

                let xs: Vec<f64> = aligned.iter().map(|(_, x, _)| *x).collect();
                let ys: Vec<f64> = aligned.iter().map(|(_, _, y)| *y).collect();

                // The swap above loses pair orientation, which is fine:
                // Pearson is symmetric and the edge canonicalizes the ids.
                if let Some(value) = Self::pearson(&xs, &ys) {
                    if let Some(edge) = CorrelationEdge::new(id_a, id_b, date, value) {
                        edges.push(edge);
                    }
                }
            }
        }

        edges
    }
}
