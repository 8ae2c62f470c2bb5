//! Shapley values for the answer-derivability game.
//!
//! Players are the tuples appearing in at least one minimal support of one
//! answer, never the whole database. A coalition wins when it contains some
//! minimal support. Exact computation enumerates all coalitions by bitmask
//! and is exponential in the player count, so it is gated by a configured
//! limit; past the limit a seeded Monte Carlo permutation estimator runs when
//! sampling is enabled, and otherwise the answer is skipped with an explicit
//! marker.

use icqa_core::{TupleId, TupleSet};
use rand::prelude::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Bounds and sampling controls for Shapley computation.
#[derive(Debug, Clone)]
pub struct ShapleyParams {
    /// Largest player count enumerated exactly (2^n coalitions).
    pub exact_player_limit: usize,
    /// Permutation count for the sampling estimator; `None` disables
    /// sampling, turning oversized answers into skips.
    pub samples: Option<u32>,
    /// Seed for the sampling estimator.
    pub seed: u64,
}

impl Default for ShapleyParams {
    fn default() -> Self {
        Self {
            exact_player_limit: 14,
            samples: Some(10_000),
            seed: 0,
        }
    }
}

/// How the values were obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapleyMethod {
    Exact,
    Sampled { samples: u32 },
}

/// Per-player Shapley values, aligned with `players`.
#[derive(Debug, Clone)]
pub struct ShapleyValues {
    pub players: Vec<TupleId>,
    pub values: Vec<f64>,
    pub method: ShapleyMethod,
}

impl ShapleyValues {
    /// Value of one player; zero for non-players.
    pub fn get(&self, id: TupleId) -> f64 {
        self.players
            .binary_search(&id)
            .map(|i| self.values[i])
            .unwrap_or(0.0)
    }

    /// Total Shapley mass.
    pub fn total(&self) -> f64 {
        self.values.iter().sum()
    }
}

/// Outcome of one answer's Shapley computation.
#[derive(Debug, Clone)]
pub enum ShapleyOutcome {
    Computed(ShapleyValues),
    /// Player set exceeded the exact limit with sampling disabled.
    Skipped { players: usize, limit: usize },
}

/// Computes Shapley values for the given minimal supports.
pub fn shapley(supports: &[TupleSet], params: &ShapleyParams) -> ShapleyOutcome {
    let mut players: Vec<TupleId> = supports.iter().flat_map(|s| s.iter()).collect();
    players.sort_unstable();
    players.dedup();
    let n = players.len();

    if n == 0 {
        return ShapleyOutcome::Computed(ShapleyValues {
            players,
            values: Vec::new(),
            method: ShapleyMethod::Exact,
        });
    }

    // Supports as player-index sets, shared by both estimators.
    let index_supports: Vec<Vec<usize>> = supports
        .iter()
        .map(|s| {
            s.iter()
                .filter_map(|id| players.binary_search(&id).ok())
                .collect()
        })
        .collect();

    if n <= params.exact_player_limit {
        let values = exact(&index_supports, n);
        return ShapleyOutcome::Computed(ShapleyValues {
            players,
            values,
            method: ShapleyMethod::Exact,
        });
    }

    match params.samples {
        Some(samples) => {
            tracing::warn!(
                players = n,
                limit = params.exact_player_limit,
                samples,
                "player set exceeds exact limit, falling back to sampling"
            );
            let values = sampled(&index_supports, n, samples, params.seed);
            ShapleyOutcome::Computed(ShapleyValues {
                players,
                values,
                method: ShapleyMethod::Sampled { samples },
            })
        }
        None => {
            tracing::warn!(
                players = n,
                limit = params.exact_player_limit,
                "player set exceeds exact limit, sampling disabled, skipping"
            );
            ShapleyOutcome::Skipped {
                players: n,
                limit: params.exact_player_limit,
            }
        }
    }
}

/// A coalition bitmask wins when it contains some minimal support.
#[inline]
fn wins(mask: u64, support_masks: &[u64]) -> bool {
    support_masks.iter().any(|&sm| mask & sm == sm)
}

/// Exact Shapley by full coalition enumeration.
///
/// O(2^n * n) with n capped by the configured exact limit, so bitmask
/// coalitions always fit in a word here.
fn exact(index_supports: &[Vec<usize>], n: usize) -> Vec<f64> {
    let support_masks: Vec<u64> = index_supports
        .iter()
        .map(|s| s.iter().fold(0u64, |m, &i| m | (1 << i)))
        .collect();

    let size = 1usize << n;
    let mut v = vec![false; size];
    for (mask, slot) in v.iter_mut().enumerate() {
        *slot = wins(mask as u64, &support_masks);
    }

    let mut fact = vec![1.0f64; n + 1];
    for i in 1..=n {
        fact[i] = fact[i - 1] * i as f64;
    }
    let denom = fact[n];

    let mut phi = vec![0.0f64; n];
    for (t, phi_t) in phi.iter_mut().enumerate() {
        let bit = 1usize << t;
        let mut acc = 0.0;
        for mask in 0..size {
            if mask & bit != 0 {
                continue;
            }
            if v[mask | bit] && !v[mask] {
                let k = (mask as u64).count_ones() as usize;
                acc += fact[k] * fact[n - k - 1] / denom;
            }
        }
        *phi_t = acc;
    }
    phi
}

/// Monte Carlo permutation estimator.
///
/// The game is monotone 0/1: along a permutation exactly one player flips the
/// coalition from losing to winning, so each sample credits one player and
/// the estimate is the flip frequency. Coalitions are membership vectors, not
/// bitmasks, so the estimator has no player-count ceiling.
fn sampled(index_supports: &[Vec<usize>], n: usize, samples: u32, seed: u64) -> Vec<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut order: Vec<usize> = (0..n).collect();
    let mut counts = vec![0u64; n];
    let mut member = vec![false; n];

    for _ in 0..samples {
        order.shuffle(&mut rng);
        member.fill(false);
        for &p in &order {
            member[p] = true;
            let won = index_supports
                .iter()
                .any(|s| s.iter().all(|&i| member[i]));
            if won {
                counts[p] += 1;
                break;
            }
        }
    }

    counts
        .into_iter()
        .map(|c| c as f64 / samples as f64)
        .collect()
}
