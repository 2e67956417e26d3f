//! Constrained list randomization.
//!
//! Orders a stimulus list so that no more than `max_run` items of the same
//! category follow each other. Orderings are drawn with a seedable RNG so
//! a participant's list can be reproduced from its seed.

mod stimuli;

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::error::RandomizeError;

pub use stimuli::{StimulusItem, load_stimuli};

/// Default maximum number of same-category items in a row.
pub const DEFAULT_MAX_RUN: usize = 2;

/// Restarts allowed after the sampler paints itself into a corner.
const DEFAULT_ATTEMPTS: usize = 64;

/// Something with a category that the run-length constraint applies to.
pub trait Categorized {
    /// Category name.
    fn category(&self) -> &str;
}

/// Contract for run-length constrained shuffles.
pub trait ConstrainedShuffle {
    /// Returns a permutation of `items` in which no category occurs more
    /// than `max_run` times in a row. An empty list yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns [`RandomizeError::ZeroRunLength`] for `max_run == 0` and
    /// [`RandomizeError::Unsatisfiable`] if no valid ordering is found.
    fn shuffle<T: Categorized + Clone>(
        &mut self,
        items: &[T],
        max_run: usize,
    ) -> Result<Vec<T>, RandomizeError>;
}

/// Randomized sequential sampler.
///
/// Draws one item at a time, weighting categories by how many items they
/// have left, and never takes a step after which the remaining items could
/// no longer be placed.
#[derive(Debug)]
pub struct RunLengthShuffler {
    rng: StdRng,
    attempts: usize,
}

impl RunLengthShuffler {
    /// Creates a shuffler seeded from the operating system.
    #[must_use]
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_os_rng())
    }

    /// Creates a deterministic shuffler.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    const fn from_rng(rng: StdRng) -> Self {
        Self {
            rng,
            attempts: DEFAULT_ATTEMPTS,
        }
    }

    /// One pass of the sampler; `None` on a dead end.
    fn attempt(&mut self, groups: &[Vec<usize>], max_run: usize) -> Option<Vec<usize>> {
        let mut pools: Vec<Vec<usize>> = groups.to_vec();
        for pool in &mut pools {
            pool.shuffle(&mut self.rng);
        }
        let mut remaining: Vec<usize> = pools.iter().map(Vec::len).collect();
        let total: usize = remaining.iter().sum();
        let mut order = Vec::with_capacity(total);
        let mut tail: Option<Run> = None;

        while order.len() < total {
            let mut candidates: Vec<(usize, Run)> = Vec::new();
            for c in 0..pools.len() {
                let next = Run::after(tail, c);
                if remaining[c] == 0 || next.len > max_run {
                    continue;
                }
                remaining[c] -= 1;
                if feasible(&remaining, Some(next), max_run) {
                    candidates.push((c, next));
                }
                remaining[c] += 1;
            }

            let weight: usize = candidates.iter().map(|&(c, _)| remaining[c]).sum();
            if weight == 0 {
                return None;
            }
            let mut pick = self.rng.random_range(0..weight);
            let &(category, next) = candidates
                .iter()
                .find(|&&(c, _)| {
                    if pick < remaining[c] {
                        true
                    } else {
                        pick -= remaining[c];
                        false
                    }
                })?;

            remaining[category] -= 1;
            order.push(pools[category].pop()?);
            tail = Some(next);
        }

        Some(order)
    }
}

impl Default for RunLengthShuffler {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstrainedShuffle for RunLengthShuffler {
    fn shuffle<T: Categorized + Clone>(
        &mut self,
        items: &[T],
        max_run: usize,
    ) -> Result<Vec<T>, RandomizeError> {
        if max_run == 0 {
            return Err(RandomizeError::ZeroRunLength);
        }
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let groups = group_by_category(items);
        let counts: Vec<usize> = groups.iter().map(Vec::len).collect();
        let unsatisfiable = RandomizeError::Unsatisfiable {
            items: items.len(),
            max_run,
        };
        if !feasible(&counts, None, max_run) {
            return Err(unsatisfiable);
        }

        for attempt in 0..self.attempts {
            if let Some(order) = self.attempt(&groups, max_run) {
                debug!(
                    items = items.len(),
                    categories = groups.len(),
                    attempt,
                    "constrained shuffle succeeded"
                );
                return Ok(order.into_iter().map(|i| items[i].clone()).collect());
            }
            debug!(attempt, "constrained shuffle hit a dead end; restarting");
        }

        Err(unsatisfiable)
    }
}

/// Trailing run of one category.
#[derive(Debug, Clone, Copy)]
struct Run {
    category: usize,
    len: usize,
}

impl Run {
    fn after(tail: Option<Self>, category: usize) -> Self {
        match tail {
            Some(run) if run.category == category => Self {
                category,
                len: run.len + 1,
            },
            _ => Self { category, len: 1 },
        }
    }
}

/// Groups item indices by category in order of first appearance.
fn group_by_category<T: Categorized>(items: &[T]) -> Vec<Vec<usize>> {
    let mut slots: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<Vec<usize>> = Vec::new();
    for (i, item) in items.iter().enumerate() {
        let slot = *slots.entry(item.category()).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(i);
    }
    groups
}

/// Whether `remaining` can still be placed after `tail`.
///
/// Each category's items must fit into the blocks separated by all other
/// remaining items; the block touching the tail loses the tail's length.
fn feasible(remaining: &[usize], tail: Option<Run>, max_run: usize) -> bool {
    let total: usize = remaining.iter().sum();
    remaining.iter().enumerate().all(|(c, &count)| {
        let others = total - count;
        let capacity = match tail {
            Some(run) if run.category == c => {
                (max_run - run.len.min(max_run)) + max_run * others
            }
            _ => max_run * (others + 1),
        };
        count <= capacity
    })
}
