//! Generic region growing ("segment features").
//!
//! Tuples are partitioned into features by breadth-first growth from randomly
//! drawn seeds. A caller-supplied [`Adjacency`] says which tuples touch, and a
//! [`GroupingPolicy`] decides whether a touching tuple joins the feature that
//! is currently growing.
//!
//! # Labels
//!
//! Feature ids are `1..=feature_count`, assigned in discovery order. Label `0`
//! is reserved for tuples the policy marks ineligible (masked out). Those are
//! never visited. Every eligible tuple ends up in exactly one feature, because
//! an eligible tuple that no growth reaches eventually becomes a seed itself.
//!
//! # Determinism
//!
//! Seeds come from an explicitly seeded, swappable RNG (`SmallRng` by default),
//! never a process-global one, so a run with the same seed on the same input is
//! reproducible bit-for-bit. Optional id randomization shuffles the id remap
//! table with the same RNG after growth has finished.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::debug;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::algs::adjacency::Adjacency;
use crate::pipeline_error::PipelineError;

/// Membership test used while growing a feature.
pub trait GroupingPolicy {
    /// Whether `index` may be part of any feature. Ineligible tuples keep id 0.
    fn is_eligible(&self, _index: usize) -> bool {
        true
    }

    /// Whether `neighbor` joins feature `feature_id`, which `reference`
    /// (already a member) is growing.
    fn determine_grouping(&mut self, reference: usize, neighbor: usize, feature_id: i32) -> bool;
}

#[derive(Clone, Debug)]
pub struct SegmentationConfig {
    pub rng_seed: u64,
    pub randomize_feature_ids: bool,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            rng_seed: 5489,
            randomize_feature_ids: true,
        }
    }
}

/// Output of one segmentation run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Segmentation {
    /// Per-tuple feature id, 0 for excluded tuples.
    pub feature_ids: Vec<i32>,
    pub feature_count: usize,
}

impl Segmentation {
    /// `Active` flags for a feature matrix of `feature_count + 1` tuples:
    /// false for the reserved label 0, true for every feature.
    pub fn active(&self) -> Vec<bool> {
        let mut active = vec![true; self.feature_count + 1];
        active[0] = false;
        active
    }

    /// Number of tuples in each feature, indexed by id (index 0 counts excluded tuples).
    pub fn feature_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0usize; self.feature_count + 1];
        for &id in &self.feature_ids {
            sizes[id as usize] += 1;
        }
        sizes
    }
}

/// Region-growing engine, generic over its random source.
#[derive(Debug)]
pub struct SegmentationEngine<R: Rng = SmallRng> {
    rng: R,
    randomize_feature_ids: bool,
    interrupt: Option<Arc<AtomicBool>>,
}

impl SegmentationEngine<SmallRng> {
    /// `SmallRng` seeded with `seed`; ids are not randomized.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(SmallRng::seed_from_u64(seed))
    }

    pub fn from_config(cfg: &SegmentationConfig) -> Self {
        Self::seeded(cfg.rng_seed).randomize_feature_ids(cfg.randomize_feature_ids)
    }
}

impl<R: Rng> SegmentationEngine<R> {
    pub fn with_rng(rng: R) -> Self {
        Self {
            rng,
            randomize_feature_ids: false,
            interrupt: None,
        }
    }

    pub fn randomize_feature_ids(mut self, on: bool) -> Self {
        self.randomize_feature_ids = on;
        self
    }

    /// Poll `flag` between seeds; once raised, [`segment`](Self::segment)
    /// returns `Canceled`.
    pub fn with_interrupt(mut self, flag: Arc<AtomicBool>) -> Self {
        self.interrupt = Some(flag);
        self
    }

    fn canceled(&self) -> bool {
        self.interrupt
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    /// Draw uniformly from the unvisited pool without replacement.
    ///
    /// Entries visited by growth since they entered the pool are discarded as
    /// they are drawn.
    fn next_seed(&mut self, pool: &mut Vec<usize>, visited: &[bool]) -> Option<usize> {
        while !pool.is_empty() {
            let pick = self.rng.gen_range(0..pool.len());
            let candidate = pool.swap_remove(pick);
            if !visited[candidate] {
                return Some(candidate);
            }
        }
        None
    }

    /// Partition the tuples of `adjacency` into features.
    ///
    /// # Errors
    /// - `Canceled` if the interrupt flag is raised.
    /// - `ExecutionFailure` if the feature count overflows `i32`.
    pub fn segment<A, G>(
        &mut self,
        adjacency: &A,
        policy: &mut G,
    ) -> Result<Segmentation, PipelineError>
    where
        A: Adjacency + ?Sized,
        G: GroupingPolicy + ?Sized,
    {
        let n = adjacency.len();
        let mut visited = vec![false; n];
        let mut feature_ids = vec![0i32; n];
        let mut pool: Vec<usize> = (0..n).filter(|&i| policy.is_eligible(i)).collect();
        let mut queue = VecDeque::new();
        let mut neighbors = Vec::with_capacity(6);
        let mut feature_id: i32 = 0;

        while let Some(seed) = self.next_seed(&mut pool, &visited) {
            if self.canceled() {
                return Err(PipelineError::Canceled);
            }
            feature_id = feature_id.checked_add(1).ok_or_else(|| {
                PipelineError::ExecutionFailure("feature count exceeds i32::MAX".to_string())
            })?;
            visited[seed] = true;
            feature_ids[seed] = feature_id;
            queue.push_back(seed);

            while let Some(current) = queue.pop_front() {
                neighbors.clear();
                adjacency.neighbors(current, &mut neighbors);
                for &neighbor in &neighbors {
                    if neighbor >= n || visited[neighbor] || !policy.is_eligible(neighbor) {
                        continue;
                    }
                    if policy.determine_grouping(current, neighbor, feature_id) {
                        visited[neighbor] = true;
                        feature_ids[neighbor] = feature_id;
                        queue.push_back(neighbor);
                    }
                }
            }
        }

        let feature_count = feature_id as usize;
        debug!("segmentation found {feature_count} features over {n} tuples");
        let mut out = Segmentation {
            feature_ids,
            feature_count,
        };
        if self.randomize_feature_ids {
            self.randomize(&mut out);
        }
        Ok(out)
    }

    /// Relabel features by a random permutation of `1..=feature_count`,
    /// leaving label 0 untouched.
    pub fn randomize(&mut self, segmentation: &mut Segmentation) {
        let count = segmentation.feature_count;
        let mut remap: Vec<i32> = (0..=count as i32).collect();
        remap[1..].shuffle(&mut self.rng);
        for id in &mut segmentation.feature_ids {
            *id = remap[*id as usize];
        }
    }
}
