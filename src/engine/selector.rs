use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::catalog::Character;
use crate::store::{ProgressRecord, ProgressStore};

/// Priority of a character that has never been answered.
pub const UNSEEN_PRIORITY: f64 = 1000.0;

const TOP_CANDIDATES: usize = 3;
const MAX_STALENESS: f64 = 20.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SelectionMode {
    /// Every character once, in a random order.
    #[default]
    Exhaustive,
    /// Weak and stale characters first, forever.
    Adaptive,
}

impl SelectionMode {
    pub fn label(self) -> &'static str {
        match self {
            SelectionMode::Exhaustive => "Each once",
            SelectionMode::Adaptive => "Adaptive",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            SelectionMode::Exhaustive => SelectionMode::Adaptive,
            SelectionMode::Adaptive => SelectionMode::Exhaustive,
        }
    }
}

/// How urgently a character should be asked again. Higher comes first.
pub fn priority(record: Option<&ProgressRecord>, now: DateTime<Utc>) -> f64 {
    let Some(record) = record else {
        return UNSEEN_PRIORITY;
    };
    if record.attempts() == 0 {
        return UNSEEN_PRIORITY;
    }
    let days = (now - record.last_seen).num_seconds().max(0) as f64 / 86_400.0;
    10.0 * record.incorrect as f64 - 5.0 * record.correct as f64
        + (2.0 * days).min(MAX_STALENESS)
        + 15.0 * (1.0 - record.accuracy())
}

/// Pool indices ordered by descending priority. Equal priorities keep pool
/// order.
pub fn rank(pool: &[Character], progress: &ProgressStore, now: DateTime<Utc>) -> Vec<usize> {
    let mut scored: Vec<(f64, usize)> = pool
        .iter()
        .enumerate()
        .map(|(i, c)| (priority(progress.get(&c.name), now), i))
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    scored.into_iter().map(|(_, i)| i).collect()
}

/// Uniform pick among the highest-priority characters.
pub fn pick_adaptive<R: Rng + ?Sized>(
    pool: &[Character],
    progress: &ProgressStore,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Option<usize> {
    let ranked = rank(pool, progress, now);
    let top = &ranked[..ranked.len().min(TOP_CANDIDATES)];
    top.choose(rng).copied()
}

/// Decides which pool character is asked next.
#[derive(Clone, Debug)]
pub enum Selector {
    Exhaustive { order: Vec<usize> },
    Adaptive,
}

impl Selector {
    /// Exhaustive mode fixes its permutation here, once per run.
    pub fn new<R: Rng + ?Sized>(mode: SelectionMode, pool_len: usize, rng: &mut R) -> Self {
        match mode {
            SelectionMode::Exhaustive => {
                let mut order: Vec<usize> = (0..pool_len).collect();
                order.shuffle(rng);
                Selector::Exhaustive { order }
            }
            SelectionMode::Adaptive => Selector::Adaptive,
        }
    }

    pub fn mode(&self) -> SelectionMode {
        match self {
            Selector::Exhaustive { .. } => SelectionMode::Exhaustive,
            Selector::Adaptive => SelectionMode::Adaptive,
        }
    }

    /// `None` means the run is over.
    pub fn next<R: Rng + ?Sized>(
        &self,
        pool: &[Character],
        asked: &HashSet<String>,
        progress: &ProgressStore,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Option<usize> {
        match self {
            Selector::Exhaustive { order } => order
                .iter()
                .copied()
                .find(|&i| pool.get(i).is_some_and(|c| !asked.contains(&c.name))),
            Selector::Adaptive => pick_adaptive(pool, progress, now, rng),
        }
    }
}
