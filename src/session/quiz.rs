use std::collections::HashSet;

use chrono::Utc;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::catalog::Character;
use crate::engine::question::{KindPolicy, Question, generate_question};
use crate::engine::selector::{SelectionMode, Selector};
use crate::session::summary::{QuizSummary, Score};
use crate::store::ProgressStore;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for a pool.
    Loading,
    /// The pool had nothing to quiz.
    Empty,
    InProgress,
    Completed,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QuizOptions {
    pub kind: KindPolicy,
    pub mode: SelectionMode,
}

/// One quiz run over a fixed pool.
///
/// All randomness comes from the session's own RNG, so a seeded session
/// replays exactly.
pub struct QuizSession<R: Rng = SmallRng> {
    options: QuizOptions,
    pool: Vec<Character>,
    distractor_pool: Option<Vec<Character>>,
    selector: Selector,
    asked: HashSet<String>,
    score: Score,
    current: Option<Question>,
    selected: Option<String>,
    phase: Phase,
    rng: R,
}

impl QuizSession<SmallRng> {
    pub fn from_entropy(options: QuizOptions) -> Self {
        Self::new(options, SmallRng::from_entropy())
    }

    pub fn seeded(options: QuizOptions, seed: u64) -> Self {
        Self::new(options, SmallRng::seed_from_u64(seed))
    }
}

impl<R: Rng> QuizSession<R> {
    pub fn new(options: QuizOptions, rng: R) -> Self {
        Self {
            options,
            pool: Vec::new(),
            distractor_pool: None,
            selector: Selector::Adaptive,
            asked: HashSet::new(),
            score: Score::default(),
            current: None,
            selected: None,
            phase: Phase::Loading,
            rng,
        }
    }

    /// Wider pool used for ability distractors when the quiz pool is thin.
    pub fn with_distractor_pool(mut self, pool: Vec<Character>) -> Self {
        self.distractor_pool = Some(pool);
        self
    }

    /// Begins a run over `pool`. Duplicate names keep their first entry.
    pub fn start(&mut self, pool: Vec<Character>, progress: &ProgressStore) {
        let mut seen = HashSet::new();
        self.pool = pool
            .into_iter()
            .filter(|c| seen.insert(c.name.clone()))
            .collect();
        self.asked.clear();
        self.score = Score::default();
        self.current = None;
        self.selected = None;

        if self.pool.is_empty() {
            log::info!("nothing to quiz");
            self.phase = Phase::Empty;
            return;
        }

        self.selector = Selector::new(self.options.mode, self.pool.len(), &mut self.rng);
        self.phase = Phase::InProgress;
        log::info!(
            "quiz started: {} characters, {:?} selection",
            self.pool.len(),
            self.options.mode
        );
        self.serve_next(progress);
    }

    /// Runs the same pool again from the beginning.
    pub fn restart(&mut self, progress: &ProgressStore) {
        let pool = std::mem::take(&mut self.pool);
        self.phase = Phase::Loading;
        self.start(pool, progress);
    }

    fn serve_next(&mut self, progress: &ProgressStore) {
        self.selected = None;
        let next = self
            .selector
            .next(&self.pool, &self.asked, progress, Utc::now(), &mut self.rng);
        match next {
            Some(index) => {
                self.current = Some(generate_question(
                    &self.pool[index],
                    &self.pool,
                    self.distractor_pool.as_deref(),
                    self.options.kind,
                    &mut self.rng,
                ));
            }
            None => {
                self.current = None;
                self.phase = Phase::Completed;
                log::info!(
                    "quiz complete: {}/{} correct",
                    self.score.correct,
                    self.score.total
                );
            }
        }
    }

    /// Answers the current question. Returns whether it was right, or `None`
    /// when the answer was ignored: result already showing, no question, or
    /// not one of the options.
    pub fn submit_answer(&mut self, answer: &str, progress: &mut ProgressStore) -> Option<bool> {
        if self.phase != Phase::InProgress || self.selected.is_some() {
            return None;
        }
        let question = self.current.as_ref()?;
        if !question.options.iter().any(|o| o == answer) {
            return None;
        }
        let was_correct = question.is_correct(answer);
        let name = question.character.name.clone();

        self.asked.insert(name.clone());
        self.score.record(was_correct);
        progress.record_answer(&name, was_correct);
        self.selected = Some(answer.to_string());
        Some(was_correct)
    }

    pub fn submit_index(&mut self, index: usize, progress: &mut ProgressStore) -> Option<bool> {
        let answer = self.current.as_ref()?.options.get(index)?.clone();
        self.submit_answer(&answer, progress)
    }

    /// Moves past a revealed result. Returns false when there was nothing to
    /// move past.
    pub fn advance(&mut self, progress: &ProgressStore) -> bool {
        if self.phase != Phase::InProgress || self.selected.is_none() {
            return false;
        }
        self.serve_next(progress);
        true
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn options(&self) -> QuizOptions {
        self.options
    }

    pub fn score(&self) -> Score {
        self.score
    }

    pub fn answered_count(&self) -> usize {
        self.asked.len()
    }

    pub fn pool_len(&self) -> usize {
        self.pool.len()
    }

    pub fn pool(&self) -> &[Character] {
        &self.pool
    }

    pub fn current(&self) -> Option<&Question> {
        self.current.as_ref()
    }

    pub fn selected_answer(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn is_result_shown(&self) -> bool {
        self.selected.is_some()
    }

    pub fn last_answer_correct(&self) -> Option<bool> {
        let question = self.current.as_ref()?;
        self.selected.as_deref().map(|s| question.is_correct(s))
    }

    pub fn summary(&self) -> QuizSummary {
        QuizSummary::new(self.score, self.pool.len())
    }
}
