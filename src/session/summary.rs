use serde::Serialize;

/// Correct answers over answered questions for one run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Score {
    pub correct: u32,
    pub total: u32,
}

impl Score {
    pub fn record(&mut self, was_correct: bool) {
        self.total += 1;
        if was_correct {
            self.correct += 1;
        }
    }

    /// Rounded to the nearest whole percent; 0 before any answer.
    pub fn percentage(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        (self.correct as f64 * 100.0 / self.total as f64).round() as u32
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct QuizSummary {
    pub score: Score,
    pub percentage: u32,
    pub message: &'static str,
    pub pool_len: usize,
}

impl QuizSummary {
    pub fn new(score: Score, pool_len: usize) -> Self {
        let percentage = score.percentage();
        Self {
            score,
            percentage,
            message: score_message(percentage),
            pool_len,
        }
    }
}

pub fn score_message(percentage: u32) -> &'static str {
    match percentage {
        100.. => "Perfect!",
        90..=99 => "Excellent!",
        80..=89 => "Great job!",
        70..=79 => "Good work!",
        60..=69 => "Not bad!",
        _ => "Keep practicing!",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_by_band() {
        assert_eq!(score_message(100), "Perfect!");
        assert_eq!(score_message(95), "Excellent!");
        assert_eq!(score_message(90), "Excellent!");
        assert_eq!(score_message(89), "Great job!");
        assert_eq!(score_message(70), "Good work!");
        assert_eq!(score_message(60), "Not bad!");
        assert_eq!(score_message(59), "Keep practicing!");
        assert_eq!(score_message(0), "Keep practicing!");
    }

    #[test]
    fn percentage_rounds() {
        let score = Score {
            correct: 2,
            total: 3,
        };
        assert_eq!(score.percentage(), 67);
        assert_eq!(Score::default().percentage(), 0);
    }

    #[test]
    fn summary_uses_percentage() {
        let summary = QuizSummary::new(
            Score {
                correct: 9,
                total: 10,
            },
            10,
        );
        assert_eq!(summary.percentage, 90);
        assert_eq!(summary.message, "Excellent!");
    }
}
